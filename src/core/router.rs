//! Request classification.
//!
//! Every request maps to exactly one [`Route`]. Rules are evaluated in a fixed
//! order and the first match wins:
//!
//! 1. any `OPTIONS` request is a CORS preflight
//! 2. `/health`
//! 3. `/festivals.json` and `/festivals`
//! 4. `/{festival_id}/available_beverage_types.json`
//! 5. everything else is forwarded upstream
//!
//! The last rule matches unconditionally, so classification is total.
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;

static BEVERAGE_TYPES_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/([^/]+)/available_beverage_types\.json$").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Preflight,
    Health,
    FestivalRegistry,
    BeverageTypes { festival_id: String },
    Passthrough,
}

impl Route {
    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Route::Preflight => "preflight",
            Route::Health => "health",
            Route::FestivalRegistry => "festival_registry",
            Route::BeverageTypes { .. } => "beverage_types",
            Route::Passthrough => "passthrough",
        }
    }
}

type Matcher = fn(&Method, &str) -> Option<Route>;

/// A named predicate that produces a route when it matches.
#[derive(Clone, Copy)]
pub struct RouteRule {
    pub name: &'static str,
    matcher: Matcher,
}

impl RouteRule {
    pub const fn new(name: &'static str, matcher: Matcher) -> Self {
        Self { name, matcher }
    }

    pub fn matches(&self, method: &Method, path: &str) -> Option<Route> {
        (self.matcher)(method, path)
    }
}

impl std::fmt::Debug for RouteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRule").field("name", &self.name).finish()
    }
}

fn match_preflight(method: &Method, _path: &str) -> Option<Route> {
    (*method == Method::OPTIONS).then_some(Route::Preflight)
}

fn match_health(_method: &Method, path: &str) -> Option<Route> {
    (path == "/health").then_some(Route::Health)
}

fn match_registry(_method: &Method, path: &str) -> Option<Route> {
    matches!(path, "/festivals.json" | "/festivals").then_some(Route::FestivalRegistry)
}

fn match_beverage_types(_method: &Method, path: &str) -> Option<Route> {
    BEVERAGE_TYPES_PATH
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| Route::BeverageTypes {
            festival_id: m.as_str().to_string(),
        })
}

fn match_any(_method: &Method, _path: &str) -> Option<Route> {
    Some(Route::Passthrough)
}

/// Ordered rule list. See the module docs for the precedence.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn standard() -> Self {
        Self {
            rules: vec![
                RouteRule::new("preflight", match_preflight),
                RouteRule::new("health", match_health),
                RouteRule::new("festival_registry", match_registry),
                RouteRule::new("beverage_types", match_beverage_types),
                RouteRule::new("passthrough", match_any),
            ],
        }
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn classify(&self, method: &Method, path: &str) -> Route {
        self.rules
            .iter()
            .find_map(|rule| rule.matches(method, path))
            .unwrap_or(Route::Passthrough)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(method: Method, path: &str) -> Route {
        RouteTable::standard().classify(&method, path)
    }

    #[test]
    fn options_wins_over_every_path() {
        for path in ["/health", "/festivals", "/cbf2025/available_beverage_types.json", "/x"] {
            assert_eq!(classify(Method::OPTIONS, path), Route::Preflight);
        }
    }

    #[test]
    fn fixed_paths() {
        assert_eq!(classify(Method::GET, "/health"), Route::Health);
        assert_eq!(classify(Method::GET, "/festivals"), Route::FestivalRegistry);
        assert_eq!(classify(Method::GET, "/festivals.json"), Route::FestivalRegistry);
    }

    #[test]
    fn fixed_paths_are_exact() {
        assert_eq!(classify(Method::GET, "/health/"), Route::Passthrough);
        assert_eq!(classify(Method::GET, "/festivals/"), Route::Passthrough);
        assert_eq!(classify(Method::GET, "/api/health"), Route::Passthrough);
    }

    #[test]
    fn beverage_types_captures_single_segment() {
        assert_eq!(
            classify(Method::GET, "/cbf2025/available_beverage_types.json"),
            Route::BeverageTypes {
                festival_id: "cbf2025".to_string()
            }
        );
        assert_eq!(
            classify(Method::GET, "/a/b/available_beverage_types.json"),
            Route::Passthrough
        );
        assert_eq!(
            classify(Method::GET, "//available_beverage_types.json"),
            Route::Passthrough
        );
        assert_eq!(
            classify(Method::GET, "/available_beverage_types.json"),
            Route::Passthrough
        );
    }

    #[test]
    fn everything_else_is_forwarded() {
        assert_eq!(classify(Method::GET, "/cbf2025/beer.json"), Route::Passthrough);
        assert_eq!(classify(Method::POST, "/cbf2025/beer.json"), Route::Passthrough);
        assert_eq!(classify(Method::GET, "/"), Route::Passthrough);
    }

    #[test]
    fn catch_all_is_last() {
        let table = RouteTable::standard();
        let last = table.rules().last().unwrap();
        assert_eq!(last.name, "passthrough");
        assert_eq!(last.matches(&Method::DELETE, "/anything"), Some(Route::Passthrough));
    }
}
