use std::{path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use taproom::{
    adapters::{HttpClientAdapter, ProxyHandler, build_router, serve},
    config::{ServerConfig, ServerConfigValidator, load_config},
    core::FestivalRegistry,
    ports::http_client::HttpClient,
    tracing_setup,
    utils::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file and festival registry
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Start the proxy server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve { config }) => serve_command(&config).await,
        None => serve_command(&args.config).await,
    }
}

async fn serve_command(config_path: &str) -> Result<()> {
    let config: ServerConfig = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    ServerConfigValidator::validate(&config)
        .map_err(|e| eyre!("Invalid configuration in {config_path}:\n{e}"))?;

    tracing_setup::init_tracing_from_config(&config.logging)
        .context("Failed to initialize tracing")?;

    let registry = FestivalRegistry::load(config.registry.override_path())
        .context("Failed to load festival registry")?;
    tracing::info!(
        festivals = registry.festivals().len(),
        default_festival = registry.default_festival_id(),
        "Festival registry loaded"
    );

    let http_client: Arc<dyn HttpClient> = Arc::new(
        HttpClientAdapter::new(&config.upstream)
            .context("Failed to create HTTP client adapter")?,
    );

    let handler = Arc::new(ProxyHandler::new(&config, Arc::new(registry), http_client));
    let router = build_router(handler);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;

    let shutdown = Arc::new(GracefulShutdown::new());

    let signal_shutdown = shutdown.clone();
    let signal_task = tokio::spawn(async move {
        if let Err(e) = signal_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    let server_shutdown = shutdown.clone();
    let result = serve(listener, router, async move {
        let reason = server_shutdown.wait_for_shutdown_signal().await;
        tracing::info!("Stopping HTTP server ({:?})", reason);
    })
    .await;

    signal_task.abort();
    tracing::info!("Taproom shutdown complete");
    result
}

/// Validate configuration file and registry, then exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        println!("⚠️  '{config_path}' not found, validating built-in defaults");
    }

    let config = match load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = ServerConfigValidator::validate(&config) {
        eprintln!("❌ Configuration validation failed:");
        eprintln!("{e}");
        println!();
        println!("💡 Common fixes:");
        println!("   • The upstream origin must look like 'https://host' with no path");
        println!("   • Allowed origins must not contain paths; suffixes start with '.'");
        println!("   • Verify listen address format (e.g., '0.0.0.0:8787')");
        std::process::exit(1);
    }
    println!("✅ Configuration validation: OK");

    let registry = match FestivalRegistry::load(config.registry.override_path()) {
        Ok(registry) => {
            println!("✅ Festival registry: OK");
            registry
        }
        Err(e) => {
            eprintln!("❌ Festival registry is invalid:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    println!();
    println!("📋 Configuration Summary:");
    println!("   • Listen Address: {}", config.listen_addr);
    println!("   • Upstream: {}", config.upstream.base_url());
    println!("   • Upstream Timeout: {}s", config.upstream.timeout_secs);
    println!("   • Allowed Origins: {}", config.cors.allowed_origins.len());
    println!(
        "   • Registry: {} ({} festivals, default '{}')",
        config.registry.override_path().unwrap_or("embedded"),
        registry.festivals().len(),
        registry.default_festival_id()
    );
    println!();
    println!("🎉 Configuration is valid and ready to use!");
    Ok(())
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = format!(
        r#"# Taproom festival data proxy configuration
# Any key can be overridden with TAPROOM__SECTION__KEY environment variables.

listen_addr = "0.0.0.0:8787"

[upstream]
origin = "https://data.cambridgebeerfestival.com"
user_agent = "taproom/{version} (festival data proxy)"
timeout_secs = 30
# Largest directory listing read during beverage type discovery
max_listing_bytes = 4194304

[cors]
allowed_origins = [
    "https://cambeerfestival.app",
    "https://cambeerfestival.pages.dev",
    "http://localhost:8080",
    "http://localhost:5000",
]
# Preview deployments, e.g. https://abc123.cambeerfestival.pages.dev
allowed_origin_suffixes = [".cambeerfestival.pages.dev"]

[registry]
# Serve a festival registry file instead of the embedded one
# path = "festivals.json"

[logging]
level = "info"
format = "json" # or "pretty"
"#,
        version = env!("CARGO_PKG_VERSION")
    );

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'taproom serve --config {config_path}' to start the server");
    Ok(())
}
