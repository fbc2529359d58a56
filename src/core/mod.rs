pub mod cors;
pub mod discovery;
pub mod error;
pub mod registry;
pub mod router;

pub use cors::CorsPolicy;
pub use discovery::{BeverageTypeListing, beverage_types_from_listing, extract_json_links};
pub use error::ApiError;
pub use registry::{Festival, FestivalRegistry, RegistryError};
pub use router::{Route, RouteTable};
