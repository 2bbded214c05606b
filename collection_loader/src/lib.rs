pub mod batch;
pub mod builder;
pub mod capacity;
pub mod error;
pub mod geolocation;
pub mod loader;
pub mod model;
pub mod normalize;

pub use builder::build_establishment;
pub use loader::{BuildSummary, CollectionLoader, ReloadSummary};
pub use model::{ESTABLISHMENTS_COLLECTION, Establishment, OpenStreets, SeatingArea};
