pub mod env;
pub mod projects;
pub mod tracing_init;

pub use env::{AppConfig, StorageBackend};
pub use projects::{ProjectConfig, ProjectRegistry};
pub use tracing_init::init_tracing;
