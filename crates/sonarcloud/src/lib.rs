pub mod client;
pub mod details;
pub mod models;

pub use client::{SonarCloudClient, SonarCloudClientConfig, SonarCloudClientError, METRIC_KEYS};
