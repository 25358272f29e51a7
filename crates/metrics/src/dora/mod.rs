pub mod classify;
pub mod compute;
pub mod service;

pub use classify::Tier;
pub use service::{DoraService, DoraSummary};
