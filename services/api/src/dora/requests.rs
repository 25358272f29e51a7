use qlens_metrics::dora::service::DEFAULT_DAYS;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub days: Option<u32>,
}

impl WindowParams {
    pub fn days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_DAYS)
    }
}
