use qlens_collector::CycleReport;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub message: &'static str,
    pub report: CycleReport,
}
