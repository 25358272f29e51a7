use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

pub const DEFAULT_HISTORY_HOURS: u32 = 168;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub hours: Option<u32>,
}

impl HistoryParams {
    pub fn hours(&self) -> u32 {
        self.hours.unwrap_or(DEFAULT_HISTORY_HOURS)
    }

    /// Start of the trailing window; clamps to the epoch when `hours`
    /// reaches past the representable range.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Duration::try_hours(i64::from(self.hours()))
            .and_then(|h| now.checked_sub_signed(h))
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn since_defaults_to_one_week() {
        let now = Utc.with_ymd_and_hms(2024, 7, 8, 0, 0, 0).unwrap();
        let params = HistoryParams::default();
        assert_eq!(params.since(now), Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn since_clamps_out_of_range_hours() {
        let params = HistoryParams { hours: Some(u32::MAX) };
        assert_eq!(params.since(Utc::now()), DateTime::UNIX_EPOCH);
    }
}
