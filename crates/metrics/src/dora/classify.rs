//! DORA performance tiers: maps each metric onto Elite / High / Medium / Low
//! using the fixed thresholds from the State of DevOps reports.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    Elite,
    High,
    Medium,
    Low,
}

/// Deployments per day: ≥1 daily, ≥0.14 ~weekly, ≥0.03 ~monthly.
pub fn frequency_tier(per_day: f64) -> Tier {
    if per_day >= 1.0 {
        Tier::Elite
    } else if per_day >= 0.14 {
        Tier::High
    } else if per_day >= 0.03 {
        Tier::Medium
    } else {
        Tier::Low
    }
}

/// Lead time or restore time in minutes: within an hour, a day, a week.
pub fn duration_tier(minutes: f64) -> Tier {
    if minutes <= 60.0 {
        Tier::Elite
    } else if minutes <= 1440.0 {
        Tier::High
    } else if minutes <= 10080.0 {
        Tier::Medium
    } else {
        Tier::Low
    }
}

/// Change failure rate in percent.
pub fn failure_rate_tier(rate: f64) -> Tier {
    if rate <= 15.0 {
        Tier::Elite
    } else if rate <= 30.0 {
        Tier::High
    } else if rate <= 45.0 {
        Tier::Medium
    } else {
        Tier::Low
    }
}
