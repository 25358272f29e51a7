use qlens_db::dora::models::{DeploymentEvent, DeploymentStatus};

use crate::round2;

/// Compute a percentile from a sorted-ascending slice. Returns None for empty input.
pub fn percentile(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let k = (pct / 100.0) * (sorted.len() as f64 - 1.0);
    let floor = k.floor() as usize;
    let ceil = k.ceil() as usize;
    if floor == ceil {
        Some(sorted[floor])
    } else {
        let d = k - floor as f64;
        Some(sorted[floor] * (1.0 - d) + sorted[ceil] * d)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Lead times of successful deployments, sorted ascending.
pub fn successful_lead_times(deployments: &[DeploymentEvent]) -> Vec<f64> {
    let mut lead_times: Vec<f64> = deployments
        .iter()
        .filter(|d| d.status == DeploymentStatus::Success)
        .map(|d| d.lead_time_minutes as f64)
        .collect();
    lead_times.sort_by(f64::total_cmp);
    lead_times
}

/// Failures as a percentage of all deployments, rounded to 2 decimals.
pub fn change_failure_rate(failures: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(round2(failures as f64 / total as f64 * 100.0))
}

/// Average minutes from each failure to the next deployment that follows it
/// chronologically, whatever that deployment's status or environment.
/// A failure with nothing after it contributes no sample.
pub fn mean_time_to_restore(deployments: &[DeploymentEvent]) -> Option<f64> {
    let mut ordered: Vec<&DeploymentEvent> = deployments.iter().collect();
    ordered.sort_by_key(|d| d.deployment_timestamp);

    let gaps: Vec<f64> = ordered
        .windows(2)
        .filter(|pair| pair[0].status == DeploymentStatus::Failure)
        .map(|pair| {
            (pair[1].deployment_timestamp - pair[0].deployment_timestamp).num_milliseconds() as f64
                / 60_000.0
        })
        .collect();

    mean(&gaps).map(round2)
}
