pub mod deployments;
pub mod dora;
pub mod gate;
pub mod normalize;
pub mod retention;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_half_up_for_positive_values() {
        assert_eq!(round2(0.066_666), 0.07);
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(25.0), 25.0);
    }
}
