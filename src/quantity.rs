#[macro_use]
mod macros;

pub mod electric;
pub mod energy;
pub mod percent;
pub mod power;

/// Round the value to the given number of decimal places, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_round_to() {
        assert_abs_diff_eq!(round_to(230.04, 1), 230.0);
        assert_abs_diff_eq!(round_to(230.05, 1), 230.1, epsilon = 1e-9);
        assert_abs_diff_eq!(round_to(49.996, 2), 50.0);
        assert_abs_diff_eq!(round_to(-149.5, 0), -150.0);
    }
}
