quantity!(Watts, suffix: "W", precision: 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Watts(1234.4).to_string(), "1234 W");
        assert_eq!(format!("{:?}", Watts(-150.0)), "-150W");
    }

    #[test]
    fn test_max() {
        assert_eq!(Watts(-300.0).max(Watts::ZERO), Watts::ZERO);
        assert_eq!(Watts(300.0).max(Watts::ZERO), Watts(300.0));
    }

    #[test]
    fn test_negative_zero_equals_zero() {
        assert_eq!(-Watts::ZERO, Watts::ZERO);
    }
}
