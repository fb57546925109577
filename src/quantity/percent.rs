use std::ops::RangeInclusive;

quantity!(Percent, suffix: "%", precision: 0);

impl Percent {
    pub const VALID_RANGE: RangeInclusive<Self> = Self(0.0)..=Self(100.0);

    /// Keep the value only when it is a meaningful percentage.
    pub fn validated(self) -> Option<Self> {
        Self::VALID_RANGE.contains(&self).then_some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated() {
        assert_eq!(Percent(0.0).validated(), Some(Percent(0.0)));
        assert_eq!(Percent(100.0).validated(), Some(Percent(100.0)));
        assert_eq!(Percent(57.4).validated(), Some(Percent(57.4)));
        assert_eq!(Percent(-0.5).validated(), None);
        assert_eq!(Percent(100.1).validated(), None);
        assert_eq!(Percent(f64::NAN).validated(), None);
    }
}
