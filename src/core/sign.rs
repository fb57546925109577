use crate::quantity::power::Watts;

/// How the meter reports the grid power relative to «positive = importing».
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Polarity {
    /// The meter reports import as positive.
    #[default]
    Direct,

    /// The meter reports export as positive.
    Inverted,
}

impl From<bool> for Polarity {
    fn from(is_inverted: bool) -> Self {
        if is_inverted { Self::Inverted } else { Self::Direct }
    }
}

impl Polarity {
    pub const fn factor(self) -> f64 {
        match self {
            Self::Direct => 1.0,
            Self::Inverted => -1.0,
        }
    }

    /// Convert the raw meter power into «positive = importing from the grid».
    pub fn normalize_grid_power(self, raw: Watts) -> Watts {
        raw * self.factor()
    }
}

/// Convert the vendor battery power (positive = discharging) into «positive = charging».
pub fn normalize_battery_power(raw: Watts) -> Watts {
    -raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_grid_power() {
        for raw in [-300.0, 0.0, 200.0, 1234.5] {
            assert_eq!(Polarity::Direct.normalize_grid_power(Watts(raw)), Watts(raw));
            assert_eq!(Polarity::Inverted.normalize_grid_power(Watts(raw)), Watts(-raw));
        }
    }

    #[test]
    fn test_from_flag() {
        assert_eq!(Polarity::from(false), Polarity::Direct);
        assert_eq!(Polarity::from(true), Polarity::Inverted);
    }

    #[test]
    fn test_normalize_battery_power() {
        assert_eq!(normalize_battery_power(Watts(150.0)), Watts(-150.0));
        assert_eq!(normalize_battery_power(Watts(-150.0)), Watts(150.0));
    }
}
