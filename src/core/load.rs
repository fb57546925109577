use crate::{
    core::{aggregate::PvSample, reading::MeterReading, sign::Polarity},
    prelude::*,
    quantity::{energy::WattHours, power::Watts},
};

/// How the household consumption is derived. Exactly one applies per report.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum LoadEstimation {
    /// Load power from the power balance, no load energy.
    PowerBalance,

    /// Load power from the power balance, load energy from the daily counters.
    #[default]
    EnergyBalance,

    /// The meter measures the consumption itself rather than the net grid power.
    DirectFromMeter,
}

/// What to report as the load energy when the energy balance cannot be computed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum EnergyFallback {
    /// Leave the load energy out.
    #[default]
    Omit,

    /// Use the grid import counter as a proxy.
    ImportProxy,
}

impl EnergyFallback {
    fn apply(self, meter: &MeterReading) -> Option<WattHours> {
        match self {
            Self::Omit => None,
            Self::ImportProxy => meter.imported_today,
        }
    }
}

/// Derived consumption together with the normalized net grid power.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Load {
    pub power: Watts,
    pub energy: Option<WattHours>,

    /// Positive when importing from the grid.
    pub grid_power: Watts,
}

impl LoadEstimation {
    pub fn estimate(
        self,
        pv: &PvSample,
        meter: &MeterReading,
        polarity: Polarity,
        fallback: EnergyFallback,
    ) -> Load {
        let load = match self {
            Self::PowerBalance | Self::EnergyBalance => {
                let grid_power = polarity.normalize_grid_power(meter.power);
                let power =
                    pv.upstream_load.unwrap_or_else(|| power_balance(pv.power, grid_power));
                let energy = match self {
                    Self::EnergyBalance => pv
                        .energy_today
                        .and_then(|pv_energy| {
                            energy_balance(pv_energy, meter.imported_today, meter.exported_today)
                        })
                        .or_else(|| fallback.apply(meter)),
                    _ => None,
                };
                Load { power, energy, grid_power }
            }
            Self::DirectFromMeter => Load {
                power: meter.power.max(Watts::ZERO),
                energy: fallback.apply(meter),
                grid_power: -meter.power,
            },
        };
        debug!(strategy = ?self, ?load.power, ?load.energy, ?load.grid_power, "estimated the load");
        load
    }
}

/// Instantaneous consumption: whatever is generated plus whatever is imported.
pub fn power_balance(pv_power: Watts, grid_power: Watts) -> Watts {
    (pv_power + grid_power).max(Watts::ZERO)
}

/// Daily consumption, only when both grid counters are known.
pub fn energy_balance(
    pv_energy: WattHours,
    imported: Option<WattHours>,
    exported: Option<WattHours>,
) -> Option<WattHours> {
    Some((pv_energy + imported? - exported?).max(WattHours::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pv(power: f64, energy_today: Option<f64>) -> PvSample {
        PvSample {
            power: Watts(power),
            energy_today: energy_today.map(WattHours),
            voltage: None,
            frequency: None,
            upstream_load: None,
        }
    }

    #[test]
    fn test_power_balance_importing() {
        assert_eq!(power_balance(Watts(800.0), Watts(200.0)), Watts(1000.0));
    }

    #[test]
    fn test_power_balance_exporting() {
        assert_eq!(power_balance(Watts(100.0), Watts(-300.0)), Watts::ZERO);
    }

    #[test]
    fn test_power_balance_is_never_negative() {
        for pv_power in [-1000.0, -1.0, 0.0, 1.0, 5000.0] {
            for grid_power in [-6000.0, -1.0, 0.0, 1.0, 6000.0] {
                assert!(power_balance(Watts(pv_power), Watts(grid_power)) >= Watts::ZERO);
            }
        }
    }

    #[test]
    fn test_energy_balance() {
        let pv_energy = WattHours(5000.0);
        assert_eq!(
            energy_balance(pv_energy, Some(WattHours(1200.0)), Some(WattHours(3000.0))),
            Some(WattHours(3200.0)),
        );
        assert_eq!(
            energy_balance(WattHours(0.0), Some(WattHours(100.0)), Some(WattHours(3000.0))),
            Some(WattHours::ZERO),
        );
        assert_eq!(energy_balance(pv_energy, Some(WattHours(1200.0)), None), None);
        assert_eq!(energy_balance(pv_energy, None, Some(WattHours(3000.0))), None);
    }

    #[test]
    fn test_inverted_meter() {
        let meter = MeterReading::builder().power(Watts(-200.0)).build();
        let load = LoadEstimation::PowerBalance.estimate(
            &pv(800.0, None),
            &meter,
            Polarity::Inverted,
            EnergyFallback::Omit,
        );
        assert_eq!(load.grid_power, Watts(200.0));
        assert_eq!(load.power, Watts(1000.0));
        assert_eq!(load.energy, None);
    }

    #[test]
    fn test_energy_balance_strategy() {
        let meter = MeterReading::builder()
            .power(Watts(-300.0))
            .imported_today(WattHours(1000.0))
            .exported_today(WattHours(4000.0))
            .build();
        let load = LoadEstimation::EnergyBalance.estimate(
            &pv(100.0, Some(8000.0)),
            &meter,
            Polarity::Direct,
            EnergyFallback::Omit,
        );
        assert_eq!(load.power, Watts::ZERO);
        assert_eq!(load.energy, Some(WattHours(5000.0)));
        assert_eq!(load.grid_power, Watts(-300.0));
    }

    #[test]
    fn test_partial_counters_are_omitted() {
        let meter =
            MeterReading::builder().power(Watts(100.0)).imported_today(WattHours(1000.0)).build();
        let load = LoadEstimation::EnergyBalance.estimate(
            &pv(100.0, Some(8000.0)),
            &meter,
            Polarity::Direct,
            EnergyFallback::Omit,
        );
        assert_eq!(load.energy, None);
    }

    #[test]
    fn test_import_proxy_fallback() {
        let meter =
            MeterReading::builder().power(Watts(100.0)).imported_today(WattHours(1000.0)).build();
        let load = LoadEstimation::EnergyBalance.estimate(
            &pv(100.0, Some(8000.0)),
            &meter,
            Polarity::Direct,
            EnergyFallback::ImportProxy,
        );
        assert_eq!(load.energy, Some(WattHours(1000.0)));
    }

    #[test]
    fn test_upstream_load_is_passed_through() {
        let meter = MeterReading::builder().power(Watts(50.0)).build();
        let mut sample = pv(800.0, None);
        sample.upstream_load = Some(Watts(845.0));
        let load = LoadEstimation::PowerBalance.estimate(
            &sample,
            &meter,
            Polarity::Direct,
            EnergyFallback::Omit,
        );
        assert_eq!(load.power, Watts(845.0));
        assert_eq!(load.grid_power, Watts(50.0));
    }

    #[test]
    fn test_direct_from_meter() {
        let meter =
            MeterReading::builder().power(Watts(350.0)).imported_today(WattHours(2100.0)).build();
        let load = LoadEstimation::DirectFromMeter.estimate(
            &pv(800.0, Some(8000.0)),
            &meter,
            Polarity::Inverted,
            EnergyFallback::Omit,
        );
        assert_eq!(load.power, Watts(350.0));
        assert_eq!(load.grid_power, Watts(-350.0));
        assert_eq!(load.energy, None);

        let meter = MeterReading::builder().power(Watts(-120.0)).build();
        let load = LoadEstimation::DirectFromMeter.estimate(
            &pv(800.0, None),
            &meter,
            Polarity::Direct,
            EnergyFallback::ImportProxy,
        );
        assert_eq!(load.power, Watts::ZERO);
        assert_eq!(load.grid_power, Watts(120.0));
        assert_eq!(load.energy, None);
    }
}
