use bon::Builder;

use crate::{
    core::{
        aggregate::PvSample,
        load::{EnergyFallback, LoadEstimation},
        reading::{MeterReading, StorageReading},
        sign::{Polarity, normalize_battery_power},
    },
    quantity::{
        electric::{Hertz, Volts},
        energy::WattHours,
        percent::Percent,
        power::Watts,
    },
};

/// Normalized site sample of a single cycle.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Builder)]
pub struct AggregateSample {
    pub pv_power: Watts,
    pub pv_energy: Option<WattHours>,
    pub voltage: Option<Volts>,
    pub frequency: Option<Hertz>,

    /// Positive when importing from the grid.
    pub grid_power: Watts,

    pub load_power: Watts,
    pub load_energy: Option<WattHours>,

    /// Positive when charging.
    pub battery_power: Option<Watts>,

    pub battery_soc: Option<Percent>,
}

/// Strategy choices for deriving the sample.
#[derive(Copy, Clone, Debug, Default, Builder)]
pub struct Estimation {
    #[builder(default)]
    pub load: LoadEstimation,

    #[builder(default)]
    pub fallback: EnergyFallback,

    #[builder(default)]
    pub polarity: Polarity,
}

impl AggregateSample {
    pub fn derive(
        pv: &PvSample,
        meter: &MeterReading,
        storage: Option<&StorageReading>,
        estimation: Estimation,
    ) -> Self {
        let load = estimation.load.estimate(pv, meter, estimation.polarity, estimation.fallback);
        Self {
            pv_power: pv.power,
            pv_energy: pv.energy_today,
            voltage: pv.voltage,
            frequency: pv.frequency.or_else(|| meter.frequency.map(Hertz::rounded)),
            grid_power: load.grid_power,
            load_power: load.power,
            load_energy: load.energy,
            battery_power: storage
                .and_then(|storage| storage.power)
                .map(normalize_battery_power),
            battery_soc: storage
                .and_then(|storage| storage.state_of_charge)
                .and_then(Percent::validated),
        }
    }
}
