use crate::quantity::{
    electric::{Hertz, Volts},
    energy::WattHours,
    percent::Percent,
    power::Watts,
};

/// Inverter identifier on the telemetry source.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
)]
pub struct DeviceId(pub u32);

/// Inverter operational status code.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display, derive_more::From, serde::Deserialize)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const RUNNING: Self = Self(7);

    pub fn is_running(self) -> bool {
        self == Self::RUNNING
    }
}

/// Discovered inverter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeviceStatus {
    pub id: DeviceId,
    pub status: StatusCode,
}

/// Instantaneous inverter readings.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CommonData {
    pub power: Option<Watts>,
    pub voltage: Option<Volts>,
    pub frequency: Option<Hertz>,
}

/// Complete per-cycle reading of a single inverter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Device {
    pub id: DeviceId,
    pub status: StatusCode,
    pub power: Watts,
    pub voltage: Option<Volts>,
    pub frequency: Option<Hertz>,
    pub energy_today: WattHours,
}

/// Grid meter reading, still in the installation's own sign convention.
#[derive(Copy, Clone, Debug, PartialEq, bon::Builder)]
pub struct MeterReading {
    pub power: Watts,
    pub imported_today: Option<WattHours>,
    pub exported_today: Option<WattHours>,
    pub frequency: Option<Hertz>,
}

/// Battery reading in the vendor convention: positive power means discharging.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StorageReading {
    pub power: Option<Watts>,
    pub state_of_charge: Option<Percent>,
}

/// Site-level figures already aggregated by the telemetry source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PowerFlow {
    pub pv_power: Watts,

    /// Household consumption as an absolute value.
    pub load_power: Option<Watts>,

    pub pv_energy_today: Option<WattHours>,

    /// Inverters listed by the power flow, used to fetch the electrical readings.
    pub device_ids: Vec<DeviceId>,
}
