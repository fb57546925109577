use std::collections::BTreeMap;

use serde::{Deserialize, de::IgnoredAny};
use serde_with::{DisplayFromStr, serde_as};

use crate::{
    core::reading::{
        CommonData,
        DeviceId,
        DeviceStatus,
        MeterReading,
        PowerFlow,
        StatusCode,
        StorageReading,
    },
    error::CycleError,
    quantity::{
        electric::{Hertz, Volts},
        energy::WattHours,
        percent::Percent,
        power::Watts,
    },
};

/// Numeric channel, either `{"Unit": "W", "Value": 1500}` or a bare number.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Wrapped {
        #[serde(rename = "Value")]
        value: Option<f64>,
    },
    Bare(f64),
}

impl Reading {
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Wrapped { value } => value,
            Self::Bare(value) => Some(value),
        }
    }
}

fn quantity<Q: From<f64>>(reading: Option<Reading>) -> Option<Q> {
    reading.and_then(Reading::value).map(Q::from)
}

#[serde_as]
#[derive(Deserialize)]
pub struct InverterInfos(
    #[serde_as(as = "BTreeMap<DisplayFromStr, _>")] pub BTreeMap<DeviceId, InverterInfo>,
);

#[derive(Deserialize)]
pub struct InverterInfo {
    #[serde(rename = "StatusCode")]
    pub status: StatusCode,
}

impl From<InverterInfos> for Vec<DeviceStatus> {
    fn from(infos: InverterInfos) -> Self {
        infos.0.into_iter().map(|(id, info)| DeviceStatus { id, status: info.status }).collect()
    }
}

#[derive(Deserialize)]
pub struct CommonInverterData {
    #[serde(rename = "PAC")]
    pub power: Option<Reading>,

    #[serde(rename = "UAC")]
    pub voltage: Option<Reading>,

    #[serde(rename = "FAC")]
    pub frequency: Option<Reading>,
}

impl From<CommonInverterData> for CommonData {
    fn from(data: CommonInverterData) -> Self {
        Self {
            power: quantity::<Watts>(data.power),
            voltage: quantity::<Volts>(data.voltage),
            frequency: quantity::<Hertz>(data.frequency),
        }
    }
}

#[derive(Deserialize)]
pub struct DailyEnergyData {
    #[serde(rename = "EnergyReal_WAC_Sum_Day")]
    pub energy: Option<Reading>,
}

#[derive(Deserialize)]
pub struct MeterData {
    /// Signed active power, in the meter's own convention.
    #[serde(rename = "PowerReal_P_Sum")]
    pub power: Option<Reading>,

    #[serde(rename = "EnergyReal_WAC_Sum_Consumed_Day")]
    pub imported_today: Option<Reading>,

    #[serde(rename = "EnergyReal_WAC_Sum_Produced_Day")]
    pub exported_today: Option<Reading>,

    #[serde(rename = "Frequency_Phase_Average")]
    pub frequency: Option<Reading>,
}

impl TryFrom<MeterData> for MeterReading {
    type Error = CycleError;

    fn try_from(data: MeterData) -> Result<Self, Self::Error> {
        let power = quantity::<Watts>(data.power).ok_or_else(|| {
            CycleError::MalformedResponse("the meter reports no `PowerReal_P_Sum`".to_string())
        })?;
        Ok(Self {
            power,
            imported_today: quantity::<WattHours>(data.imported_today),
            exported_today: quantity::<WattHours>(data.exported_today),
            frequency: quantity::<Hertz>(data.frequency),
        })
    }
}

#[derive(Deserialize)]
pub struct StorageData {
    /// Positive when discharging.
    #[serde(rename = "P")]
    pub power: Option<Reading>,

    #[serde(rename = "SOC")]
    pub state_of_charge: Option<Reading>,
}

impl From<Option<StorageData>> for StorageReading {
    fn from(data: Option<StorageData>) -> Self {
        data.map_or_else(Self::default, |data| Self {
            power: quantity::<Watts>(data.power),
            state_of_charge: quantity::<Percent>(data.state_of_charge),
        })
    }
}

#[serde_as]
#[derive(Deserialize)]
pub struct PowerFlowData {
    #[serde(rename = "Site")]
    pub site: Site,

    #[serde_as(as = "BTreeMap<DisplayFromStr, _>")]
    #[serde(rename = "Inverters", default)]
    pub inverters: BTreeMap<DeviceId, IgnoredAny>,
}

#[derive(Deserialize)]
pub struct Site {
    /// `null` when the inverters are asleep.
    #[serde(rename = "P_PV")]
    pub pv_power: Option<f64>,

    /// Negative when consuming.
    #[serde(rename = "P_Load")]
    pub load_power: Option<f64>,

    #[serde(rename = "P_Grid")]
    pub grid_power: Option<f64>,

    #[serde(rename = "E_Day")]
    pub energy_today: Option<f64>,
}

impl From<PowerFlowData> for PowerFlow {
    fn from(data: PowerFlowData) -> Self {
        Self {
            pv_power: data.site.pv_power.map_or(Watts::ZERO, Watts),
            load_power: data.site.load_power.map(|power| Watts(power).abs()),
            pv_energy_today: data.site.energy_today.map(WattHours),
            device_ids: data.inverters.into_keys().collect(),
        }
    }
}
