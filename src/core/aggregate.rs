use std::ops::{Add, Div};

use crate::{
    core::{
        collector::Generation,
        reading::{CommonData, Device, PowerFlow},
    },
    error::CycleError,
    prelude::*,
    quantity::{
        electric::{Hertz, Volts},
        energy::WattHours,
        power::Watts,
    },
};

/// Strategy for turning the generation readings into a single site sample.
///
/// This is an explicit choice: the strategy is never guessed from the response shape.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum Aggregation {
    /// Sum up the readings of every running inverter.
    #[default]
    PerDevice,

    /// Take the site figures from the power flow endpoint.
    PowerFlow,
}

/// Site-level generation sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PvSample {
    pub power: Watts,
    pub energy_today: Option<WattHours>,
    pub voltage: Option<Volts>,
    pub frequency: Option<Hertz>,

    /// Household consumption, when the source has already derived it.
    pub upstream_load: Option<Watts>,
}

impl Generation {
    pub fn aggregate(&self) -> Result<PvSample, CycleError> {
        match self {
            Self::Devices(devices) => sum_devices(devices),
            Self::PowerFlow { flow, readings } => Ok(pass_through(flow, readings)),
        }
    }
}

fn sum_devices(devices: &[Device]) -> Result<PvSample, CycleError> {
    let running = || devices.iter().filter(|device| device.status.is_running());
    let power: Watts = running().map(|device| device.power).sum();
    let energy_today: WattHours = running().map(|device| device.energy_today).sum();
    if power == Watts::ZERO && energy_today == WattHours::ZERO {
        return Err(CycleError::NoActiveDevices("all running inverters report zero".to_string()));
    }
    let sample = PvSample {
        power,
        energy_today: Some(energy_today),
        voltage: mean(running().filter_map(|device| device.voltage)).map(Volts::rounded),
        frequency: mean(running().filter_map(|device| device.frequency)).map(Hertz::rounded),
        upstream_load: None,
    };
    info!(?sample.power, ?sample.energy_today, ?sample.voltage, ?sample.frequency, "aggregated");
    Ok(sample)
}

fn pass_through(flow: &PowerFlow, readings: &[CommonData]) -> PvSample {
    let sample = PvSample {
        power: flow.pv_power,
        energy_today: flow.pv_energy_today,
        voltage: mean(readings.iter().filter_map(|reading| reading.voltage)).map(Volts::rounded),
        frequency: mean(readings.iter().filter_map(|reading| reading.frequency))
            .map(Hertz::rounded),
        upstream_load: flow.load_power,
    };
    info!(?sample.power, ?sample.upstream_load, ?sample.voltage, "passed the power flow through");
    sample
}

/// Arithmetic mean, or [`None`] for an empty input.
fn mean<T>(values: impl IntoIterator<Item = T>) -> Option<T>
where
    T: Copy + Add<Output = T> + Div<f64, Output = T>,
{
    let (sum, count) = values.into_iter().fold((None, 0_u32), |(sum, count), value| {
        (Some(sum.map_or(value, |sum: T| sum + value)), count + 1)
    });
    sum.map(|sum| sum / f64::from(count))
}
