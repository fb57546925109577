use itertools::Itertools;

use crate::{
    core::{
        aggregate::Aggregation,
        reading::{CommonData, Device, DeviceId, DeviceStatus, MeterReading, PowerFlow, StorageReading},
        source::TelemetrySource,
    },
    error::CycleError,
    prelude::*,
};

/// Raw generation data, shaped by the aggregation strategy.
#[derive(Clone, Debug, PartialEq)]
pub enum Generation {
    Devices(Vec<Device>),

    PowerFlow {
        flow: PowerFlow,

        /// Electrical readings of the inverters listed by the power flow.
        readings: Vec<CommonData>,
    },
}

/// Everything fetched during a single cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Telemetry {
    pub generation: Generation,
    pub meter: MeterReading,
    pub storage: Option<StorageReading>,
}

/// Fetch the generation, meter, and optionally storage readings.
#[instrument(skip_all, fields(aggregation = ?aggregation, with_storage = with_storage))]
pub fn collect(
    source: &impl TelemetrySource,
    aggregation: Aggregation,
    with_storage: bool,
) -> Result<Telemetry, CycleError> {
    let generation = match aggregation {
        Aggregation::PerDevice => {
            Generation::Devices(collect_devices(source, &discover_running(source)?)?)
        }
        Aggregation::PowerFlow => {
            let flow = source.power_flow()?;
            let readings = collect_common_data(source, &running_in_flow(source, &flow)?);
            Generation::PowerFlow { flow, readings }
        }
    };
    let meter = source.meter()?;
    debug!(?meter, "fetched the meter reading");
    let storage = if with_storage {
        let storage = source.storage()?;
        debug!(?storage, "fetched the storage reading");
        Some(storage)
    } else {
        None
    };
    Ok(Telemetry { generation, meter, storage })
}

/// Discover the inverters and keep the running ones.
#[instrument(skip_all)]
pub fn discover_running(source: &impl TelemetrySource) -> Result<Vec<DeviceStatus>, CycleError> {
    let devices = source.discover()?;
    if devices.is_empty() {
        return Err(CycleError::NoActiveDevices("no inverters discovered".to_string()));
    }
    let (running, idle): (Vec<_>, Vec<_>) =
        devices.iter().copied().partition(|device| device.status.is_running());
    for device in &idle {
        debug!(%device.id, %device.status, "skipping the idle inverter");
    }
    if running.is_empty() {
        return Err(CycleError::NoActiveDevices(format!(
            "none of {} inverters is running",
            devices.len(),
        )));
    }
    info!(ids = %running.iter().map(|device| device.id).join(","), "discovered");
    Ok(running)
}

/// Read every device, skipping those failing to report.
fn collect_devices(
    source: &impl TelemetrySource,
    statuses: &[DeviceStatus],
) -> Result<Vec<Device>, CycleError> {
    let devices: Vec<Device> = statuses
        .iter()
        .filter_map(|status| match read_device(source, *status) {
            Ok(device) => Some(device),
            Err(error) => {
                warn!(%status.id, "skipping the inverter: {error}");
                None
            }
        })
        .collect();
    if devices.is_empty() {
        return Err(CycleError::NoActiveDevices(
            "no running inverter yielded any data".to_string(),
        ));
    }
    Ok(devices)
}

#[instrument(skip_all, fields(id = %status.id))]
fn read_device(source: &impl TelemetrySource, status: DeviceStatus) -> Result<Device, CycleError> {
    let common_data = source.common_data(status.id)?;
    let power = common_data.power.ok_or_else(|| {
        CycleError::MalformedResponse(format!("inverter {} reports no power", status.id))
    })?;
    let energy_today = source.energy_today(status.id)?.ok_or_else(|| {
        CycleError::MalformedResponse(format!("inverter {} reports no daily energy", status.id))
    })?;
    debug!(?power, ?energy_today, voltage = ?common_data.voltage, frequency = ?common_data.frequency);
    Ok(Device {
        id: status.id,
        status: status.status,
        power,
        voltage: common_data.voltage,
        frequency: common_data.frequency,
        energy_today,
    })
}

/// Keep the inverters listed by the power flow that are currently running.
fn running_in_flow(
    source: &impl TelemetrySource,
    flow: &PowerFlow,
) -> Result<Vec<DeviceId>, CycleError> {
    let statuses = source.discover()?;
    Ok(flow
        .device_ids
        .iter()
        .copied()
        .filter(|device_id| {
            let is_running = statuses
                .iter()
                .any(|device| device.id == *device_id && device.status.is_running());
            if !is_running {
                debug!(%device_id, "skipping the electrical readings of the idle inverter");
            }
            is_running
        })
        .collect())
}

fn collect_common_data(source: &impl TelemetrySource, device_ids: &[DeviceId]) -> Vec<CommonData> {
    device_ids
        .iter()
        .filter_map(|device_id| {
            source
                .common_data(*device_id)
                .inspect_err(|error| warn!(%device_id, "no electrical readings: {error}"))
                .ok()
        })
        .collect()
}
