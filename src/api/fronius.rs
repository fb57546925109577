mod models;
mod response;

use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;

use self::{
    models::{
        CommonInverterData,
        DailyEnergyData,
        InverterInfos,
        MeterData,
        PowerFlowData,
        StorageData,
    },
    response::Response,
};
use crate::{
    core::{
        reading::{CommonData, DeviceId, DeviceStatus, MeterReading, PowerFlow, StorageReading},
        source::TelemetrySource,
    },
    error::CycleError,
    prelude::*,
    quantity::energy::WattHours,
};

/// Fronius Solar API v1 client on the local network.
pub struct Api {
    client: Agent,
    base_url: String,
    meter_device_id: u32,
}

impl Api {
    /// `host` is `hostname` or `hostname:port`, without the scheme.
    pub fn new(host: &str, timeout: Duration, meter_device_id: u32) -> Self {
        let client = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(true)
            .user_agent("pvrelay")
            .build()
            .into();
        Self { client, base_url: format!("http://{host}/solar_api/v1"), meter_device_id }
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(endpoint = endpoint))]
    fn call<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<D, CycleError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let request = query
            .iter()
            .fold(self.client.get(&url), |request, (key, value)| request.query(*key, *value));
        let response = request
            .call()
            .map_err(|error| {
                CycleError::SourceUnavailable(format!("failed to call `{endpoint}`: {error}"))
            })?
            .body_mut()
            .read_json::<Response>()
            .map_err(|error| match error {
                ureq::Error::Json(error) if !error.is_io() => CycleError::MalformedResponse(
                    format!("`{endpoint}` returned invalid JSON: {error}"),
                ),
                error => CycleError::SourceUnavailable(format!(
                    "failed to read the `{endpoint}` response: {error}"
                )),
            })?;
        let data = Result::<serde_json::Value, CycleError>::from(response)?;
        trace!(%data, "received");
        serde_json::from_value(data).map_err(|error| {
            CycleError::MalformedResponse(format!("unexpected `{endpoint}` data: {error}"))
        })
    }

    fn inverter_realtime_data<D: DeserializeOwned>(
        &self,
        device_id: DeviceId,
        collection: &str,
    ) -> Result<D, CycleError> {
        let device_id = device_id.to_string();
        self.call(
            "GetInverterRealtimeData.cgi",
            &[("Scope", "Device"), ("DeviceID", &device_id), ("DataCollection", collection)],
        )
    }
}

impl TelemetrySource for Api {
    fn discover(&self) -> Result<Vec<DeviceStatus>, CycleError> {
        Ok(self.call::<InverterInfos>("GetInverterInfo.cgi", &[])?.into())
    }

    fn common_data(&self, device_id: DeviceId) -> Result<CommonData, CycleError> {
        Ok(self
            .inverter_realtime_data::<CommonInverterData>(device_id, "CommonInverterData")?
            .into())
    }

    fn energy_today(&self, device_id: DeviceId) -> Result<Option<WattHours>, CycleError> {
        Ok(self
            .inverter_realtime_data::<DailyEnergyData>(device_id, "EnergyReal_WAC_Sum_Day")?
            .energy
            .and_then(models::Reading::value)
            .map(WattHours))
    }

    fn power_flow(&self) -> Result<PowerFlow, CycleError> {
        let data = self.call::<PowerFlowData>("GetPowerFlowRealtimeData.fcgi", &[])?;
        debug!(grid_power = ?data.site.grid_power, "site grid power");
        Ok(data.into())
    }

    fn meter(&self) -> Result<MeterReading, CycleError> {
        let meter_device_id = self.meter_device_id.to_string();
        self.call::<MeterData>(
            "GetMeterRealtimeData.cgi",
            &[("Scope", "Device"), ("DeviceId", &meter_device_id)],
        )?
        .try_into()
    }

    fn storage(&self) -> Result<StorageReading, CycleError> {
        Ok(self.call::<Option<StorageData>>("GetStorageRealtimeData.cgi", &[])?.into())
    }
}
