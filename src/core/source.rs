use crate::{
    core::reading::{
        CommonData,
        DeviceId,
        DeviceStatus,
        MeterReading,
        PowerFlow,
        StorageReading,
    },
    error::CycleError,
    quantity::energy::WattHours,
};

/// Local telemetry endpoint of the inverter installation.
///
/// Every call is a single blocking request: implementations do not retry.
pub trait TelemetrySource {
    /// List all known inverters with their status, in the source's order.
    fn discover(&self) -> Result<Vec<DeviceStatus>, CycleError>;

    fn common_data(&self, device_id: DeviceId) -> Result<CommonData, CycleError>;

    /// Energy produced by the inverter since midnight.
    fn energy_today(&self, device_id: DeviceId) -> Result<Option<WattHours>, CycleError>;

    fn power_flow(&self) -> Result<PowerFlow, CycleError>;

    fn meter(&self) -> Result<MeterReading, CycleError>;

    fn storage(&self) -> Result<StorageReading, CycleError>;
}
