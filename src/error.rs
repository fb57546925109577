use thiserror::Error;

/// Reasons for a report cycle to be aborted.
///
/// Any of these stops the cycle before the upload, so no partial report ever leaves the host.
#[derive(Debug, Error)]
pub enum CycleError {
    /// A telemetry fetch could not complete: connection, timeout, or an error status.
    #[error("telemetry source is unavailable: {0}")]
    SourceUnavailable(String),

    /// A fetch completed, but the payload is unparseable or misses a required value.
    #[error("malformed telemetry response: {0}")]
    MalformedResponse(String),

    #[error("no active devices: {0}")]
    NoActiveDevices(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),
}
