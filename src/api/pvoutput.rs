use std::time::Duration;

use http::header::CONTENT_TYPE;
use ureq::Agent;

use crate::{
    core::{cycle::ReportSink, report::Report},
    error::CycleError,
    prelude::*,
};

pub const DEFAULT_URL: &str = "https://pvoutput.org/service/r2/addstatus.jsp";

/// PVOutput `addstatus` service.
pub struct Api {
    client: Agent,
    url: String,
    api_key: String,
    system_id: String,
}

impl Api {
    pub fn new(url: String, api_key: String, system_id: String, timeout: Duration) -> Self {
        // Non-success replies carry the reason in the body.
        let client = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .user_agent("pvrelay")
            .build()
            .into();
        Self { client, url, api_key, system_id }
    }
}

impl ReportSink for Api {
    #[instrument(skip_all, fields(date = %report.date, time = %report.time))]
    fn send(&self, report: &Report) -> Result<(), CycleError> {
        let body = serde_qs::to_string(report)
            .map_err(|error| CycleError::UploadFailed(format!("failed to encode: {error}")))?;
        debug!(body = body.as_str(), "uploading…");
        let mut response = self
            .client
            .post(&self.url)
            .header("X-Pvoutput-Apikey", &self.api_key)
            .header("X-Pvoutput-SystemId", &self.system_id)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send(body.as_str())
            .map_err(|error| CycleError::UploadFailed(format!("failed to post: {error}")))?;
        let status = response.status();
        let reply = response
            .body_mut()
            .read_to_string()
            .map_err(|error| CycleError::UploadFailed(format!("failed to read the reply: {error}")))?;
        let reply = reply.trim();
        if !status.is_success() {
            return Err(CycleError::UploadFailed(format!("{status}: {reply}")));
        }
        info!(reply, "uploaded");
        Ok(())
    }
}
