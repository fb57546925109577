use serde::Deserialize;

use crate::error::CycleError;

/// Solar API response envelope.
///
/// The data is kept as [`serde_json::Value`] so that it can be logged before it is parsed.
#[derive(Deserialize)]
pub struct Response {
    #[serde(rename = "Head", default)]
    head: Head,

    #[serde(rename = "Body")]
    body: Body,
}

#[derive(Default, Deserialize)]
struct Head {
    #[serde(rename = "Status", default)]
    status: Status,
}

#[derive(Default, Deserialize)]
struct Status {
    /// Non-zero when the request failed.
    #[serde(rename = "Code", default)]
    code: i32,

    #[serde(rename = "Reason", default)]
    reason: String,
}

#[derive(Deserialize)]
struct Body {
    #[serde(rename = "Data", default)]
    data: serde_json::Value,
}

impl From<Response> for Result<serde_json::Value, CycleError> {
    fn from(response: Response) -> Self {
        let status = response.head.status;
        if status.code == 0 {
            Ok(response.body.data)
        } else if status.reason.is_empty() {
            Err(CycleError::SourceUnavailable(format!("Solar API error {}", status.code)))
        } else {
            Err(CycleError::SourceUnavailable(format!(
                r#"Solar API error {} ("{}")"#,
                status.code, status.reason,
            )))
        }
    }
}
