//! Shared HTTP round trip for provider clients.

use crate::{translate_failure, translate_transport};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use studyforge_error::{ProviderError, ProviderErrorKind, StudyforgeResult};
use tracing::{debug, error};

/// Send a prepared request and decode a JSON success body.
///
/// Non-success statuses and transport errors are translated into
/// [`ProviderErrorKind`] here.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &'static str,
    timeout_secs: u64,
) -> StudyforgeResult<T> {
    let response = request.send().await.map_err(|e| {
        error!(provider, error = ?e, "Failed to send request");
        translate_transport(&e, timeout_secs)
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        error!(provider, error = ?e, "Failed to read response body");
        translate_transport(&e, timeout_secs)
    })?;

    if !status.is_success() {
        error!(provider, status = %status, "Provider returned error");
        return Err(translate_failure(status.as_u16(), &body).into());
    }

    debug!(provider, bytes = body.len(), "Received response");
    serde_json::from_str(&body).map_err(|e| {
        error!(provider, error = ?e, "Failed to parse response");
        ProviderError::new(ProviderErrorKind::Parse(e.to_string())).into()
    })
}
