// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use encoding_rs::WINDOWS_1255;

use crate::error::Result;
use crate::models::UpstreamConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &UpstreamConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Decode an upstream body.
///
/// The upstream always answers in windows-1255 whatever the headers say.
/// Any other codepage corrupts Hebrew text silently, so this is fixed.
pub fn decode_legacy(bytes: &[u8]) -> String {
    let (text, had_errors) = WINDOWS_1255.decode_without_bom_handling(bytes);
    if had_errors {
        log::debug!("windows-1255 body contained unmappable bytes");
    }
    text.into_owned()
}
