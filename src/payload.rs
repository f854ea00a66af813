//! Wire payloads exchanged with the foreign provider.
//!
//! Failure events carry a JSON object with `code`, `message` and `domain`. The Init request
//! carries the options object under the keys the native side reads.

use crate::error::{ErrorValue, RelayError};
use crate::types::InitOptions;
use serde::Serialize;

/// Decode the payload of a failure event.
///
/// Absent or empty payloads yield [`ErrorValue::unknown`]; anything that does not parse as an
/// error object yields [`ErrorValue::malformed`].
pub fn decode_error(payload: Option<&str>) -> ErrorValue {
    match payload {
        None => ErrorValue::unknown(),
        Some(text) if text.is_empty() => ErrorValue::unknown(),
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| ErrorValue::malformed()),
    }
}

pub fn encode_error(error: &ErrorValue) -> Result<String, RelayError> {
    Ok(serde_json::to_string(error)?)
}

#[derive(Serialize)]
struct NativeInitOptions<'a> {
    #[serde(rename = "TagForUnderAgeOfConsent")]
    tag_for_under_age_of_consent: bool,
    #[serde(rename = "DebugGeography")]
    debug_geography: i32,
    #[serde(rename = "TestDeviceHashedIds")]
    test_device_hashed_ids: &'a [String],
}

/// Serialize Init options for the native request.
pub fn encode_init_options(options: &InitOptions) -> Result<String, RelayError> {
    let native = NativeInitOptions {
        tag_for_under_age_of_consent: options.tag_for_under_age_of_consent,
        debug_geography: options.debug_geography.as_native(),
        test_device_hashed_ids: &options.test_device_hashed_ids,
    };
    Ok(serde_json::to_string(&native)?)
}
