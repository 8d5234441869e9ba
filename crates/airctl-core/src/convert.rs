// ── Push-to-domain conversion ──
//
// Turns a raw status push (key → string map as the device sends it) into
// the canonical `Status` snapshot. Every field is required; unknown mode
// or speed codes are rejected rather than defaulted.

use serde::Deserialize;
use serde_json::Value;

use airctl_api::RawStatus;

use crate::error::DecodeError;
use crate::model::{FanSpeed, Mode, Status};

/// Wire shape of a status push. Extra keys are ignored.
#[derive(Debug, Deserialize)]
struct WireStatus {
    #[serde(rename = "DeviceId")]
    device_id: String,
    name: String,
    #[serde(rename = "modelid")]
    model_id: String,
    #[serde(rename = "swversion")]
    sw_version: String,
    #[serde(rename = "WifiVersion")]
    wifi_version: String,
    pwr: String,
    mode: String,
    om: String,
}

/// Decode one raw push.
pub fn decode_status(raw: RawStatus) -> Result<Status, DecodeError> {
    let wire: WireStatus =
        serde_json::from_value(Value::Object(raw)).map_err(|e| DecodeError::Malformed {
            message: e.to_string(),
        })?;

    let is_on = match wire.pwr.as_str() {
        "1" => true,
        "0" => false,
        _ => {
            return Err(DecodeError::InvalidValue {
                field: "pwr",
                value: wire.pwr,
            });
        }
    };

    let mode = Mode::from_code(&wire.mode).ok_or(DecodeError::InvalidValue {
        field: "mode",
        value: wire.mode.clone(),
    })?;

    let fan_speed = FanSpeed::from_code(&wire.om).ok_or(DecodeError::InvalidValue {
        field: "om",
        value: wire.om.clone(),
    })?;

    Ok(Status {
        device_id: wire.device_id,
        name: wire.name,
        model: wire.model_id,
        firmware_version: wire.sw_version,
        wifi_version: wire.wifi_version,
        is_on,
        mode,
        fan_speed,
    })
}
