// ── Device status snapshot ──
//
// One `Status` is built per decoded push and never mutated afterwards.
// Consumers receive it as `Arc<Status>`, so replacing the latest snapshot
// is a pointer swap.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Operating mode reported by the purifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Mode {
    Auto,
    Allergen,
    Bacteria,
    Sleep,
    Night,
    Manual,
}

impl Mode {
    /// Device code used in the `mode` field of pushes and control values.
    pub fn code(self) -> &'static str {
        match self {
            Self::Auto => "P",
            Self::Allergen => "A",
            Self::Bacteria => "B",
            Self::Sleep => "S",
            Self::Night => "N",
            Self::Manual => "M",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::iter().find(|mode| mode.code() == code)
    }
}

/// Fan (output) speed reported by the purifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FanSpeed {
    Silent,
    Speed1,
    Speed2,
    Speed3,
    Turbo,
}

impl FanSpeed {
    /// Device code used in the `om` field of pushes and control values.
    pub fn code(self) -> &'static str {
        match self {
            Self::Silent => "s",
            Self::Speed1 => "1",
            Self::Speed2 => "2",
            Self::Speed3 => "3",
            Self::Turbo => "t",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::iter().find(|speed| speed.code() == code)
    }
}

/// Immutable snapshot of everything the purifier reports in one push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub device_id: String,
    pub name: String,
    pub model: String,
    pub firmware_version: String,
    /// Firmware of the Wi-Fi module, versioned separately from the MCU.
    pub wifi_version: String,
    pub is_on: bool,
    pub mode: Mode,
    pub fan_speed: FanSpeed,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mode_codes_round_trip() {
        for mode in Mode::iter() {
            assert_eq!(Mode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(Mode::from_code("P"), Some(Mode::Auto));
        assert_eq!(Mode::from_code("X"), None);
    }

    #[test]
    fn fan_speed_codes_round_trip() {
        for speed in FanSpeed::iter() {
            assert_eq!(FanSpeed::from_code(speed.code()), Some(speed));
        }
        assert_eq!(FanSpeed::from_code("t"), Some(FanSpeed::Turbo));
        assert_eq!(FanSpeed::from_code("T"), None);
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("auto".parse::<Mode>().unwrap(), Mode::Auto);
        assert_eq!("Night".parse::<Mode>().unwrap(), Mode::Night);
        assert_eq!("speed2".parse::<FanSpeed>().unwrap(), FanSpeed::Speed2);
        assert!("warp".parse::<FanSpeed>().is_err());
    }

    #[test]
    fn display_matches_serde_names() {
        assert_eq!(Mode::Allergen.to_string(), "allergen");
        assert_eq!(FanSpeed::Speed3.to_string(), "speed3");
        assert_eq!(
            serde_json::to_value(FanSpeed::Speed3).unwrap(),
            serde_json::json!("speed3")
        );
    }
}
