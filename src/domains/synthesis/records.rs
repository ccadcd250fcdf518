use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::mode::Mode;
use crate::common::{ControlError, ControlResult};

pub const FIELD_MODE: &str = "mode";
pub const FIELD_CONTROL_READY: &str = "is_control_ready";
pub const FIELD_ACTIONS: &str = "actions_list";
pub const DEFAULT_ACK_FIELD: &str = "is_control_received";

/// Boolean carried as the literal strings `"true"` / `"false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFlag(pub bool);

impl Serialize for WireFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.0 { "true" } else { "false" })
    }
}

impl<'de> Deserialize<'de> for WireFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(WireFlag(raw.trim() == "true"))
    }
}

/// Clears a stale synthesis request before a new one is written.
#[derive(Debug, Serialize)]
pub struct ClearSynthRequest {
    pub is_synth_requested: WireFlag,
    pub is_last_synth_request: WireFlag,
}

impl Default for ClearSynthRequest {
    fn default() -> Self {
        Self {
            is_synth_requested: WireFlag(false),
            is_last_synth_request: WireFlag(false),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SynthRequest<'a> {
    pub target_set: &'a str,
    pub obst_set: &'a str,
    pub is_last_synth_request: WireFlag,
    pub is_synth_requested: WireFlag,
}

#[derive(Debug, Serialize)]
pub struct ControlRequest<'a> {
    pub current_state: &'a str,
    pub is_control_requested: WireFlag,
    pub is_last_control_request: WireFlag,
}

/// Synthesis and control fields in one write.
#[derive(Debug, Serialize)]
pub struct CombinedRequest<'a> {
    #[serde(flatten)]
    pub synth: SynthRequest<'a>,
    #[serde(flatten)]
    pub control: ControlRequest<'a>,
}

pub fn to_payload<T: Serialize>(record: &T) -> ControlResult<Value> {
    serde_json::to_value(record)
        .map_err(|e| ControlError::violation(format!("cannot encode request record: {}", e)))
}

pub fn acknowledgement(ack_field: &str) -> Value {
    let mut map = Map::new();
    map.insert(ack_field.to_string(), Value::String("true".to_string()));
    Value::Object(map)
}

/// Read side of the per-robot dictionary resource.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryView {
    pub mode: Option<Mode>,
    /// `None` when the field is absent, which is distinct from `"false"`.
    pub control_ready: Option<bool>,
    pub actions_list: Option<String>,
}

impl DictionaryView {
    pub fn from_json(value: &Value) -> ControlResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| ControlError::violation("synthesis resource is not a JSON object"))?;
        let text = |field: &str| -> ControlResult<Option<String>> {
            match map.get(field) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(ControlError::violation(format!(
                    "field '{}' is not a string: {}",
                    field, other
                ))),
            }
        };
        Ok(Self {
            mode: text(FIELD_MODE)?.map(|m| Mode::parse(&m)),
            control_ready: text(FIELD_CONTROL_READY)?.map(|r| r.trim() == "true"),
            actions_list: text(FIELD_ACTIONS)?,
        })
    }

    pub fn require_mode(&self) -> ControlResult<&Mode> {
        self.mode
            .as_ref()
            .ok_or_else(|| ControlError::violation("synthesis resource has no 'mode' field"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_request_flattens_both_records() {
        let payload = to_payload(&CombinedRequest {
            synth: SynthRequest {
                target_set: "T",
                obst_set: "O",
                is_last_synth_request: WireFlag(false),
                is_synth_requested: WireFlag(true),
            },
            control: ControlRequest {
                current_state: "(0, 0, 0, 0)",
                is_control_requested: WireFlag(true),
                is_last_control_request: WireFlag(true),
            },
        })
        .unwrap();
        assert_eq!(payload["is_synth_requested"], "true");
        assert_eq!(payload["is_last_synth_request"], "false");
        assert_eq!(payload["current_state"], "(0, 0, 0, 0)");
        assert_eq!(payload.as_object().unwrap().len(), 7);
    }

    #[test]
    fn absent_ready_flag_differs_from_false() {
        let view = DictionaryView::from_json(&serde_json::json!({"mode": "idle"})).unwrap();
        assert_eq!(view.control_ready, None);
        let view = DictionaryView::from_json(&serde_json::json!({"is_control_ready": "false"})).unwrap();
        assert_eq!(view.control_ready, Some(false));
        assert!(view.require_mode().is_err());
    }
}
