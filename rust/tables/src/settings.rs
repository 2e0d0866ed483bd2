use crate::events::DEFAULT_EVENT_BUFFER;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tonk_engine::rules::TableRules;

/// Settings shared by every table a registry opens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableSettings {
    /// Dealing rules applied to new tables
    pub rules: TableRules,
    /// Commands a table queues before senders wait
    pub command_queue_capacity: usize,
    /// Events buffered per subscriber before it is dropped as too slow
    pub event_buffer: usize,
    /// Policy that plays for a seat that disconnects mid-turn
    pub autoplay_policy: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            rules: TableRules::default(),
            command_queue_capacity: 64,
            event_buffer: DEFAULT_EVENT_BUFFER,
            autoplay_policy: "baseline".to_string(),
        }
    }
}

impl TableSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.rules
            .validate()
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;

        if self.command_queue_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "command_queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer == 0 {
            return Err(SettingsError::InvalidValue(
                "event_buffer must be greater than 0".to_string(),
            ));
        }

        if !tonk_ai::POLICIES.contains(&self.autoplay_policy.as_str()) {
            return Err(SettingsError::InvalidValue(format!(
                "unknown autoplay_policy: {}",
                self.autoplay_policy
            )));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
    #[error("Could not parse settings: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TableSettings::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s = TableSettings::from_json(r#"{"autoplay_policy":"greedy","rules":{"max_seats":3}}"#)
            .unwrap();
        assert_eq!(s.autoplay_policy, "greedy");
        assert_eq!(s.rules.max_seats, 3);
        assert_eq!(s.rules.hand_size, 5);
        assert_eq!(s.command_queue_capacity, 64);
    }

    #[test]
    fn rejects_bad_values() {
        let unknown = TableSettings {
            autoplay_policy: "oracle".into(),
            ..TableSettings::default()
        };
        assert!(matches!(unknown.validate(), Err(SettingsError::InvalidValue(_))));

        let zero = TableSettings {
            command_queue_capacity: 0,
            ..TableSettings::default()
        };
        assert!(zero.validate().is_err());

        assert!(matches!(
            TableSettings::from_json("{not json"),
            Err(SettingsError::Parse(_))
        ));
    }
}
