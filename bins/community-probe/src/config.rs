//! Probe run settings
//!
//! Backend URL and timeout live in `community_api_client::ClientConfig`;
//! this module holds what only the probe needs.

/// Room name fragment that identifies the room of interest
pub const DEFAULT_TARGET_MARKER: &str = "Player Support 2";

/// Settings for one probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Substring searched for in room names
    pub target_marker: String,
    /// Also inspect the active chat queue
    pub survey_active: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target_marker: DEFAULT_TARGET_MARKER.to_string(),
            survey_active: false,
        }
    }
}

impl ProbeConfig {
    #[must_use]
    pub fn with_target_marker(mut self, marker: impl Into<String>) -> Self {
        self.target_marker = marker.into();
        self
    }

    #[must_use]
    pub fn with_survey_active(mut self, survey_active: bool) -> Self {
        self.survey_active = survey_active;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.target_marker, "Player Support 2");
        assert!(!config.survey_active);
    }

    #[test]
    fn test_builder() {
        let config = ProbeConfig::default()
            .with_target_marker("VIP")
            .with_survey_active(true);
        assert_eq!(config.target_marker, "VIP");
        assert!(config.survey_active);
    }
}
