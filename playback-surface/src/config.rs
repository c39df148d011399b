//! Configuration for host surfaces
//!
//! Defaults cover the common case. Embedders can override them in code with
//! the `with_*` builder methods, from JSON, or from the environment.

use playback_events::EventFilter;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurfaceError};
use crate::notify::{MessageTemplate, DEFAULT_TRACK_ERROR_TEMPLATE};

/// Environment variable overriding [`SurfaceConfig::track_error_template`]
pub const TRACK_ERROR_TEMPLATE_ENV: &str = "PLAYLINK_TRACK_ERROR_TEMPLATE";

/// Configuration for a [`HostSurface`](crate::HostSurface)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Template for the message shown when a track fails to play
    /// Default: "Error playing {track}"
    pub track_error_template: String,

    /// Event kinds the surface subscribes to
    /// Default: all kinds
    pub filter: EventFilter,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            track_error_template: DEFAULT_TRACK_ERROR_TEMPLATE.to_string(),
            filter: EventFilter::all(),
        }
    }
}

impl SurfaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SurfaceConfig = serde_json::from_str(json)
            .map_err(|e| SurfaceError::Config(format!("Invalid surface config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, with `PLAYLINK_TRACK_ERROR_TEMPLATE` applied if set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(template) = std::env::var(TRACK_ERROR_TEMPLATE_ENV) {
            config.track_error_template = template;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        self.message_template()?;
        if self.filter.is_empty() {
            return Err(SurfaceError::Config(
                "Event filter must include at least one event kind".to_string(),
            ));
        }
        Ok(())
    }

    /// The parsed track error template
    pub fn message_template(&self) -> Result<MessageTemplate> {
        MessageTemplate::parse(self.track_error_template.as_str())
    }

    pub fn with_track_error_template(mut self, template: impl Into<String>) -> Self {
        self.track_error_template = template.into();
        self
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }
}
