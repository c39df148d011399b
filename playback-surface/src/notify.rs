//! User-facing transient messages

use crate::error::{Result, SurfaceError};

/// Placeholder replaced by the track name in a [`MessageTemplate`]
pub const TRACK_PLACEHOLDER: &str = "{track}";

/// Default template for track playback errors
pub const DEFAULT_TRACK_ERROR_TEMPLATE: &str = "Error playing {track}";

/// Presentation layer hook that shows a short-lived message to the user
pub trait MessageSink: Send + Sync {
    /// Show a fully formatted message once
    fn show_message(&self, message: &str);
}

/// Sink that writes messages to the log
///
/// Used when the embedding application does not provide its own sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn show_message(&self, message: &str) {
        tracing::info!(target: "playback_surface::message", "{}", message);
    }
}

/// Message template with a `{track}` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    template: String,
}

impl MessageTemplate {
    /// Parse a template, requiring at least one `{track}` placeholder
    pub fn parse(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(TRACK_PLACEHOLDER) {
            return Err(SurfaceError::Config(format!(
                "Message template {:?} has no {} placeholder",
                template, TRACK_PLACEHOLDER
            )));
        }
        Ok(Self { template })
    }

    /// Substitute `track` into every placeholder
    pub fn render(&self, track: &str) -> String {
        self.template.replace(TRACK_PLACEHOLDER, track)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TRACK_ERROR_TEMPLATE.to_string(),
        }
    }
}
