//! Playback event types and subscription filters

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of notification the playback service emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Track metadata changed
    MetaChanged,
    /// Playing/paused state changed
    PlayStateChanged,
    /// Some underlying list changed and should be re-queried
    ListRefreshNeeded,
    /// A playlist was modified
    PlaylistChanged,
    /// A track could not be played
    TrackError,
}

impl EventKind {
    /// Every kind, in declaration order
    pub const ALL: [EventKind; 5] = [
        EventKind::MetaChanged,
        EventKind::PlayStateChanged,
        EventKind::ListRefreshNeeded,
        EventKind::PlaylistChanged,
        EventKind::TrackError,
    ];

    /// Stable name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MetaChanged => "meta_changed",
            EventKind::PlayStateChanged => "play_state_changed",
            EventKind::ListRefreshNeeded => "list_refresh_needed",
            EventKind::PlaylistChanged => "playlist_changed",
            EventKind::TrackError => "track_error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification emitted by the playback service
///
/// Events are immutable once constructed. Only [`PlaybackEvent::TrackError`]
/// carries a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackEvent {
    MetaChanged,
    PlayStateChanged,
    ListRefreshNeeded,
    PlaylistChanged,
    TrackError {
        /// Display name of the track that failed
        track_name: String,
    },
}

impl PlaybackEvent {
    /// Convenience constructor for a track error
    pub fn track_error(track_name: impl Into<String>) -> Self {
        PlaybackEvent::TrackError {
            track_name: track_name.into(),
        }
    }

    /// The kind of this event, used for filtering
    pub fn kind(&self) -> EventKind {
        match self {
            PlaybackEvent::MetaChanged => EventKind::MetaChanged,
            PlaybackEvent::PlayStateChanged => EventKind::PlayStateChanged,
            PlaybackEvent::ListRefreshNeeded => EventKind::ListRefreshNeeded,
            PlaybackEvent::PlaylistChanged => EventKind::PlaylistChanged,
            PlaybackEvent::TrackError { .. } => EventKind::TrackError,
        }
    }
}

impl fmt::Display for PlaybackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackEvent::TrackError { track_name } => write!(f, "track_error({})", track_name),
            other => f.write_str(other.kind().as_str()),
        }
    }
}

/// The set of event kinds a subscription is interested in
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventFilter {
    kinds: BTreeSet<EventKind>,
}

impl EventFilter {
    /// A filter that matches nothing
    pub fn none() -> Self {
        Self::default()
    }

    /// A filter matching every event kind
    pub fn all() -> Self {
        EventKind::ALL.into_iter().collect()
    }

    /// Add a kind to the filter
    pub fn with(mut self, kind: EventKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    /// Remove a kind from the filter
    pub fn without(mut self, kind: EventKind) -> Self {
        self.kinds.remove(&kind);
        self
    }

    /// Whether events of `kind` pass this filter
    pub fn matches(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Iterate the kinds in this filter
    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.kinds.iter().copied()
    }
}

impl FromIterator<EventKind> for EventFilter {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}
