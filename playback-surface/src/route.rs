//! What each playback event does at the surface layer
//!
//! Every [`PlaybackEvent`] variant maps to exactly one [`Route`]; adding a
//! variant fails to compile until it is routed here.

use playback_events::PlaybackEvent;

use crate::observer::PlaybackObserver;

/// A notification fanned out to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    MetaChanged,
    ListRefreshNeeded,
    PlaylistChanged,
}

impl Notification {
    /// Invoke the matching callback on `observer`
    pub fn deliver(self, observer: &dyn PlaybackObserver) {
        match self {
            Notification::MetaChanged => observer.on_meta_changed(),
            Notification::ListRefreshNeeded => observer.on_list_refresh_needed(),
            Notification::PlaylistChanged => observer.on_playlist_changed(),
        }
    }
}

/// The handling chosen for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Fan out to the surface and its observers
    Notify(Notification),
    /// Reserved for play/pause reactions; nothing consumes it at this layer yet
    PlayState,
    /// Show a one-shot message naming the failed track
    TrackError(&'a str),
}

impl<'a> Route<'a> {
    pub fn for_event(event: &'a PlaybackEvent) -> Self {
        match event {
            PlaybackEvent::MetaChanged => Route::Notify(Notification::MetaChanged),
            PlaybackEvent::ListRefreshNeeded => Route::Notify(Notification::ListRefreshNeeded),
            PlaybackEvent::PlaylistChanged => Route::Notify(Notification::PlaylistChanged),
            PlaybackEvent::PlayStateChanged => Route::PlayState,
            PlaybackEvent::TrackError { track_name } => Route::TrackError(track_name),
        }
    }
}
