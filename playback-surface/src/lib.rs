//! # Playback Surface
//!
//! Lifecycle glue between a host UI surface and the background playback
//! service. A [`HostSurface`] binds to the service when it is created, listens
//! to the [`EventChannel`](playback_events::EventChannel) while it is started,
//! and fans every notification out to the observers registered with it.
//!
//! ## Overview
//!
//! - **Lifecycle-bound listening**: subscribe on start, unsubscribe on stop,
//!   release everything on destroy
//! - **Snapshot fan-out**: observers may add or remove observers from inside a
//!   callback without disturbing the pass in progress
//! - **Weak delivery**: event sources hold a [`StatusReceiver`], never the
//!   surface, so a torn-down surface is skipped rather than kept alive
//! - **Best-effort teardown**: failures while releasing resources are logged
//!   and reported, never allowed to stop the rest of the teardown
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use playback_events::{EventChannel, PlaybackEvent};
//! use playback_surface::{HostSurface, PlaybackObserver};
//! use service_connector::{LocalBinder, ServiceConnector, ServiceHandle};
//!
//! #[derive(Default)]
//! struct NowPlaying {
//!     refreshes: AtomicUsize,
//! }
//!
//! impl PlaybackObserver for NowPlaying {
//!     fn on_meta_changed(&self) {
//!         self.refreshes.fetch_add(1, Ordering::SeqCst);
//!     }
//!     fn on_list_refresh_needed(&self) {}
//!     fn on_playlist_changed(&self) {}
//! }
//!
//! let channel = EventChannel::new();
//! let binder = Arc::new(LocalBinder::new(ServiceHandle::new("player")));
//! let connector = Arc::new(ServiceConnector::new(binder));
//! let surface = HostSurface::builder(channel.clone(), connector).create().unwrap();
//!
//! let panel = Arc::new(NowPlaying::default());
//! surface.add_observer(&panel).unwrap();
//! surface.start().unwrap();
//!
//! channel.publish(PlaybackEvent::MetaChanged);
//! surface.process_pending().unwrap();
//!
//! // One refresh when the service connected, one for the event
//! assert_eq!(panel.refreshes.load(Ordering::SeqCst), 2);
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod notify;
pub mod observer;
pub mod receiver;
pub mod registry;
pub mod route;
pub mod surface;
pub mod teardown;

pub use config::SurfaceConfig;
pub use error::{Result, SurfaceError, TeardownFault};
pub use lifecycle::Phase;
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use notify::{MessageSink, MessageTemplate, TracingSink};
pub use observer::{ObserverHandle, PlaybackObserver};
pub use receiver::{DeliveryOutcome, StatusReceiver};
pub use registry::{FanOut, ObserverRegistry};
pub use route::{Notification, Route};
pub use surface::{HostSurface, HostSurfaceBuilder};
pub use teardown::TeardownReport;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::{
        HostSurface, HostSurfaceBuilder, ObserverHandle, PlaybackObserver, SurfaceConfig,
        SurfaceError, TeardownReport,
    };
}
