#![allow(dead_code)]

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use playback_events::EventChannel;
use playback_surface::{
    HostSurface, MessageSink, ObserverHandle, Phase, PlaybackObserver, SurfaceConfig,
};
use service_connector::{
    ConnectionLink, ConnectorError, LocalBinder, ServiceBinder, ServiceConnector, ServiceHandle,
    TokenId,
};

/// Shared, ordered record of callbacks, as "name:callback" entries
#[derive(Debug, Default)]
pub struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    pub fn record(&self, name: &str, callback: &str) {
        self.0.lock().push(format!("{}:{}", name, callback));
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

pub struct RecordingObserver {
    name: &'static str,
    log: Arc<CallLog>,
}

impl RecordingObserver {
    pub fn new(name: &'static str, log: &Arc<CallLog>) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: Arc::clone(log),
        })
    }
}

impl PlaybackObserver for RecordingObserver {
    fn on_meta_changed(&self) {
        self.log.record(self.name, "meta");
    }

    fn on_list_refresh_needed(&self) {
        self.log.record(self.name, "list");
    }

    fn on_playlist_changed(&self) {
        self.log.record(self.name, "playlist");
    }
}

/// Removes `target` from the surface when metadata changes
pub struct RemovingObserver {
    pub surface: Mutex<Weak<HostSurface>>,
    pub target: ObserverHandle,
    log: Arc<CallLog>,
}

impl RemovingObserver {
    pub fn new(target: ObserverHandle, log: &Arc<CallLog>) -> Arc<Self> {
        Arc::new(Self {
            surface: Mutex::new(Weak::new()),
            target,
            log: Arc::clone(log),
        })
    }

    pub fn attach(&self, surface: &Arc<HostSurface>) {
        *self.surface.lock() = Arc::downgrade(surface);
    }
}

impl PlaybackObserver for RemovingObserver {
    fn on_meta_changed(&self) {
        self.log.record("remover", "meta");
        if let Some(surface) = self.surface.lock().upgrade() {
            surface.remove_observer(self.target.clone());
        }
    }

    fn on_list_refresh_needed(&self) {}

    fn on_playlist_changed(&self) {}
}

/// Stops the surface when a playlist changes
pub struct StoppingObserver {
    pub surface: Mutex<Weak<HostSurface>>,
    log: Arc<CallLog>,
}

impl StoppingObserver {
    pub fn new(log: &Arc<CallLog>) -> Arc<Self> {
        Arc::new(Self {
            surface: Mutex::new(Weak::new()),
            log: Arc::clone(log),
        })
    }

    pub fn attach(&self, surface: &Arc<HostSurface>) {
        *self.surface.lock() = Arc::downgrade(surface);
    }
}

impl PlaybackObserver for StoppingObserver {
    fn on_meta_changed(&self) {
        self.log.record("stopper", "meta");
    }

    fn on_list_refresh_needed(&self) {}

    fn on_playlist_changed(&self) {
        self.log.record("stopper", "playlist");
        if let Some(surface) = self.surface.lock().upgrade() {
            surface.stop().unwrap();
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl MessageSink for RecordingSink {
    fn show_message(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Binder that queries its surface while unbinding
#[derive(Default)]
pub struct InspectingBinder {
    pub surface: Mutex<Weak<HostSurface>>,
    /// Phase and bound flag seen from inside `unbind`
    pub seen_on_unbind: Mutex<Option<(Phase, bool)>>,
}

impl InspectingBinder {
    pub fn attach(&self, surface: &Arc<HostSurface>) {
        *self.surface.lock() = Arc::downgrade(surface);
    }
}

impl ServiceBinder for InspectingBinder {
    fn bind(&self, _token: TokenId, link: ConnectionLink) -> service_connector::Result<()> {
        link.connected(ServiceHandle::new("player"));
        Ok(())
    }

    fn unbind(&self, _token: TokenId) -> service_connector::Result<()> {
        let surface = self.surface.lock().upgrade();
        if let Some(surface) = surface {
            *self.seen_on_unbind.lock() = Some((surface.phase(), surface.is_bound()));
        }
        Ok(())
    }
}

/// Accepts every binding and never reports back
#[derive(Debug, Default)]
pub struct PendingBinder;

impl ServiceBinder for PendingBinder {
    fn bind(&self, _token: TokenId, _link: ConnectionLink) -> service_connector::Result<()> {
        Ok(())
    }

    fn unbind(&self, _token: TokenId) -> service_connector::Result<()> {
        Ok(())
    }
}

/// Refuses to bind until `accept` is set
#[derive(Debug, Default)]
pub struct FlakyBinder {
    pub accept: Mutex<bool>,
}

impl ServiceBinder for FlakyBinder {
    fn bind(&self, _token: TokenId, _link: ConnectionLink) -> service_connector::Result<()> {
        if *self.accept.lock() {
            Ok(())
        } else {
            Err(ConnectorError::Bind("service not installed".to_string()))
        }
    }

    fn unbind(&self, _token: TokenId) -> service_connector::Result<()> {
        Ok(())
    }
}

pub fn local_connector() -> Arc<ServiceConnector> {
    let binder = Arc::new(LocalBinder::new(ServiceHandle::new("player")));
    Arc::new(ServiceConnector::new(binder))
}

/// Apply the initial `Connected` signal while no observer is registered,
/// so later call logs reflect events and lifecycle steps only
pub fn settle(surface: &Arc<HostSurface>) {
    surface.process_pending().unwrap();
}

pub struct Fixture {
    pub channel: EventChannel,
    pub surface: Arc<HostSurface>,
    pub sink: Arc<RecordingSink>,
}

pub fn fixture(config: SurfaceConfig) -> Fixture {
    let channel = EventChannel::new();
    let sink = Arc::new(RecordingSink::default());
    let surface = HostSurface::builder(channel.clone(), local_connector())
        .with_config(config)
        .with_message_sink(Arc::clone(&sink))
        .create()
        .unwrap();
    settle(&surface);
    Fixture {
        channel,
        surface,
        sink,
    }
}
