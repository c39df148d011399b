//! Host surface: lifecycle-bound subscription, service binding and fan-out

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use playback_events::{EventChannel, OwnerId, PlaybackEvent, Subscription};
use service_connector::{
    ConnectionSignal, ServiceConnection, ServiceConnector, ServiceHandle, TokenId,
};

use crate::config::SurfaceConfig;
use crate::error::{Result, SurfaceError, TeardownFault};
use crate::lifecycle::Phase;
use crate::notify::{MessageSink, MessageTemplate, TracingSink};
use crate::observer::{ObserverHandle, PlaybackObserver};
use crate::receiver::StatusReceiver;
use crate::registry::{FanOut, ObserverRegistry};
use crate::route::{Notification, Route};
use crate::teardown::TeardownReport;

/// Builder for [`HostSurface`]
pub struct HostSurfaceBuilder {
    channel: EventChannel,
    connector: Arc<ServiceConnector>,
    config: SurfaceConfig,
    hooks: Option<Arc<dyn PlaybackObserver>>,
    sink: Arc<dyn MessageSink>,
}

impl HostSurfaceBuilder {
    pub fn new(channel: EventChannel, connector: Arc<ServiceConnector>) -> Self {
        Self {
            channel,
            connector,
            config: SurfaceConfig::default(),
            hooks: None,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_config(mut self, config: SurfaceConfig) -> Self {
        self.config = config;
        self
    }

    /// The surface's own reactions, run before every fan-out
    ///
    /// The hooks object cannot also be registered as an observer of the same
    /// surface.
    pub fn with_hooks<H: PlaybackObserver + 'static>(mut self, hooks: Arc<H>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Where track error messages are shown; defaults to [`TracingSink`]
    pub fn with_message_sink<S: MessageSink + 'static>(mut self, sink: Arc<S>) -> Self {
        self.sink = sink;
        self
    }

    /// Create the surface and request its service binding
    ///
    /// A binding that fails to start is logged and left absent; the surface
    /// tolerates a service that never connects and retries on the next start.
    pub fn create(self) -> Result<Arc<HostSurface>> {
        self.config.validate()?;
        let template = self.config.message_template()?;
        if self.channel.is_closed() {
            return Err(SurfaceError::Channel(playback_events::ChannelError::Closed));
        }

        let owner = self.channel.register_owner();
        let surface = Arc::new_cyclic(|this| HostSurface {
            owner,
            this: this.clone(),
            channel: self.channel,
            connector: self.connector,
            config: self.config,
            template,
            hooks: self.hooks,
            sink: self.sink,
            registry: ObserverRegistry::new(),
            state: Mutex::new(SurfaceState {
                phase: Phase::Created,
                connection: ServiceConnection::new(),
                subscription: None,
            }),
        });

        surface.ensure_binding();

        tracing::debug!("Created host surface {}", owner);
        Ok(surface)
    }
}

struct SurfaceState {
    phase: Phase,
    connection: ServiceConnection,
    subscription: Option<Subscription>,
}

/// A visible unit of the application that follows playback
///
/// Owns one service binding, one event subscription while it is listening,
/// and a registry of observers that receive its notifications. Always lives
/// inside an `Arc`; event sources reach it only through a [`StatusReceiver`].
///
/// All methods are meant to be called from the surface's callback thread.
/// Observer callbacks run with no internal lock held, so they may call back
/// into the surface (add or remove observers, stop it).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use playback_events::{EventChannel, PlaybackEvent};
/// use playback_surface::HostSurface;
/// use service_connector::{LocalBinder, ServiceConnector, ServiceHandle};
///
/// let channel = EventChannel::new();
/// let binder = Arc::new(LocalBinder::new(ServiceHandle::new("player")));
/// let connector = Arc::new(ServiceConnector::new(binder));
///
/// let surface = HostSurface::builder(channel.clone(), connector).create().unwrap();
/// surface.start().unwrap();
/// surface.resume().unwrap();
///
/// channel.publish(PlaybackEvent::PlaylistChanged);
/// assert_eq!(surface.process_pending().unwrap(), 1);
///
/// let report = surface.destroy();
/// assert!(report.is_clean());
/// ```
pub struct HostSurface {
    owner: OwnerId,
    this: Weak<HostSurface>,
    channel: EventChannel,
    connector: Arc<ServiceConnector>,
    config: SurfaceConfig,
    template: MessageTemplate,
    hooks: Option<Arc<dyn PlaybackObserver>>,
    sink: Arc<dyn MessageSink>,
    registry: ObserverRegistry,
    state: Mutex<SurfaceState>,
}

impl HostSurface {
    pub fn builder(channel: EventChannel, connector: Arc<ServiceConnector>) -> HostSurfaceBuilder {
        HostSurfaceBuilder::new(channel, connector)
    }

    /// Start listening: subscribe to the event channel
    ///
    /// Only a created or stopped surface can be started; a surface that is
    /// already listening keeps its subscription and queued events.
    pub fn start(&self) -> Result<()> {
        Self::check_startable(self.phase())?;
        self.ensure_binding();
        let subscription = self.channel.subscribe(self.owner, self.config.filter.clone())?;

        let mut state = self.state.lock();
        Self::check_startable(state.phase)?;
        if state.subscription.is_some() {
            return Err(SurfaceError::InvalidOperation(format!(
                "host surface {} already holds a subscription",
                self.owner
            )));
        }
        state.subscription = Some(subscription);
        state.phase = Phase::Started;
        tracing::debug!("Host surface {} started", self.owner);
        Ok(())
    }

    /// Bring the surface to the foreground
    ///
    /// Resuming a stopped surface starts it first. Every resume re-runs the
    /// meta-changed reaction once so the surface reflects current playback
    /// without waiting for an event.
    pub fn resume(&self) -> Result<()> {
        if self.phase() == Phase::Stopped {
            self.start()?;
            tracing::debug!("Host surface {} restarted", self.owner);
        }
        {
            let mut state = self.state.lock();
            state.phase.check_transition(Phase::Resumed)?;
            state.phase = Phase::Resumed;
        }

        tracing::debug!("Host surface {} resumed", self.owner);
        self.on_meta_changed();
        Ok(())
    }

    /// Move from the foreground back to started
    pub fn pause(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.phase.check_transition(Phase::Started)?;
        if state.phase != Phase::Resumed {
            return Err(SurfaceError::InvalidTransition {
                from: state.phase,
                to: Phase::Started,
            });
        }
        state.phase = Phase::Started;
        tracing::debug!("Host surface {} paused", self.owner);
        Ok(())
    }

    /// Stop listening: unsubscribe from the event channel
    ///
    /// A resumed surface is paused first. Stopping a surface that is already
    /// stopped or destroyed does nothing. A failure to unsubscribe is logged;
    /// the subscription is released regardless.
    pub fn stop(&self) -> Result<()> {
        let subscription = {
            let mut state = self.state.lock();
            match state.phase {
                Phase::Stopped | Phase::Destroyed => return Ok(()),
                Phase::Resumed => state.phase = Phase::Started,
                _ => {}
            }
            state.phase.check_transition(Phase::Stopped)?;
            state.phase = Phase::Stopped;
            state.subscription.take()
        };

        if let Err(fault) = self.release_subscription(subscription) {
            tracing::warn!("Host surface {}: {}", self.owner, fault);
        }
        tracing::debug!("Host surface {} stopped", self.owner);
        Ok(())
    }

    /// Tear the surface down
    ///
    /// Unsubscribes, releases the service binding, clears the observer
    /// registry and releases the owner id, in that order. Every step runs even
    /// if an earlier one fails; failures are logged and collected in the
    /// report. Calling this again is a no-op.
    ///
    /// No lock is held while the channel and binder are called, so a binder
    /// may query the surface from `unbind`.
    pub fn destroy(&self) -> TeardownReport {
        let (previous, subscription, mut connection) = {
            let mut state = self.state.lock();
            if state.phase == Phase::Destroyed {
                return TeardownReport::already_destroyed_report();
            }
            let previous = std::mem::replace(&mut state.phase, Phase::Destroyed);
            (
                previous,
                state.subscription.take(),
                std::mem::take(&mut state.connection),
            )
        };

        let mut report = TeardownReport {
            previous: Some(previous),
            released_subscription: subscription.is_some(),
            released_connection: connection.is_bound(),
            ..TeardownReport::default()
        };

        if let Err(fault) = self.release_subscription(subscription) {
            report.faults.push(fault);
        }
        if let Err(e) = self.connector.disconnect(&mut connection) {
            report.faults.push(TeardownFault::Disconnect(e));
        }

        report.cleared_observers = self.registry.clear();
        self.channel.release_owner(self.owner);

        for fault in &report.faults {
            tracing::warn!("Host surface {} teardown: {}", self.owner, fault);
        }
        tracing::debug!(
            "Host surface {} destroyed (was {:?}, {} observers cleared)",
            self.owner,
            report.previous,
            report.cleared_observers
        );
        report
    }

    /// Register an observer
    ///
    /// Returns `Ok(false)` for an absent handle or one already registered.
    /// Registering the surface itself, or its own hooks, is a programming
    /// error and fails with [`SurfaceError::InvalidOperation`].
    pub fn add_observer(&self, handle: impl Into<ObserverHandle>) -> Result<bool> {
        let handle = handle.into();
        if self.phase() == Phase::Destroyed {
            return Err(SurfaceError::Destroyed);
        }
        if self.is_own_handle(&handle) {
            return Err(SurfaceError::InvalidOperation(format!(
                "host surface {} cannot observe itself",
                self.owner
            )));
        }
        if handle.is_absent() {
            tracing::trace!("Ignoring absent observer for {}", self.owner);
            return Ok(false);
        }
        Ok(self.registry.add(handle))
    }

    /// Unregister an observer; unknown handles are ignored
    pub fn remove_observer(&self, handle: impl Into<ObserverHandle>) -> bool {
        self.registry.remove(&handle.into())
    }

    pub fn observer_count(&self) -> usize {
        self.registry.len()
    }

    /// React to one event
    ///
    /// Notifications fan out to the hooks and then every registered observer;
    /// a track error shows one message through the sink.
    pub fn dispatch(&self, event: &PlaybackEvent) -> Result<()> {
        if !self.channel.liveness().is_alive(self.owner) || self.phase() == Phase::Destroyed {
            return Err(SurfaceError::Destroyed);
        }

        tracing::trace!("Host surface {} dispatching {}", self.owner, event);
        match Route::for_event(event) {
            Route::Notify(notification) => {
                self.fan_out(notification);
            }
            Route::PlayState => {
                tracing::trace!("Play state change has no reaction on {}", self.owner);
            }
            Route::TrackError(track_name) => {
                self.sink.show_message(&self.template.render(track_name));
            }
        }
        Ok(())
    }

    /// Apply connection signals, then drain queued events
    ///
    /// Events are taken one at a time and no lock is held while they are
    /// dispatched, so a callback that stops the surface prevents any further
    /// delivery from this call. Returns the number of events dispatched.
    pub fn process_pending(&self) -> Result<usize> {
        let signals = {
            let mut state = self.state.lock();
            if state.phase == Phase::Destroyed {
                return Err(SurfaceError::Destroyed);
            }
            state.connection.poll_signals()
        };

        for signal in signals {
            if matches!(signal, ConnectionSignal::Connected(_)) {
                self.on_meta_changed();
            }
        }

        let mut dispatched = 0;
        loop {
            let envelope = {
                let state = self.state.lock();
                state.subscription.as_ref().and_then(Subscription::try_next)
            };
            let Some(envelope) = envelope else {
                break;
            };
            if self.dispatch(&envelope.event).is_err() {
                break;
            }
            dispatched += 1;
        }
        Ok(dispatched)
    }

    /// A weakly-held delivery target for this surface
    pub fn receiver(&self) -> StatusReceiver {
        StatusReceiver::new(
            self.owner,
            self.this.clone(),
            self.channel.liveness().clone(),
        )
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Whether a service binding is held
    pub fn is_bound(&self) -> bool {
        self.state.lock().connection.is_bound()
    }

    /// Whether the service has reported itself connected
    pub fn is_connected(&self) -> bool {
        self.state.lock().connection.is_connected()
    }

    /// The live service, if connected
    pub fn service(&self) -> Option<ServiceHandle> {
        self.state.lock().connection.service().cloned()
    }

    pub fn connection_token(&self) -> Option<TokenId> {
        self.state.lock().connection.token()
    }

    /// Whether the surface is listening and its subscription is still active
    pub fn is_subscribed(&self) -> bool {
        let state = self.state.lock();
        state.phase.is_listening()
            && state
                .subscription
                .as_ref()
                .is_some_and(Subscription::is_active)
    }

    fn check_startable(phase: Phase) -> Result<()> {
        if phase.is_listening() {
            return Err(SurfaceError::InvalidTransition {
                from: phase,
                to: Phase::Started,
            });
        }
        phase.check_transition(Phase::Started)
    }

    /// Request a service binding if none is held
    ///
    /// The connection is taken out of the state while the binder runs. A
    /// binding that fails is logged and left absent.
    fn ensure_binding(&self) {
        let mut connection = {
            let mut state = self.state.lock();
            if state.phase == Phase::Destroyed || state.connection.is_bound() {
                return;
            }
            std::mem::take(&mut state.connection)
        };

        match self.connector.connect(&mut connection) {
            Ok(token) => tracing::debug!("Host surface {} bound with {}", self.owner, token),
            Err(e) => tracing::warn!("Host surface {} could not bind: {}", self.owner, e),
        }

        let mut state = self.state.lock();
        if state.phase != Phase::Destroyed {
            state.connection = connection;
            return;
        }
        drop(state);
        if let Err(e) = self.connector.disconnect(&mut connection) {
            tracing::warn!("Host surface {} teardown: {}", self.owner, e);
        }
    }

    fn release_subscription(
        &self,
        subscription: Option<Subscription>,
    ) -> std::result::Result<(), TeardownFault> {
        let Some(subscription) = subscription else {
            return Ok(());
        };
        self.channel
            .unsubscribe(&subscription)
            .map(|_| ())
            .map_err(TeardownFault::Unsubscribe)
    }

    fn is_own_handle(&self, handle: &ObserverHandle) -> bool {
        let this: Weak<dyn PlaybackObserver> = self.this.clone();
        if handle.same_as(&ObserverHandle::from_weak(this)) {
            return true;
        }
        self.hooks.as_ref().is_some_and(|hooks| {
            handle.same_as(&ObserverHandle::from_weak(Arc::downgrade(hooks)))
        })
    }

    fn fan_out(&self, notification: Notification) -> FanOut {
        if let Some(hooks) = &self.hooks {
            notification.deliver(hooks.as_ref());
        }
        let fan_out = self.registry.notify_all(notification);
        tracing::trace!(
            "Host surface {} fanned out {:?}: {:?}",
            self.owner,
            notification,
            fan_out
        );
        fan_out
    }
}

impl PlaybackObserver for HostSurface {
    fn on_meta_changed(&self) {
        self.fan_out(Notification::MetaChanged);
    }

    fn on_list_refresh_needed(&self) {
        self.fan_out(Notification::ListRefreshNeeded);
    }

    fn on_playlist_changed(&self) {
        self.fan_out(Notification::PlaylistChanged);
    }
}

impl Drop for HostSurface {
    fn drop(&mut self) {
        if self.state.get_mut().phase != Phase::Destroyed {
            let report = self.destroy();
            tracing::debug!(
                "Host surface {} destroyed on drop ({} faults)",
                self.owner,
                report.faults.len()
            );
        }
    }
}

impl std::fmt::Debug for HostSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSurface")
            .field("owner", &self.owner)
            .field("phase", &self.phase())
            .field("observers", &self.registry.len())
            .finish()
    }
}
