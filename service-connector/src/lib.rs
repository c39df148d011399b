//! # Service Connector
//!
//! Owns the lifecycle of a binding to the background playback service.
//!
//! ## Overview
//!
//! The playback service lives behind a [`ServiceBinder`], a black box that is
//! asked to bind and unbind and reports back asynchronously through a
//! [`ConnectionLink`]. Each owner keeps its own [`ServiceConnection`] instead
//! of sharing a process-wide "current service" slot, and the
//! [`ServiceConnector`] threads that state through `connect`/`disconnect`.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use service_connector::{ConnectionSignal, LocalBinder, ServiceConnection, ServiceConnector, ServiceHandle};
//!
//! let binder = Arc::new(LocalBinder::new(ServiceHandle::new("player")));
//! let connector = ServiceConnector::new(binder);
//!
//! let mut connection = ServiceConnection::new();
//! connector.connect(&mut connection).unwrap();
//!
//! // Signals are applied on the owner's own thread
//! let signals = connection.poll_signals();
//! assert!(matches!(signals[0], ConnectionSignal::Connected(_)));
//! assert!(connection.is_connected());
//!
//! connector.disconnect(&mut connection).unwrap();
//! assert!(!connection.is_bound());
//! ```
//!
//! Connection failure has no error channel of its own: a binder that never
//! reports `Connected` simply leaves the connection pending.

pub mod binder;
pub mod connection;
pub mod connector;
pub mod error;

pub use binder::{ConnectionLink, ConnectionSignal, LocalBinder, ServiceBinder};
pub use connection::{ConnectionToken, ServiceConnection, ServiceHandle, TokenId};
pub use connector::ServiceConnector;
pub use error::{ConnectorError, Result};
