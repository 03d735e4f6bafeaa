//! # Tick Relay
//!
//! Batches field-level changes of tracked entities by simulation tick and
//! delivers them, in order and at a bounded rate, over a streaming
//! connection that may come and go.
//!
//! ## Core Concepts
//!
//! - **Change records**: one field of one entity changed at one tick
//! - **Bundles**: every change for a tick, last write wins per field
//! - **Delivery queue**: bundles ready to send; re-touched ticks move to the tail
//! - **Dispatcher**: sends a few bundles per tick, cools down and retries
//!   when the connection is down, disables itself on poisoned bundles
//! - **Backlog monitor**: periodic operator warnings while the queue grows
//!
//! ## Example
//!
//! ```ignore
//! use tickrelay::{ChangeRecord, Dispatcher, FieldKey, PipelineConfig, Session, Timestep};
//!
//! let config = PipelineConfig::default();
//! let (session, notices) = Session::new(config.clone())?;
//! let mut dispatcher = Dispatcher::new(&config);
//!
//! // Ingestion side, from any thread
//! session.ingest(ChangeRecord::new("alex", 5, FieldKey::Health, Some(20.into()), 18));
//!
//! // Scheduler side, once per tick
//! dispatcher.tick(&session, &mut transport, Timestep(5));
//! for notice in notices.drain() {
//!     println!("{}", notice.message);
//! }
//! ```

pub mod backlog;
pub mod bundles;
pub mod config;
pub mod dispatcher;
pub mod encoder;
pub mod error;
pub mod fields;
pub mod notices;
pub mod session;
pub mod tracker;
pub mod transport;
pub mod types;

// Re-exports
pub use backlog::BacklogMonitor;
pub use bundles::{Bundle, BundleStore, DeliveryQueue, EntityFields, MergeOutcome, QueueEntry};
pub use config::{PipelineConfig, ReportConfig};
pub use dispatcher::{DispatchState, Dispatcher, TickOutcome};
pub use encoder::{encode, encode_with};
pub use error::{EncodeError, Result, TelemetryError, TransportError};
pub use fields::{FieldGroup, FieldKey, UnknownFieldKey};
pub use notices::{Notice, NoticeHandle, NoticeLevel, NoticeSink};
pub use session::{Session, SessionStats};
pub use tracker::{EntityTracker, TrackerRegistry};
pub use transport::{MemoryTransport, Transport};
pub use types::*;
