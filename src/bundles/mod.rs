//! Per-timestep change bundles and the delivery order over them.
//!
//! - [`Bundle`]: every changed field, across all entities, for one timestep
//! - [`BundleStore`]: timestep -> bundle, merge-on-insert, last write wins
//! - [`DeliveryQueue`]: ordered, deduplicated timesteps ready to send
//!
//! Neither the store nor the queue synchronizes on its own. They are
//! always mutated together under the [`Session`](crate::session::Session)
//! lock, so a merge and the admit that follows it are one atomic step.

mod bundle;
mod queue;
mod store;

pub use bundle::{Bundle, EntityFields};
pub use queue::{DeliveryQueue, QueueEntry};
pub use store::{BundleStore, MergeOutcome};
