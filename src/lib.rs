//! A lightweight actor-model concurrency runtime: per-actor mailboxes over
//! a lock-free queue, a cooperative worker-pool scheduler, links and exit
//! propagation, and a small receive engine with stash replay and timed
//! receive.

pub mod actor;
pub mod config;
pub mod envelope;
pub mod error;
pub(crate) mod kernel;
pub mod receive;
pub mod system;

pub use envelope::{CorrelationId, Envelope, Message};
pub use error::{RegistryLookupError, SendError};
pub use receive::{handler_fn, splice, Context, Handler};
pub use system::{current_actor, ActorSystem, Behavior, SpawnOptions};

/// Commonly bundled re-exports, the way `riker::actors` collects its own
/// public surface into one `use` path.
pub mod actors {
    pub use crate::actor::{ActorId, ActorRef, ExitReason, SystemMsg};
    pub use crate::config::RuntimeConfig;
    pub use crate::envelope::{CorrelationId, Envelope, Message};
    pub use crate::error::{RegistryLookupError, SendError};
    pub use crate::receive::{handler_fn, splice, Context, Handler};
    pub use crate::system::{current_actor, ActorSystem, Behavior, SpawnOptions};
}
