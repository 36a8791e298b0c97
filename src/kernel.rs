//! The execution substrate: the lock-free queue primitive, per-actor
//! mailboxes built on it, the worker-pool scheduler, and the process-wide
//! actor registry.

pub(crate) mod mailbox;
pub(crate) mod queue;
pub(crate) mod registry;
pub(crate) mod scheduler;

pub use mailbox::{Mailbox, SchedulingState};
pub use queue::Queue;
pub use registry::Registry;
pub use scheduler::Scheduler;
