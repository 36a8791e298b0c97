use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Opaque, process-unique actor identity. Never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ActorId(u32);

impl ActorId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        ActorId(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source, one per runtime.
pub(crate) struct IdGenerator {
    next: AtomicU32,
}

impl IdGenerator {
    pub(crate) fn new() -> Self {
        IdGenerator {
            next: AtomicU32::new(1),
        }
    }

    pub(crate) fn next_id(&self) -> ActorId {
        ActorId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// The terminal status of an actor, sunset here rather than trapped.
///
/// `Normal` and `Unhandled` are produced locally; `LinkedDown` wraps a
/// peer's reason when it propagates across a link; `UserDefined` carries an
/// application-chosen code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitReason {
    Normal,
    Unhandled,
    LinkedDown(Box<ExitReason>),
    UserDefined(u32),
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Normal => write!(f, "normal"),
            ExitReason::Unhandled => write!(f, "unhandled"),
            ExitReason::LinkedDown(inner) => write!(f, "linked down ({})", inner),
            ExitReason::UserDefined(code) => write!(f, "user defined ({})", code),
        }
    }
}

/// Out-of-band notifications delivered ahead of ordinary user messages.
///
/// These are what a link or an attachment turns into on the wire; the
/// receive engine dispatches them through the exit-trap path before it ever
/// looks at the handler (spec §4.3, §4.4).
#[derive(Clone, Debug)]
pub enum SystemMsg {
    LinkedDown { from: ActorId, reason: ExitReason },
}
