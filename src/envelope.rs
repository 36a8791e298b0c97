use std::fmt::Debug;

use uuid::Uuid;

use crate::actor::handle::ActorRef;

/// Marker trait for anything that can travel through a mailbox.
///
/// Blanket-implemented for any type that is debug-printable, clonable and
/// sendable across threads with a `'static` lifetime — the same contract
/// `riker` uses for its own `Message` trait.
pub trait Message: Debug + Clone + Send + 'static {}
impl<T: Debug + Clone + Send + 'static> Message for T {}

/// Identifies a request/response pair across an asynchronous round trip.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        CorrelationId(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

/// A message in flight: payload plus provenance.
///
/// Envelopes are immutable once constructed and own their payload outright;
/// the mailbox queue node wraps one per slot.
#[derive(Clone, Debug)]
pub struct Envelope<M: Message> {
    pub msg: M,
    pub sender: Option<ActorRef<M>>,
    pub correlation_id: Option<CorrelationId>,
}

impl<M: Message> Envelope<M> {
    pub fn new(msg: M, sender: Option<ActorRef<M>>) -> Self {
        Envelope {
            msg,
            sender,
            correlation_id: None,
        }
    }

    pub fn with_correlation(msg: M, sender: Option<ActorRef<M>>, correlation_id: CorrelationId) -> Self {
        Envelope {
            msg,
            sender,
            correlation_id: Some(correlation_id),
        }
    }
}
