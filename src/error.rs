use std::error::Error;
use std::fmt;

use crate::actor::id::{ActorId, ExitReason};
use crate::envelope::Envelope;
use crate::envelope::Message;

/// Returned when a send targets an actor that has already exited.
///
/// Carries the envelope back so the caller can route it to a dead-letter
/// sink instead of losing it silently (spec §7).
pub struct SendError<M: Message> {
    pub envelope: Envelope<M>,
    pub target: ActorId,
}

impl<M: Message> fmt::Debug for SendError<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendError").field("target", &self.target).finish()
    }
}

impl<M: Message> fmt::Display for SendError<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor {} has already exited, message dropped", self.target)
    }
}

impl<M: Message> Error for SendError<M> {}

/// Returned by a registry lookup of an id that no longer has a live actor.
pub struct RegistryLookupError {
    pub id: ActorId,
    pub reason: ExitReason,
}

impl fmt::Debug for RegistryLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryLookupError")
            .field("id", &self.id)
            .field("reason", &self.reason)
            .finish()
    }
}

impl fmt::Display for RegistryLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor {} is gone, because {}", self.id, self.reason)
    }
}

impl Error for RegistryLookupError {}
