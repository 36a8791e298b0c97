use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::actor::cell::{run_exit, ActorCell};
use crate::actor::id::ActorId;
use crate::actor::id::ExitReason;
use crate::actor::links::ExitCallback;
use crate::envelope::{CorrelationId, Envelope, Message};
use crate::error::SendError;

/// A clonable, refcounted handle to an actor. All external interaction —
/// sending, linking, attaching, forcing an exit — goes through this type;
/// there is no separate typed/untyped reference split, since this runtime
/// is generic over one process-wide message type (spec §3).
pub struct ActorRef<M: Message> {
    cell: Arc<ActorCell<M>>,
}

impl<M: Message> ActorRef<M> {
    pub(crate) fn from_cell(cell: Arc<ActorCell<M>>) -> Self {
        ActorRef { cell }
    }

    pub(crate) fn cell(&self) -> &Arc<ActorCell<M>> {
        &self.cell
    }

    pub fn id(&self) -> ActorId {
        self.cell.id()
    }

    pub fn is_exited(&self) -> bool {
        self.cell.is_exited()
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.cell.exit_reason()
    }

    pub fn downgrade(&self) -> Weak<ActorCell<M>> {
        Arc::downgrade(&self.cell)
    }

    pub fn send(&self, sender: Option<ActorRef<M>>, msg: M) -> Result<(), SendError<M>> {
        self.send_envelope(Envelope::new(msg, sender))
    }

    pub fn send_with_correlation(
        &self,
        sender: Option<ActorRef<M>>,
        correlation_id: CorrelationId,
        msg: M,
    ) -> Result<(), SendError<M>> {
        self.send_envelope(Envelope::with_correlation(msg, sender, correlation_id))
    }

    fn send_envelope(&self, envelope: Envelope<M>) -> Result<(), SendError<M>> {
        if self.cell.is_exited() {
            self.cell.system().registry().route_dead_letter(self.cell.id(), envelope.msg.clone());
            return Err(SendError {
                envelope,
                target: self.cell.id(),
            });
        }
        let woke = self.cell.mailbox().enqueue(envelope);
        if woke && !self.cell.detached() {
            self.cell.system().scheduler().schedule(self.cell.clone());
        }
        Ok(())
    }

    /// Links `self` and `other` symmetrically. If `other` has already
    /// exited, synthesizes the down-notification to `self` immediately
    /// instead of silently dropping the link (spec §4.5).
    pub fn link(&self, other: &ActorRef<M>) {
        if other.cell.is_exited() {
            let reason = other.cell.exit_reason().unwrap_or(ExitReason::Normal);
            self.cell.mailbox().enqueue_system(crate::actor::id::SystemMsg::LinkedDown {
                from: other.id(),
                reason,
            });
            if !self.cell.detached() {
                self.cell.system().scheduler().schedule(self.cell.clone());
            }
            return;
        }
        self.cell.links().add(other.id());
        other.cell.links().add(self.id());
        slog::debug!(self.cell.system().log(), "link established"; "a" => self.id().to_string(), "b" => other.id().to_string());
    }

    pub fn unlink(&self, other: &ActorRef<M>) {
        self.cell.links().remove(other.id());
        other.cell.links().remove(self.id());
        slog::debug!(self.cell.system().log(), "link removed"; "a" => self.id().to_string(), "b" => other.id().to_string());
    }

    pub fn attach(&self, cb: ExitCallback) {
        if self.cell.is_exited() {
            cb(self.cell.exit_reason().unwrap_or(ExitReason::Normal));
            return;
        }
        self.cell.attachments().attach(cb);
    }

    pub fn detach(&self) {
        self.cell.attachments().detach_first();
    }

    /// Forces this actor to exit with `reason`, as an external caller
    /// (as opposed to the actor calling `Context::quit` on itself).
    pub fn exit(&self, reason: ExitReason) {
        run_exit(&self.cell, reason);
    }
}

impl<M: Message> Clone for ActorRef<M> {
    fn clone(&self) -> Self {
        ActorRef { cell: self.cell.clone() }
    }
}

impl<M: Message> PartialEq for ActorRef<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
impl<M: Message> Eq for ActorRef<M> {}

impl<M: Message> Hash for ActorRef<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<M: Message> fmt::Debug for ActorRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorRef({})", self.id())
    }
}

impl<M: Message> fmt::Display for ActorRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
