use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::actor::id::{ActorId, ExitReason, SystemMsg};
use crate::actor::links::{AttachmentList, LinkSet};
use crate::envelope::{Envelope, Message};
use crate::kernel::mailbox::Mailbox;
use crate::receive::Handler;
use crate::system::ActorSystem;

/// Everything one actor needs to exist: identity, mailbox, link/attachment
/// sets, exit status, and a pointer back to the system that owns its
/// scheduler and registry.
///
/// Registry entries hold only a `Weak` reference to the cell (see
/// `kernel::registry`); an `ActorRef` is what upgrades that into something
/// you can send through.
pub struct ActorCell<M: Message> {
    id: ActorId,
    mailbox: Mailbox<M>,
    links: LinkSet,
    attachments: AttachmentList<M>,
    exit_reason: Mutex<Option<ExitReason>>,
    trap_exit: AtomicBool,
    detached: bool,
    stash: Mutex<std::collections::VecDeque<Envelope<M>>>,
    behavior: Mutex<Box<dyn Handler<M>>>,
    pending_behavior: Mutex<Option<Box<dyn Handler<M>>>>,
    system: ActorSystem<M>,
}

impl<M: Message> ActorCell<M> {
    pub(crate) fn new(
        id: ActorId,
        system: ActorSystem<M>,
        detached: bool,
        trap_exit: bool,
        msg_process_limit: u32,
        behavior: Box<dyn Handler<M>>,
    ) -> Arc<Self> {
        let mailbox_log = system.log().new(slog::o!("component" => "mailbox", "actor" => id.to_string()));
        Arc::new(ActorCell {
            id,
            mailbox: Mailbox::new(msg_process_limit, mailbox_log),
            links: LinkSet::new(),
            attachments: AttachmentList::new(),
            exit_reason: Mutex::new(None),
            trap_exit: AtomicBool::new(trap_exit),
            detached,
            stash: Mutex::new(std::collections::VecDeque::new()),
            behavior: Mutex::new(behavior),
            pending_behavior: Mutex::new(None),
            system,
        })
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn mailbox(&self) -> &Mailbox<M> {
        &self.mailbox
    }

    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    pub fn attachments(&self) -> &AttachmentList<M> {
        &self.attachments
    }

    pub fn system(&self) -> &ActorSystem<M> {
        &self.system
    }

    pub fn detached(&self) -> bool {
        self.detached
    }

    pub fn trap_exit(&self) -> bool {
        self.trap_exit.load(Ordering::Acquire)
    }

    pub fn set_trap_exit(&self, trap: bool) {
        self.trap_exit.store(trap, Ordering::Release);
    }

    pub fn is_exited(&self) -> bool {
        self.exit_reason.lock().unwrap().is_some()
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit_reason.lock().unwrap().clone()
    }

    pub(crate) fn behavior(&self) -> &Mutex<Box<dyn Handler<M>>> {
        &self.behavior
    }

    /// Queues a replacement behavior to take effect before the next
    /// message is dispatched. Kept separate from `behavior` itself so that
    /// a handler calling `Context::become_behavior` from inside
    /// `try_handle` never has to re-lock the mutex it is already being
    /// called through.
    pub(crate) fn set_pending_behavior(&self, handler: Box<dyn Handler<M>>) {
        *self.pending_behavior.lock().unwrap() = Some(handler);
    }

    pub(crate) fn apply_pending_behavior(&self) {
        if let Some(handler) = self.pending_behavior.lock().unwrap().take() {
            *self.behavior.lock().unwrap() = handler;
        }
    }

    pub(crate) fn push_stash(&self, envelope: Envelope<M>) {
        self.stash.lock().unwrap().push_back(envelope);
    }

    pub(crate) fn pop_stash(&self) -> Option<Envelope<M>> {
        self.stash.lock().unwrap().pop_front()
    }

    pub(crate) fn requeue_stash_front(&self, envelope: Envelope<M>) {
        self.stash.lock().unwrap().push_front(envelope);
    }

    /// One-shot write of the exit reason. Returns `true` exactly once, for
    /// the caller that won the race (spec invariant 3). Implemented with a
    /// mutex rather than a literal CAS on an atomic enum, which gives the
    /// same exactly-once guarantee with none of the encoding overhead of
    /// packing `ExitReason` into an integer.
    pub(crate) fn try_set_exit_reason(&self, reason: ExitReason) -> bool {
        let mut guard = self.exit_reason.lock().unwrap();
        if guard.is_some() {
            return false;
        }
        *guard = Some(reason);
        true
    }
}

/// Runs the full exit procedure for `cell` with `reason`, unless another
/// caller already won the race to exit it (spec §4.4). Notifies every
/// attachment and every linked peer exactly once, then clears the
/// registry's strong path to the actor while keeping the reason around for
/// late lookups.
pub(crate) fn run_exit<M: Message>(cell: &Arc<ActorCell<M>>, reason: ExitReason) {
    if !cell.try_set_exit_reason(reason.clone()) {
        return;
    }
    cell.mailbox.mark_done();

    for cb in cell.attachments.drain() {
        cb(reason.clone());
    }

    for peer in cell.links.drain() {
        cell.system.registry().notify_system(
            peer,
            SystemMsg::LinkedDown {
                from: cell.id,
                reason: reason.clone(),
            },
        );
    }

    cell.system.registry().clear_ref(cell.id, reason);
    cell.system.registry().dec_running();
}
