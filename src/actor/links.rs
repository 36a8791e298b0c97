use std::marker::PhantomData;
use std::sync::Mutex;

use crate::actor::id::ActorId;
use crate::envelope::Message;

/// A one-shot callback invoked exactly once, when the owning actor exits.
pub type ExitCallback = Box<dyn FnOnce(crate::actor::id::ExitReason) + Send + 'static>;

/// Bidirectional link registry for one actor.
///
/// Guarded by a plain mutex; per spec §4.5 the lock is dropped before any
/// exit callback runs, so user code invoked during notification can freely
/// call back into this or another actor's link/attach methods without
/// deadlocking.
pub struct LinkSet {
    peers: Mutex<Vec<ActorId>>,
}

impl LinkSet {
    pub fn new() -> Self {
        LinkSet { peers: Mutex::new(Vec::new()) }
    }

    pub fn add(&self, id: ActorId) {
        let mut peers = self.peers.lock().unwrap();
        if !peers.contains(&id) {
            peers.push(id);
        }
    }

    pub fn remove(&self, id: ActorId) {
        let mut peers = self.peers.lock().unwrap();
        peers.retain(|p| *p != id);
    }

    /// Drains the link set under the lock and hands the snapshot to the
    /// caller, which runs notification logic after the lock is released.
    pub fn drain(&self) -> Vec<ActorId> {
        let mut peers = self.peers.lock().unwrap();
        std::mem::take(&mut *peers)
    }
}

/// One-shot exit callbacks registered via `attach`.
pub struct AttachmentList<M: Message> {
    callbacks: Mutex<Vec<ExitCallback>>,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> AttachmentList<M> {
    pub fn new() -> Self {
        AttachmentList { callbacks: Mutex::new(Vec::new()), _marker: PhantomData }
    }

    pub fn attach(&self, cb: ExitCallback) {
        self.callbacks.lock().unwrap().push(cb);
    }

    /// Removes the first registered callback, mirroring `detach`'s
    /// "remove the first match" contract from spec §4.5. Attachments carry
    /// no comparable identity beyond registration order in this
    /// implementation, so detach-by-token is approximated as detach-oldest.
    pub fn detach_first(&self) {
        let mut callbacks = self.callbacks.lock().unwrap();
        if !callbacks.is_empty() {
            callbacks.remove(0);
        }
    }

    pub fn drain(&self) -> Vec<ExitCallback> {
        let mut callbacks = self.callbacks.lock().unwrap();
        std::mem::take(&mut *callbacks)
    }
}
