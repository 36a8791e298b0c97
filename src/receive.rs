use std::any::Any;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::actor::cell::{run_exit, ActorCell};
use crate::actor::handle::ActorRef;
use crate::actor::id::{ExitReason, SystemMsg};
use crate::envelope::Envelope;
use crate::envelope::Message;
use crate::kernel::mailbox::{BlockResult, Fetched};
use crate::system::ActorSystem;

/// The pattern-matcher contract the receive engine drives. A real
/// application typically builds one of these with an external
/// pattern-matching DSL; this crate only needs the contract, plus a
/// minimal closure-based implementation (`handler_fn`) so it is usable on
/// its own.
pub trait Handler<M: Message>: Send {
    /// Attempts to match and consume `envelope`. Returns `true` if it
    /// consumed the message (ran its action), `false` if it declined —
    /// in which case the engine stashes the message and keeps looking.
    fn try_handle(&mut self, ctx: &Context<M>, envelope: &Envelope<M>) -> bool;

    /// Handles a trapped exit notification delivered as a result of
    /// `trap_exit` being enabled. The default declines, which causes the
    /// notification to be silently dropped rather than stashed — system
    /// messages have no `M` representation to stash as (spec §4.4's
    /// trap-exit mode is the one place this crate's minimal handler can't
    /// fully match the external pattern-matching DSL's generality).
    fn try_handle_system(&mut self, _ctx: &Context<M>, _sys: &SystemMsg) -> bool {
        false
    }
}

struct FnHandler<M, F> {
    f: F,
    _m: PhantomData<M>,
}

impl<M, F> Handler<M> for FnHandler<M, F>
where
    M: Message,
    F: FnMut(&Context<M>, &Envelope<M>) -> bool + Send,
{
    fn try_handle(&mut self, ctx: &Context<M>, envelope: &Envelope<M>) -> bool {
        (self.f)(ctx, envelope)
    }
}

/// Builds a `Handler` out of a plain closure.
pub fn handler_fn<M, F>(f: F) -> Box<dyn Handler<M>>
where
    M: Message,
    F: FnMut(&Context<M>, &Envelope<M>) -> bool + Send + 'static,
{
    Box::new(FnHandler { f, _m: PhantomData })
}

/// Combines two handlers, trying `first` before falling through to
/// `second`. Mirrors the `splice` operation of the external pattern-set
/// contract (spec §6).
pub fn splice<M: Message>(first: Box<dyn Handler<M>>, second: Box<dyn Handler<M>>) -> Box<dyn Handler<M>> {
    Box::new(Spliced {
        parts: vec![first, second],
    })
}

struct Spliced<M: Message> {
    parts: Vec<Box<dyn Handler<M>>>,
}

impl<M: Message> Handler<M> for Spliced<M> {
    fn try_handle(&mut self, ctx: &Context<M>, envelope: &Envelope<M>) -> bool {
        self.parts.iter_mut().any(|h| h.try_handle(ctx, envelope))
    }

    fn try_handle_system(&mut self, ctx: &Context<M>, sys: &SystemMsg) -> bool {
        self.parts.iter_mut().any(|h| h.try_handle_system(ctx, sys))
    }
}

/// Handed to every `Handler` invocation and to a thread-backed actor's
/// body. Carries everything `self()`/`quit()`/`become` need.
pub struct Context<M: Message> {
    cell: Arc<ActorCell<M>>,
}

impl<M: Message> Context<M> {
    pub(crate) fn new(cell: Arc<ActorCell<M>>) -> Self {
        Context { cell }
    }

    pub fn myself(&self) -> ActorRef<M> {
        ActorRef::from_cell(self.cell.clone())
    }

    pub fn system(&self) -> &ActorSystem<M> {
        self.cell.system()
    }

    /// Ends the current actor's life with `reason`. Idempotent: calling it
    /// twice (or racing with an external `ActorRef::exit`) only the first
    /// caller runs the notification path (spec §4.4).
    pub fn quit(&self, reason: ExitReason) {
        run_exit(&self.cell, reason);
    }

    /// Replaces the actor's current behavior. Only meaningful for
    /// event-based actors; a thread-backed actor's control flow is its own
    /// function body instead.
    pub fn become_behavior(&self, handler: Box<dyn Handler<M>>) {
        self.cell.set_pending_behavior(handler);
    }

    /// Blocking receive for a thread-backed actor's body. Replays the
    /// stash first, then pulls from the mailbox until something matches.
    /// Unwinds with a private marker (caught by the thread wrapper, not by
    /// user code) if the actor has exited in the meantime.
    pub fn receive(&self, handler: &mut dyn Handler<M>) {
        self.receive_inner(handler, None, |_| {});
    }

    pub fn receive_with_timeout(&self, handler: &mut dyn Handler<M>, timeout: Duration, on_timeout: impl FnOnce(&Context<M>)) {
        let deadline = Instant::now() + timeout;
        self.receive_inner(handler, Some(deadline), on_timeout);
    }

    pub fn receive_while(&self, mut pred: impl FnMut() -> bool, handler: &mut dyn Handler<M>) {
        while pred() {
            self.receive(handler);
        }
    }

    pub fn do_receive<'a>(&'a self, handler: &'a mut dyn Handler<M>) -> DoReceive<'a, M> {
        DoReceive { ctx: self, handler }
    }

    fn receive_inner(&self, handler: &mut dyn Handler<M>, deadline: Option<Instant>, on_timeout: impl FnOnce(&Context<M>)) {
        loop {
            if self.cell.is_exited() {
                panic_exited();
            }
            if let Some(env) = self.cell.pop_stash() {
                if handler.try_handle(self, &env) {
                    return;
                }
                self.cell.push_stash(env);
            }
            match drive_one_blocking(&self.cell, self, handler, deadline) {
                DriveResult::Matched => return,
                DriveResult::Exited => panic_exited(),
                DriveResult::TimedOut => {
                    on_timeout(self);
                    return;
                }
            }
        }
    }
}

/// `do_receive(handler).until(pred)`: a do-while loop, always running the
/// body at least once (spec §4.3, grounded in the C++ original's
/// `do_receive_helper`).
pub struct DoReceive<'a, M: Message> {
    ctx: &'a Context<M>,
    handler: &'a mut dyn Handler<M>,
}

impl<'a, M: Message> DoReceive<'a, M> {
    pub fn until(self, mut pred: impl FnMut() -> bool) {
        loop {
            self.ctx.receive_inner(self.handler, None, |_| {});
            if !pred() {
                break;
            }
        }
    }
}

struct ActorExited;

fn panic_exited() -> ! {
    std::panic::panic_any(ActorExited)
}

enum DriveResult {
    Matched,
    Exited,
    TimedOut,
}

/// Pulls exactly one message (system messages take priority) and tries to
/// match it, blocking the calling OS thread if nothing is available yet.
/// Shared by thread-backed `Context::receive*` and, via `drive_one_nonblocking`,
/// by the scheduler's cooperative `resume`.
fn drive_one_blocking<M: Message>(
    cell: &Arc<ActorCell<M>>,
    ctx: &Context<M>,
    handler: &mut dyn Handler<M>,
    deadline: Option<Instant>,
) -> DriveResult {
    loop {
        if let Some(sys) = cell.mailbox().try_fetch_system() {
            if handle_system(cell, ctx, handler, sys) {
                return DriveResult::Exited;
            }
            continue;
        }
        match cell.mailbox().await_message(deadline) {
            Fetched::Message(env) => {
                if handler.try_handle(ctx, &env) {
                    return DriveResult::Matched;
                }
                cell.push_stash(env);
            }
            Fetched::Timeout => return DriveResult::TimedOut,
        }
    }
}

/// Returns `true` if the actor exited as a result of handling `sys`.
fn handle_system<M: Message>(cell: &Arc<ActorCell<M>>, ctx: &Context<M>, handler: &mut dyn Handler<M>, sys: SystemMsg) -> bool {
    if cell.trap_exit() {
        handler.try_handle_system(ctx, &sys);
        return false;
    }
    match sys {
        SystemMsg::LinkedDown { reason, .. } => {
            run_exit(cell, ExitReason::LinkedDown(Box::new(reason)));
            true
        }
    }
}

/// Outcome of one non-blocking scheduling step, used by the scheduler's
/// cooperative `resume` loop (spec §4.6).
pub(crate) enum StepResult {
    Matched,
    Exited,
    WouldBlock,
}

pub(crate) fn step_nonblocking<M: Message>(cell: &Arc<ActorCell<M>>) -> StepResult {
    let ctx = Context::new(cell.clone());

    if let Some(sys) = cell.mailbox().try_fetch_system() {
        let outcome = {
            let mut behavior = cell.behavior().lock().unwrap();
            catch_unwind(AssertUnwindSafe(|| handle_system(cell, &ctx, &mut **behavior, sys)))
        };
        let exited = match outcome {
            Ok(exited) => exited,
            Err(payload) => return exit_on_panic(cell, payload),
        };
        cell.apply_pending_behavior();
        return if exited { StepResult::Exited } else { StepResult::Matched };
    }

    if let Some(env) = cell.pop_stash() {
        let outcome = {
            let mut behavior = cell.behavior().lock().unwrap();
            catch_unwind(AssertUnwindSafe(|| behavior.try_handle(&ctx, &env)))
        };
        let matched = match outcome {
            Ok(matched) => matched,
            Err(payload) => return exit_on_panic(cell, payload),
        };
        cell.apply_pending_behavior();
        if matched {
            return StepResult::Matched;
        }
        cell.requeue_stash_front(env);
    }

    match cell.mailbox().try_fetch() {
        Some(env) => {
            let outcome = {
                let mut behavior = cell.behavior().lock().unwrap();
                catch_unwind(AssertUnwindSafe(|| behavior.try_handle(&ctx, &env)))
            };
            let matched = match outcome {
                Ok(matched) => matched,
                Err(payload) => return exit_on_panic(cell, payload),
            };
            if !matched {
                cell.push_stash(env);
            }
            cell.apply_pending_behavior();
            StepResult::Matched
        }
        None => StepResult::WouldBlock,
    }
}

/// Logs and force-exits an actor whose handler panicked instead of letting
/// the unwind cross into the scheduler worker's own stack, mirroring
/// `riker::kernel::mailbox::Sentinel`'s panic-to-exit-reason mapping for the
/// pooled dispatch path.
fn exit_on_panic<M: Message>(cell: &Arc<ActorCell<M>>, payload: Box<dyn Any + Send>) -> StepResult {
    if is_actor_exited(&payload) {
        return StepResult::Exited;
    }
    slog::error!(cell.system().log(), "actor handler panicked, exiting"; "actor" => cell.id().to_string());
    run_exit(cell, ExitReason::Unhandled);
    StepResult::Exited
}

/// Drives a detached event-based actor: same persistent `Handler` an
/// on-pool actor would use, but pulled by a dedicated OS thread blocking
/// directly on the mailbox instead of being resumed by a scheduler worker.
pub(crate) fn run_detached_event_loop<M: Message>(cell: Arc<ActorCell<M>>) {
    let ctx = Context::new(cell.clone());
    loop {
        if cell.is_exited() {
            return;
        }
        let outcome = {
            let mut behavior = cell.behavior().lock().unwrap();
            catch_unwind(AssertUnwindSafe(|| drive_one_blocking(&cell, &ctx, &mut **behavior, None)))
        };
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                if is_actor_exited(&payload) {
                    return;
                }
                slog::error!(cell.system().log(), "actor handler panicked, exiting"; "actor" => cell.id().to_string());
                run_exit(&cell, ExitReason::Unhandled);
                return;
            }
        };
        cell.apply_pending_behavior();
        match result {
            DriveResult::Matched => continue,
            DriveResult::Exited => return,
            DriveResult::TimedOut => continue,
        }
    }
}

/// Drives an event-based actor for up to its configured fairness quantum,
/// then either yields it back to the run-queue (more work pending) or lets
/// it go to sleep (spec §4.6 `resume`).
pub(crate) fn resume<M: Message>(cell: Arc<ActorCell<M>>) {
    let quantum = cell.mailbox().msg_process_limit();
    for _ in 0..quantum {
        match step_nonblocking(&cell) {
            StepResult::Matched => continue,
            StepResult::Exited => return,
            StepResult::WouldBlock => match cell.mailbox().try_block() {
                BlockResult::Blocked => return,
                BlockResult::Retry => continue,
            },
        }
    }
    // Quantum exhausted with more potential work still pending: go through
    // the same double-check as an ordinary would-block exit so a
    // concurrent enqueue can never be missed (spec §4.6, invariant 5).
    match cell.mailbox().try_block() {
        BlockResult::Blocked => {}
        BlockResult::Retry => cell.system().scheduler().schedule(cell.clone()),
    }
}

/// Runs a thread-backed actor's body to completion on the calling (already
/// dedicated) OS thread, catching both a clean `quit`/exit-triggered
/// unwind and a genuine panic, mirroring `riker::kernel::mailbox::Sentinel`'s
/// panic-to-exit-reason mapping.
pub(crate) fn run_thread_body<M: Message>(cell: Arc<ActorCell<M>>, body: Box<dyn FnOnce(&Context<M>) + Send>) {
    let ctx = Context::new(cell.clone());
    let result: std::thread::Result<()> = catch_unwind(AssertUnwindSafe(|| body(&ctx)));
    if let Err(payload) = result {
        if !is_actor_exited(&payload) {
            run_exit(&cell, ExitReason::Unhandled);
        }
    }
    if !cell.is_exited() {
        run_exit(&cell, ExitReason::Normal);
    }
}

fn is_actor_exited(payload: &Box<dyn Any + Send>) -> bool {
    payload.downcast_ref::<ActorExited>().is_some()
}
