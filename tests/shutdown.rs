mod support;

use std::time::Duration;

use relay_rt::actors::*;
use riker_testkit::probe::channel::probe;
use riker_testkit::probe::Probe;
use riker_testkit::probe::ProbeReceive;

#[derive(Clone, Debug)]
struct Ping;

/// Shutting down the scheduler joins the worker pool promptly once every
/// queued actor has finished, rather than hanging on a 100ms idle-poll
/// cycle forever (spec §4.6).
#[test]
fn shutdown_returns_promptly_after_work_drains() {
    let sys: ActorSystem<Ping> = support::test_system();

    for _ in 0..50 {
        let actor = sys.spawn(
            |_ctx: &Context<Ping>| {
                Behavior::EventBased(handler_fn(|ctx, _env| {
                    ctx.quit(ExitReason::Normal);
                    true
                }))
            },
            SpawnOptions::default(),
        );
        actor.send(None, Ping).unwrap();
    }

    sys.await_all_others_done();

    let started = std::time::Instant::now();
    sys.shutdown();
    assert!(started.elapsed() < Duration::from_secs(2));
}

/// A detached event-based actor runs its own dedicated thread pulling
/// straight from the mailbox (not the worker pool); it keeps working after
/// `shutdown()` returns since detached threads own their own exit
/// condition (spec §9's redesign note on thread-backed actors).
#[test]
fn detached_event_based_actor_survives_pool_shutdown() {
    let sys: ActorSystem<Ping> = support::test_system();
    let (tx, listen) = probe();

    let actor = sys.spawn(
        move |_ctx: &Context<Ping>| {
            let tx = tx.clone();
            Behavior::EventBased(handler_fn(move |_ctx, _env| {
                tx.event(());
                false
            }))
        },
        SpawnOptions {
            detached: true,
            ..Default::default()
        },
    );

    sys.shutdown();

    actor.send(None, Ping).unwrap();
    assert_eq!(listen.recv(), ());
}
