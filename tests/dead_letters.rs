mod support;

use relay_rt::actors::*;
use riker_testkit::probe::channel::probe;
use riker_testkit::probe::Probe;
use riker_testkit::probe::ProbeReceive;

#[derive(Clone, Debug)]
struct Ping;

/// A `send` to an already-exited actor is routed to every subscribed
/// dead-letter sink instead of being silently dropped (spec §7).
#[test]
fn send_to_exited_actor_reaches_dead_letter_subscribers() {
    let sys: ActorSystem<Ping> = support::test_system();

    let gone = sys.spawn(
        |_ctx: &Context<Ping>| Behavior::EventBased(handler_fn(|_ctx, _env| false)),
        SpawnOptions::default(),
    );
    gone.exit(ExitReason::Normal);
    sys.await_running_count_equal(0);

    let (tx, listen) = probe();
    let sink = sys.spawn(
        move |_ctx: &Context<Ping>| {
            let tx = tx.clone();
            Behavior::EventBased(handler_fn(move |_ctx, _env| {
                tx.event(());
                true
            }))
        },
        SpawnOptions::default(),
    );
    sys.subscribe_dead_letters(sink);

    let result = gone.send(None, Ping);
    assert!(result.is_err());

    assert_eq!(listen.recv(), ());

    sys.shutdown();
}
