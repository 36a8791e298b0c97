mod support;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use relay_rt::{handler_fn, ActorSystem, Behavior, Context, SpawnOptions};

#[derive(Clone, Debug)]
enum Msg {
    Ping,
}

/// Spawns 8 detached senders each pushing N/8 copies of `Msg::Ping` at one
/// receiver, and checks the receiver sees exactly N messages and terminates
/// normally (spec §8's mailbox perf scenario). Left `#[ignore]`d since a
/// million-message run isn't something CI should pay for on every commit.
#[test]
#[ignore]
fn mailbox_survives_a_million_messages_from_eight_senders() {
    const TOTAL: u64 = 1_000_000;
    const SENDERS: u64 = 8;
    const PER_SENDER: u64 = TOTAL / SENDERS;

    let sys: ActorSystem<Msg> = support::test_system();
    let count = Arc::new(AtomicU64::new(0));

    let receiver = {
        let count = count.clone();
        sys.spawn(
            move |_ctx: &Context<Msg>| {
                let count = count.clone();
                Behavior::EventBased(handler_fn(move |ctx, env| match &env.msg {
                    Msg::Ping => {
                        let seen = count.fetch_add(1, Ordering::AcqRel) + 1;
                        if seen == TOTAL {
                            ctx.quit(relay_rt::actors::ExitReason::Normal);
                        }
                        true
                    }
                }))
            },
            SpawnOptions::default(),
        )
    };

    for _ in 0..SENDERS {
        let target = receiver.clone();
        sys.spawn(
            move |_ctx: &Context<Msg>| {
                Behavior::ThreadBody(Box::new(move |_ctx| {
                    for _ in 0..PER_SENDER {
                        let _ = target.send(None, Msg::Ping);
                    }
                }))
            },
            SpawnOptions::default(),
        );
    }

    sys.await_all_others_done();

    assert_eq!(count.load(Ordering::Acquire), TOTAL);
    assert_eq!(receiver.exit_reason(), Some(relay_rt::actors::ExitReason::Normal));
}
