mod support;

use relay_rt::{handler_fn, ActorSystem, Behavior, Context, SpawnOptions};
use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::Probe;
use riker_testkit::probe::ProbeReceive;

#[derive(Clone, Debug)]
enum Msg {
    Tag(i64),
    Attach(ChannelProbe<(), i64>),
}

/// Messages sent before the mailbox has a sink attached fall through the
/// handler and get stashed; once the sink shows up, the stash is replayed
/// ahead of anything sent afterward, so the whole sequence still comes out
/// in the order it was sent (spec §4.2/§4.3 stash replay).
#[test]
fn stash_replay_preserves_send_order() {
    let sys: ActorSystem<Msg> = support::test_system();

    let actor = sys.spawn(
        |_ctx: &Context<Msg>| {
            let mut sink: Option<ChannelProbe<(), i64>> = None;
            Behavior::EventBased(handler_fn(move |_ctx, env| match &env.msg {
                Msg::Attach(p) => {
                    sink = Some(p.clone());
                    true
                }
                Msg::Tag(n) => match &sink {
                    Some(p) => {
                        p.event(*n);
                        true
                    }
                    None => false,
                },
            }))
        },
        SpawnOptions::default(),
    );

    let (probe, listen) = probe();
    actor.send(None, Msg::Tag(1)).unwrap();
    actor.send(None, Msg::Tag(2)).unwrap();
    actor.send(None, Msg::Attach(probe)).unwrap();
    actor.send(None, Msg::Tag(3)).unwrap();

    assert_eq!(listen.recv(), 1);
    assert_eq!(listen.recv(), 2);
    assert_eq!(listen.recv(), 3);

    sys.shutdown();
}

/// `become_behavior` swaps the pattern set in effect for the *next*
/// message, without disturbing a message already mid-dispatch.
#[test]
fn become_behavior_takes_effect_on_next_message() {
    let sys: ActorSystem<Msg> = support::test_system();
    let (probe, listen) = probe();

    let actor = sys.spawn(
        move |_ctx: &Context<Msg>| {
            let probe = probe.clone();
            Behavior::EventBased(handler_fn(move |ctx, env| match &env.msg {
                Msg::Tag(n) => {
                    probe.event(*n);
                    let probe = probe.clone();
                    ctx.become_behavior(handler_fn(move |_ctx, env| match &env.msg {
                        Msg::Tag(n) => {
                            probe.event(n * 10);
                            true
                        }
                        _ => false,
                    }));
                    true
                }
                _ => false,
            }))
        },
        SpawnOptions::default(),
    );

    actor.send(None, Msg::Tag(1)).unwrap();
    actor.send(None, Msg::Tag(2)).unwrap();

    assert_eq!(listen.recv(), 1);
    assert_eq!(listen.recv(), 20);

    sys.shutdown();
}
