mod support;

use std::time::Duration;

use relay_rt::actors::*;
use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::Probe;
use riker_testkit::probe::ProbeReceive;

#[derive(Clone, Debug)]
struct Ping;

struct NeverMatches;
impl Handler<Ping> for NeverMatches {
    fn try_handle(&mut self, _ctx: &Context<Ping>, _env: &Envelope<Ping>) -> bool {
        false
    }
}

struct MatchAnything(ChannelProbe<(), String>);
impl Handler<Ping> for MatchAnything {
    fn try_handle(&mut self, _ctx: &Context<Ping>, _env: &Envelope<Ping>) -> bool {
        self.0.event("matched".to_string());
        true
    }
}

/// A thread-backed actor's `receive_with_timeout` gives up cleanly when
/// nothing arrives in time, without leaving the actor unable to receive a
/// message sent after the deadline passed (spec §4.3's timed-receive
/// clause).
#[test]
fn timed_receive_expires_then_actor_still_accepts_a_later_send() {
    let sys: ActorSystem<Ping> = support::test_system();
    let (probe, listen) = probe();

    let actor = sys.spawn(
        move |_ctx: &Context<Ping>| {
            let probe = probe.clone();
            Behavior::ThreadBody(Box::new(move |ctx: &Context<Ping>| {
                let mut nothing = NeverMatches;
                let fired = probe.clone();
                ctx.receive_with_timeout(&mut nothing, Duration::from_millis(50), move |_ctx| {
                    fired.event("timed-out".to_string());
                });

                let mut anything = MatchAnything(probe.clone());
                ctx.receive(&mut anything);
            }))
        },
        SpawnOptions::default(),
    );

    assert_eq!(listen.recv(), "timed-out");

    actor.send(None, Ping).unwrap();
    assert_eq!(listen.recv(), "matched");

    sys.shutdown();
}
