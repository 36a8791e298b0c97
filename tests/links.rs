mod support;

use relay_rt::actors::*;
use riker_testkit::probe::channel::{probe, ChannelProbe};
use riker_testkit::probe::Probe;
use riker_testkit::probe::ProbeReceive;

#[derive(Clone, Debug)]
enum Msg {
    Attach(ChannelProbe<(), ExitReason>),
    Die,
}

/// A trap-exit actor that re-raises a linked peer's exit as its own,
/// wrapping it one level deeper.
struct Relay;

impl Handler<Msg> for Relay {
    fn try_handle(&mut self, _ctx: &Context<Msg>, _env: &Envelope<Msg>) -> bool {
        false
    }

    fn try_handle_system(&mut self, ctx: &Context<Msg>, sys: &SystemMsg) -> bool {
        let SystemMsg::LinkedDown { reason, .. } = sys;
        ctx.quit(ExitReason::LinkedDown(Box::new(reason.clone())));
        true
    }
}

/// A trap-exit actor that just reports whatever `LinkedDown` it sees.
struct Observer {
    probe: Option<ChannelProbe<(), ExitReason>>,
}

impl Handler<Msg> for Observer {
    fn try_handle(&mut self, _ctx: &Context<Msg>, env: &Envelope<Msg>) -> bool {
        match &env.msg {
            Msg::Attach(p) => {
                self.probe = Some(p.clone());
                true
            }
            Msg::Die => false,
        }
    }

    fn try_handle_system(&mut self, _ctx: &Context<Msg>, sys: &SystemMsg) -> bool {
        let SystemMsg::LinkedDown { reason, .. } = sys;
        if let Some(p) = &self.probe {
            p.event(reason.clone());
        }
        true
    }
}

/// A three-link chain: C exits with a user-defined code, B (trapping,
/// linked to C) re-raises that as its own exit, and A (trapping, linked to
/// B) sees the doubly-wrapped reason. Exit propagation nests one
/// `LinkedDown` per hop rather than flattening to the original cause
/// (spec §4.5).
#[test]
fn linked_down_nests_across_a_chain() {
    let sys: ActorSystem<Msg> = support::test_system();

    let c = sys.spawn(
        |_ctx: &Context<Msg>| {
            Behavior::EventBased(handler_fn(|ctx, env| match &env.msg {
                Msg::Die => {
                    ctx.quit(ExitReason::UserDefined(42));
                    true
                }
                _ => false,
            }))
        },
        SpawnOptions::default(),
    );

    let b = sys.spawn(
        |_ctx: &Context<Msg>| Behavior::EventBased(Box::new(Relay)),
        SpawnOptions {
            trap_exit: true,
            link_to: Some(c.id()),
            ..Default::default()
        },
    );

    let a = sys.spawn(
        |_ctx: &Context<Msg>| Behavior::EventBased(Box::new(Observer { probe: None })),
        SpawnOptions {
            trap_exit: true,
            link_to: Some(b.id()),
            ..Default::default()
        },
    );

    let (probe, listen) = probe();
    a.send(None, Msg::Attach(probe)).unwrap();
    c.send(None, Msg::Die).unwrap();

    let expected = ExitReason::LinkedDown(Box::new(ExitReason::LinkedDown(Box::new(ExitReason::UserDefined(42)))));
    assert_eq!(listen.recv(), expected);

    sys.shutdown();
}
