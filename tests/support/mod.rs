use std::time::Duration;

use relay_rt::envelope::Message;
use relay_rt::ActorSystem;

/// A system wired for tests: silent logger, small pool, no surprise
/// `ACTOR_RT_CONF` environment coupling.
pub fn test_system<M: Message>() -> ActorSystem<M> {
    ActorSystem::for_testing()
}

/// Polls `cond` until it's true or `timeout` elapses, sleeping briefly
/// between checks. Used where a probe channel isn't a natural fit (waiting
/// on exit status rather than on a delivered message).
pub fn wait_until<F: FnMut() -> bool>(mut cond: F, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if std::time::Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}
