//! Canned handshake scripts.
//!
//! There is no audio daemon on the other side of a
//! [`TransitionFeed`](crate::TransitionFeed); these helpers stage the state
//! sequences a real server would produce, paced so the transitions are
//! visible in log output. The demos use them to drive a full lifecycle, and
//! they are just pushes; tests that want different sequences or timing
//! push transitions directly.

use crate::mainloop::{ContextToken, TransitionFeed};
use crate::state::ContextState;
use crate::Result;
use std::time::Duration;

/// Pacing between staged handshake steps.
const STEP_DELAY: Duration = Duration::from_millis(50);

/// Stages the successful handshake: connecting, authorizing, setting the
/// application name, then ready.
///
/// # Errors
/// - [`PulseWatchError::MainloopGone`](crate::PulseWatchError::MainloopGone):
///   If the feed's loop has been dropped.
pub fn stage_ready_handshake(feed: &TransitionFeed, token: ContextToken) -> Result<()> {
    feed.push(token, ContextState::Connecting)?;
    feed.push_after(STEP_DELAY, token, ContextState::Authorizing)?;
    feed.push_after(STEP_DELAY, token, ContextState::SettingName)?;
    feed.push_after(STEP_DELAY, token, ContextState::Ready)?;
    Ok(())
}

/// Stages a refused connection: connecting, then failed.
///
/// # Errors
/// - [`PulseWatchError::MainloopGone`](crate::PulseWatchError::MainloopGone):
///   If the feed's loop has been dropped.
pub fn stage_refused_handshake(feed: &TransitionFeed, token: ContextToken) -> Result<()> {
    feed.push(token, ContextState::Connecting)?;
    feed.push_after(STEP_DELAY, token, ContextState::Failed)?;
    Ok(())
}

/// Stages a server-side termination of an established session.
///
/// # Errors
/// - [`PulseWatchError::MainloopGone`](crate::PulseWatchError::MainloopGone):
///   If the feed's loop has been dropped.
pub fn stage_termination(feed: &TransitionFeed, token: ContextToken) -> Result<()> {
    feed.push_after(STEP_DELAY, token, ContextState::Terminated)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mainloop::{IterateOutcome, Mainloop};
    use crate::observer::StateObserver;
    use crate::Context;
    use std::cell::RefCell;
    use std::rc::Rc;
    use test_log::test;

    struct Recorder(Rc<RefCell<Vec<ContextState>>>);

    impl StateObserver for Recorder {
        fn on_state_change(&mut self, state: ContextState) {
            self.0.borrow_mut().push(state);
        }
    }

    fn drain(mainloop: &Mainloop) {
        while mainloop.iterate(false) != IterateOutcome::Idle {}
        while let IterateOutcome::Dispatched(_) = mainloop.iterate(true) {}
    }

    #[test]
    fn ready_handshake_arrives_in_order() {
        let mainloop = Mainloop::with_idle_wait(Duration::from_millis(1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let ctx = Context::new(
            &mainloop.api(),
            "handshake",
            Box::new(Recorder(Rc::clone(&seen))),
        )
        .expect("context should be valid");

        stage_ready_handshake(&mainloop.feed(), ctx.token()).expect("staging should succeed");
        drain(&mainloop);

        assert_eq!(
            *seen.borrow(),
            vec![
                ContextState::Connecting,
                ContextState::Authorizing,
                ContextState::SettingName,
                ContextState::Ready
            ]
        );
        assert_eq!(ctx.state(), ContextState::Ready);
    }

    #[test]
    fn refused_handshake_ends_failed() {
        let mainloop = Mainloop::with_idle_wait(Duration::from_millis(1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let ctx = Context::new(
            &mainloop.api(),
            "refused",
            Box::new(Recorder(Rc::clone(&seen))),
        )
        .expect("context should be valid");

        stage_refused_handshake(&mainloop.feed(), ctx.token()).expect("staging should succeed");
        drain(&mainloop);

        assert_eq!(
            *seen.borrow(),
            vec![ContextState::Connecting, ContextState::Failed]
        );
        assert_eq!(ctx.state(), ContextState::Failed);
    }

    #[test]
    fn termination_reaches_an_established_session() {
        let mainloop = Mainloop::with_idle_wait(Duration::from_millis(1));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let ctx = Context::new(
            &mainloop.api(),
            "terminated",
            Box::new(Recorder(Rc::clone(&seen))),
        )
        .expect("context should be valid");

        stage_ready_handshake(&mainloop.feed(), ctx.token()).expect("staging should succeed");
        drain(&mainloop);
        stage_termination(&mainloop.feed(), ctx.token()).expect("staging should succeed");
        drain(&mainloop);

        assert_eq!(ctx.state(), ContextState::Terminated);
    }
}
