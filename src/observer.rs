//! State observers.
//!
//! An observer is the piece of client code the mainloop invokes whenever a
//! context's session state changes. The default implementation,
//! [`LogObserver`], filters transitions down to the operationally
//! significant ones and logs them; custom implementations can react to the
//! raw stream however they like.

use crate::state::ContextState;

/// Callback invoked by the mainloop on every state change of a context.
///
/// Registered exactly once, when the context is created, and before any
/// connect attempt can be made. The context's stored state is updated before
/// the observer runs, so [`Context::state`](crate::Context::state) already
/// reports the new value from inside the callback.
///
/// Observers are event callbacks, not queries: they return nothing, and the
/// mainloop ignores anything they do beyond their own side effects.
pub trait StateObserver {
    /// Called with the state the context has just entered.
    fn on_state_change(&mut self, state: ContextState);
}

/// The default observer: logs state transitions and nothing else.
///
/// Intermediate handshake states are logged at DEBUG level and otherwise
/// ignored. [`Ready`](ContextState::Ready) is logged at INFO level;
/// [`Failed`](ContextState::Failed) and
/// [`Terminated`](ContextState::Terminated) at ERROR level. No transition
/// triggers a reconnect, a retry, or a process exit; a disconnected
/// context just sits there while the loop keeps polling.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl StateObserver for LogObserver {
    fn on_state_change(&mut self, state: ContextState) {
        if !state.is_significant() {
            tracing::debug!("context state changed (ignoring): {}", state.label());
            return;
        }

        if state == ContextState::Ready {
            tracing::info!("context ready: connection is ready for use");
        } else {
            tracing::error!("context disconnected: {}", state.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use test_log::test;

    struct Recorder(Rc<RefCell<Vec<ContextState>>>);

    impl StateObserver for Recorder {
        fn on_state_change(&mut self, state: ContextState) {
            self.0.borrow_mut().push(state);
        }
    }

    #[test]
    fn custom_observer_sees_every_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut recorder = Recorder(Rc::clone(&seen));

        recorder.on_state_change(ContextState::Connecting);
        recorder.on_state_change(ContextState::NoAutoSpawn);
        recorder.on_state_change(ContextState::Ready);

        assert_eq!(
            *seen.borrow(),
            vec![
                ContextState::Connecting,
                ContextState::NoAutoSpawn,
                ContextState::Ready
            ]
        );
    }

    #[test]
    fn log_observer_handles_all_states() {
        // The level-by-level assertions live in tests/observer.rs, where log
        // output is captured; here we only make sure no state panics.
        let mut observer = LogObserver;
        for state in [
            ContextState::Unconnected,
            ContextState::Connecting,
            ContextState::Authorizing,
            ContextState::SettingName,
            ContextState::Ready,
            ContextState::Failed,
            ContextState::Terminated,
            ContextState::NoAutoSpawn,
            ContextState::NoFail,
            ContextState::NoFlags,
        ] {
            observer.on_state_change(state);
        }
    }
}
