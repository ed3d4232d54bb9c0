//! The connection context.
//!
//! A [`Context`] represents the logical session between this client and the
//! audio server: an application name, the session's current
//! [`ContextState`], and the observer notified on every state change. It is
//! created against a loop's [`MainloopApi`] and registered in that loop's
//! routing table under a stable [`ContextToken`]; the loop routes incoming
//! state changes back to it through that token, with no other channel
//! between the two.

use crate::mainloop::{ContextToken, MainloopApi};
use crate::observer::StateObserver;
use crate::state::{ConnectFlags, ContextState};
use crate::{PulseWatchError, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub(crate) struct ContextInner {
    app_name: String,
    token: ContextToken,
    state: ContextState,
    server: Option<String>,
    flags: ConnectFlags,
    connect_initiated: bool,
    observer: Option<Box<dyn StateObserver>>,
}

/// A session to the audio server, registered against one [`Mainloop`].
///
/// Cloning a `Context` clones the handle: all clones refer to the same
/// session. The context keeps its loop alive (it holds the dispatch API
/// handle it was created against), so a context's lifetime is always
/// bounded by its loop's.
///
/// [`Mainloop`]: crate::Mainloop
#[derive(Clone)]
pub struct Context {
    inner: Rc<RefCell<ContextInner>>,
    api: MainloopApi,
}

impl Context {
    /// Creates a new context against the given dispatch API handle.
    ///
    /// The application name identifies this client to the server and is
    /// immutable afterwards. The observer is registered here, exactly once,
    /// before any connect attempt can be made; the loop invokes it for
    /// every state change routed to this context.
    ///
    /// # Errors
    /// - [`PulseWatchError::InvalidAppName`]: If the application name is
    ///   empty or whitespace.
    pub fn new(
        api: &MainloopApi,
        app_name: impl AsRef<str>,
        observer: Box<dyn StateObserver>,
    ) -> Result<Self> {
        let app_name = app_name.as_ref().trim();
        if app_name.is_empty() {
            return Err(PulseWatchError::InvalidAppName(
                "empty application name".to_owned(),
            ));
        }

        let token = api.allocate_token();
        let inner = Rc::new(RefCell::new(ContextInner {
            app_name: app_name.to_owned(),
            token,
            state: ContextState::Unconnected,
            server: None,
            flags: ConnectFlags::empty(),
            connect_initiated: false,
            observer: Some(observer),
        }));
        api.route_to(token, Rc::downgrade(&inner));
        tracing::trace!(app_name, ?token, "context created");

        Ok(Self {
            inner,
            api: api.clone(),
        })
    }

    /// The token the owning loop routes this context's state changes under.
    #[must_use]
    pub fn token(&self) -> ContextToken {
        self.inner.borrow().token
    }

    /// The application name this context was created with.
    #[must_use]
    pub fn app_name(&self) -> String {
        self.inner.borrow().app_name.clone()
    }

    /// The session's current state.
    #[must_use]
    pub fn state(&self) -> ContextState {
        self.inner.borrow().state
    }

    /// The server address the connect attempt was made against, if any.
    #[must_use]
    pub fn server(&self) -> Option<String> {
        self.inner.borrow().server.clone()
    }

    /// The connect flags recorded by the connect attempt.
    #[must_use]
    pub fn flags(&self) -> ConnectFlags {
        self.inner.borrow().flags
    }

    /// Initiates an asynchronous connection attempt.
    ///
    /// `server` names the server to connect to; `None` means the system
    /// default. `flags` tune the attempt (see [`ConnectFlags`]).
    ///
    /// Nothing about the outcome is returned here: success or failure is
    /// learned exclusively through the observer, as the handshake's state
    /// changes arrive via the owning loop. Calling this again once an
    /// attempt has been initiated is a no-op.
    pub fn connect(&self, server: Option<&str>, flags: ConnectFlags) {
        let mut inner = self.inner.borrow_mut();
        if inner.connect_initiated {
            tracing::trace!(
                app_name = %inner.app_name,
                "connect attempt already initiated; ignoring"
            );
            return;
        }

        inner.connect_initiated = true;
        inner.server = server.map(str::to_owned);
        inner.flags = flags;
        tracing::trace!(
            app_name = %inner.app_name,
            server = ?inner.server,
            ?flags,
            "initiating connection"
        );
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Context")
            .field("app_name", &inner.app_name)
            .field("token", &inner.token)
            .field("state", &inner.state)
            .field("connect_initiated", &inner.connect_initiated)
            .finish_non_exhaustive()
    }
}

/// Applies a state change to the context and notifies its observer.
///
/// The stored state is updated first, so the observer (and anything it
/// calls) sees the new value. The observer is taken out of the context for
/// the duration of the call, which keeps the context borrowable from inside
/// the callback.
pub(crate) fn deliver(inner: &Rc<RefCell<ContextInner>>, state: ContextState) {
    let mut observer = {
        let mut ctx = inner.borrow_mut();
        tracing::trace!(
            app_name = %ctx.app_name,
            from = %ctx.state,
            to = %state,
            "delivering state change"
        );
        ctx.state = state;
        ctx.observer.take()
    };

    if let Some(observer) = observer.as_mut() {
        observer.on_state_change(state);
    }
    if let Some(observer) = observer {
        inner.borrow_mut().observer = Some(observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mainloop::Mainloop;
    use crate::observer::LogObserver;
    use assert_matches::assert_matches;
    use test_log::test;

    fn context(api: &MainloopApi, name: &str) -> Context {
        Context::new(api, name, Box::new(LogObserver)).expect("context should be valid")
    }

    #[test]
    fn starts_unconnected() {
        let mainloop = Mainloop::new();
        let ctx = context(&mainloop.api(), "fresh");
        assert_eq!(ctx.state(), ContextState::Unconnected);
        assert_eq!(ctx.server(), None);
        assert_eq!(ctx.flags(), ConnectFlags::empty());
    }

    #[test]
    fn app_name_is_trimmed() {
        let mainloop = Mainloop::new();
        let ctx = context(&mainloop.api(), "  padded  ");
        assert_eq!(ctx.app_name(), "padded");
    }

    #[test]
    fn empty_app_name_is_rejected() {
        let mainloop = Mainloop::new();
        let err = Context::new(&mainloop.api(), "   ", Box::new(LogObserver))
            .expect_err("context should be invalid");
        assert_matches!(err, PulseWatchError::InvalidAppName(msg) if msg == "empty application name");
    }

    #[test]
    fn tokens_are_distinct_per_loop() {
        let mainloop = Mainloop::new();
        let api = mainloop.api();
        let a = context(&api, "a");
        let b = context(&api, "b");
        assert_ne!(a.token(), b.token());
    }

    #[test]
    fn connect_records_server_and_flags() {
        let mainloop = Mainloop::new();
        let ctx = context(&mainloop.api(), "recording");
        ctx.connect(Some("unix:/run/pulse/native"), ConnectFlags::NOAUTOSPAWN);
        assert_eq!(ctx.server().as_deref(), Some("unix:/run/pulse/native"));
        assert_eq!(ctx.flags(), ConnectFlags::NOAUTOSPAWN);
    }

    #[test]
    fn repeated_connect_keeps_the_first_attempt() {
        let mainloop = Mainloop::new();
        let ctx = context(&mainloop.api(), "stubborn");
        ctx.connect(Some("first"), ConnectFlags::empty());
        ctx.connect(Some("second"), ConnectFlags::NOFAIL);
        assert_eq!(ctx.server().as_deref(), Some("first"));
        assert_eq!(ctx.flags(), ConnectFlags::empty());
    }
}
