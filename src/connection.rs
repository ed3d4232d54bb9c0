//! Connection bootstrap and poll loop.
//!
//! A [`Connection`] ties the three resources of a session together (the
//! event loop, its dispatch API handle, and the context), constructing each
//! lazily, in dependency order, and exactly once per instance. It then
//! drives the loop synchronously until told to stop.

use crate::config::ConnectionConfig;
use crate::context::Context;
use crate::mainloop::{ContextToken, IterateOutcome, Mainloop, MainloopApi};
use crate::observer::LogObserver;
use crate::state::ContextState;
use crate::Result;
use once_cell::unsync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// A lazily wired session to the audio server.
///
/// The loop, dispatch API handle, and context are all created on first use
/// and memoized per instance: repeated access, including a repeated
/// [`connect`](Connection::connect), returns the same resources, never
/// reconstructed ones. Construction order is fixed (loop, then api, then
/// context), and the only way it can fail is an invalid application name,
/// which [`ConnectionConfig`] already rules out before any resource exists.
///
/// A `Connection` is single-threaded, like the loop it owns. Dropping it
/// drops the context and the loop; outstanding
/// [`TransitionFeed`](crate::TransitionFeed) handles notice via
/// [`MainloopGone`](crate::PulseWatchError::MainloopGone).
#[derive(Debug)]
pub struct Connection {
    config: ConnectionConfig,
    mainloop: OnceCell<Mainloop>,
    api: OnceCell<MainloopApi>,
    context: OnceCell<Context>,
}

impl Connection {
    /// Creates a connection from the given configuration.
    ///
    /// No resource is allocated here; everything waits for first use.
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            mainloop: OnceCell::new(),
            api: OnceCell::new(),
            context: OnceCell::new(),
        }
    }

    /// Creates a connection with a default configuration for the given
    /// application name.
    ///
    /// This is a convenience wrapper around [`ConnectionConfig::new`] and
    /// [`Connection::new`].
    ///
    /// # Errors
    /// - [`PulseWatchError::InvalidAppName`](crate::PulseWatchError::InvalidAppName):
    ///   If the application name is empty or whitespace.
    pub fn with_app_name(app_name: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(ConnectionConfig::new(app_name)?))
    }

    /// The configuration this connection was created with.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The event loop, created on first access.
    pub fn mainloop(&self) -> &Mainloop {
        self.mainloop
            .get_or_init(|| Mainloop::with_idle_wait(self.config.poll_interval()))
    }

    /// The loop's dispatch API handle, created on first access (creating
    /// the loop first if needed).
    pub fn api(&self) -> &MainloopApi {
        self.api.get_or_init(|| self.mainloop().api())
    }

    /// The context, created on first access (creating loop and api first if
    /// needed) with the default [`LogObserver`] registered.
    ///
    /// # Errors
    /// - [`PulseWatchError::InvalidAppName`](crate::PulseWatchError::InvalidAppName):
    ///   If the configured application name no longer passes validation.
    pub fn context(&self) -> Result<&Context> {
        self.context.get_or_try_init(|| {
            Context::new(self.api(), self.config.app_name(), Box::new(LogObserver))
        })
    }

    /// Initiates an asynchronous connection attempt with the configured
    /// server address and flags.
    ///
    /// The first call constructs loop, api, and context; later calls reuse
    /// them and do not restart the attempt. No return value communicates
    /// handshake success; that arrives exclusively through the observer as
    /// the loop dispatches state changes.
    ///
    /// # Errors
    /// - [`PulseWatchError::InvalidAppName`](crate::PulseWatchError::InvalidAppName):
    ///   If the configured application name no longer passes validation.
    pub fn connect(&self) -> Result<()> {
        let context = self.context()?;
        context.connect(self.config.server(), self.config.flags());
        Ok(())
    }

    /// The context's routing token, if the context has been created.
    #[must_use]
    pub fn token(&self) -> Option<ContextToken> {
        self.context.get().map(Context::token)
    }

    /// The session's current state.
    ///
    /// [`Unconnected`](ContextState::Unconnected) until the context exists.
    #[must_use]
    pub fn state(&self) -> ContextState {
        self.context
            .get()
            .map_or(ContextState::Unconnected, Context::state)
    }

    /// Runs one loop iteration. See [`Mainloop::iterate`].
    pub fn iterate(&self, block: bool) -> IterateOutcome {
        self.mainloop().iterate(block)
    }

    /// Drives the loop until `stop` is raised or the loop quits.
    ///
    /// Each pass blocks in [`iterate`](Self::iterate), so the stop flag is
    /// observed with at most the configured poll interval of latency. The
    /// loop keeps polling regardless of connection state: a context that
    /// reported [`Failed`](ContextState::Failed) or
    /// [`Terminated`](ContextState::Terminated) does not end the loop.
    pub fn run(&self, stop: &AtomicBool) {
        tracing::trace!(app_name = %self.config.app_name(), "entering poll loop");
        while !stop.load(Ordering::Relaxed) {
            if self.iterate(true) == IterateOutcome::Quit {
                tracing::trace!("mainloop quit; leaving poll loop");
                return;
            }
        }
        tracing::trace!("stop flag raised; leaving poll loop");
    }
}
