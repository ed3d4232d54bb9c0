//! # pulsewatch
//!
//! `pulsewatch` is a minimal demonstration client for the
//! [PulseAudio](https://www.freedesktop.org/wiki/Software/PulseAudio/)
//! asynchronous connection API: it wires up an event loop, requests a
//! connection to the audio server, and logs connection-state transitions
//! until stopped.
//!
//! There is no audio here: no capture or playback, no streams, no device
//! or volume management, and no reconnection policy. The interesting part
//! is the handshake: a context walks from `Unconnected` through
//! `Connecting`, `Authorizing`, and `SettingName` to `Ready` (or falls into
//! `Failed`/`Terminated`), and an observer decides which of those
//! transitions matter.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pulsewatch::{loopback, Connection};
//! use std::sync::atomic::AtomicBool;
//!
//! fn main() -> pulsewatch::Result<()> {
//!     let conn = Connection::with_app_name("demo")?;
//!     conn.connect()?;
//!
//!     // No daemon is attached; stage the handshake a server would produce.
//!     let feed = conn.mainloop().feed();
//!     if let Some(token) = conn.token() {
//!         loopback::stage_ready_handshake(&feed, token)?;
//!     }
//!
//!     let stop = AtomicBool::new(false);
//!     conn.run(&stop);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized around three parts:
//!
//! ### [`Mainloop`]
//!
//! A single-threaded event loop. State transitions are queued on it (via a
//! [`TransitionFeed`], standing in for the server side) and dispatched when
//! client code polls with [`Mainloop::iterate`]. Each transition is routed
//! to the owning context through its [`ContextToken`].
//!
//! ### [`Context`]
//!
//! The logical session to the audio server: an application name, the
//! current [`ContextState`], and the [`StateObserver`] registered at
//! creation. [`Context::connect`] initiates the asynchronous connection
//! attempt; its outcome is only ever reported through the observer.
//!
//! ### [`Connection`]
//!
//! The bootstrap. It builds loop, dispatch API handle, and context lazily,
//! in dependency order, each memoized per instance, and drives the poll
//! loop via [`Connection::run`] until a stop flag is raised or the loop
//! quits.
//!
//! ## Observing state changes
//!
//! The default [`LogObserver`] filters transitions down to the significant
//! subset: `Ready` is logged at INFO level, `Failed` and `Terminated` at
//! ERROR level, and every intermediate state at DEBUG level. Nothing is
//! retried and nothing exits; a disconnected context is merely logged, and
//! the loop keeps polling.
//!
//! ## Shutdown
//!
//! [`Connection::run`] checks an `AtomicBool` stop flag on every iteration,
//! so a Ctrl-C handler (or any other thread) can end the poll loop cleanly;
//! [`Mainloop::quit`] ends it from within. Dropping the [`Connection`]
//! releases the context and the loop.
//!
//! ## Features
//!
//! - `serde`: derive `Serialize`/`Deserialize` for [`ContextState`].

mod config;
mod connection;
mod context;
pub mod loopback;
mod mainloop;
mod observer;
mod state;

pub use config::ConnectionConfig;
pub use connection::Connection;
pub use context::Context;
pub use mainloop::{
    ContextToken, IterateOutcome, Mainloop, MainloopApi, TransitionFeed, DEFAULT_IDLE_WAIT,
};
pub use observer::{LogObserver, StateObserver};
pub use state::{ConnectFlags, ContextState};

/// The crate's `Result` type, used throughout the library to indicate
/// success or failure.
///
/// This type is a convenient alias for `std::result::Result` where the
/// error type is [`PulseWatchError`].
pub type Result<T> = std::result::Result<T, PulseWatchError>;

/// The `PulseWatchError` enum represents the errors that can occur while
/// using this crate.
///
/// Note that a refused or lost connection is not an error: the handshake's
/// outcome is reported through the registered [`StateObserver`] and the
/// poll loop carries on regardless.
#[derive(Debug, thiserror::Error)]
pub enum PulseWatchError {
    /// The application name a context must be created with is missing.
    ///
    /// Raised when the name is empty or whitespace-only, at configuration
    /// or context-creation time, before any loop or dispatch-API resource
    /// is allocated.
    ///
    /// The inner `String` describes why the name was rejected.
    #[error("invalid application name: {0}")]
    InvalidAppName(String),

    /// A server address override is unusable.
    ///
    /// Raised when an explicitly configured server address is empty or
    /// whitespace-only. Addresses are otherwise opaque and passed through
    /// untouched.
    ///
    /// The inner `String` describes why the address was rejected.
    #[error("invalid server address: {0}")]
    InvalidServer(String),

    /// A loop handle was used after its [`Mainloop`] was dropped.
    ///
    /// [`TransitionFeed`] handles hold only a weak reference to their loop;
    /// pushing through one that outlived the loop reports this instead of
    /// queueing into nothing.
    #[error("mainloop has been torn down")]
    MainloopGone,
}
