//! Connection states and connect flags.
//!
//! This module contains the enumerated connection states a context moves
//! through while establishing its session with the audio server, along with
//! the flag bitmask accepted by the connect operation.
//!
//! # Overview
//!
//! A context starts out [`Unconnected`](ContextState::Unconnected) and walks
//! through [`Connecting`](ContextState::Connecting),
//! [`Authorizing`](ContextState::Authorizing) and
//! [`SettingName`](ContextState::SettingName) before arriving at
//! [`Ready`](ContextState::Ready). A refused or lost session ends up in
//! [`Failed`](ContextState::Failed); [`Terminated`](ContextState::Terminated)
//! is reachable from any state once the server closes the session.

use bitflags::bitflags;

/// The state of a context's session with the audio server.
///
/// States are reported to the context's [`StateObserver`](crate::StateObserver)
/// by the owning [`Mainloop`](crate::Mainloop) whenever the session moves
/// forward in its handshake (or falls over). Only
/// [`Ready`](ContextState::Ready), [`Failed`](ContextState::Failed) and
/// [`Terminated`](ContextState::Terminated) are operationally significant;
/// everything else is intermediate.
///
/// The flag-like values [`NoAutoSpawn`](ContextState::NoAutoSpawn),
/// [`NoFail`](ContextState::NoFail) and [`NoFlags`](ContextState::NoFlags)
/// mirror the PulseAudio constant table, where connect-flag values share the
/// state namespace. They are never produced by the handshake itself; the
/// actual connect options are carried separately as [`ConnectFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ContextState {
    /// No connection attempt has been made yet.
    Unconnected,

    /// A connection is being established.
    Connecting,

    /// The server is authorizing the client.
    Authorizing,

    /// The client is transmitting its application name to the server.
    SettingName,

    /// The session is established and ready for use.
    Ready,

    /// The connection attempt failed or an established session was lost.
    Failed,

    /// The session was cleanly terminated by the server.
    Terminated,

    /// Flag-like value: the server will not be autospawned.
    NoAutoSpawn,

    /// Flag-like value: the connect attempt will not fail immediately.
    NoFail,

    /// Flag-like value: no connect options set.
    NoFlags,
}

impl ContextState {
    /// Returns the human-readable label for this state, as used in log
    /// output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unconnected => "unconnected",
            Self::Connecting => "connecting",
            Self::Authorizing => "authorizing",
            Self::SettingName => "setting name",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Terminated => "terminated",
            Self::NoAutoSpawn => "no auto spawn",
            Self::NoFail => "no fail",
            Self::NoFlags => "no flags",
        }
    }

    /// Whether this state means the session is gone ([`Failed`](Self::Failed)
    /// or [`Terminated`](Self::Terminated)).
    #[must_use]
    pub const fn is_disconnected(self) -> bool {
        matches!(self, Self::Failed | Self::Terminated)
    }

    /// Whether this state is operationally significant to an observer.
    ///
    /// Significant states are [`Ready`](Self::Ready) and the two
    /// disconnected states; all other transitions are intermediate and only
    /// worth a debug-level note.
    #[must_use]
    pub const fn is_significant(self) -> bool {
        matches!(self, Self::Ready) || self.is_disconnected()
    }
}

impl std::fmt::Display for ContextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

bitflags! {
    /// Options for a connect attempt.
    ///
    /// Passed to [`Context::connect`](crate::Context::connect) as a bitmask.
    /// An empty set requests the default behavior (autospawn allowed, fail
    /// immediately on refusal).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConnectFlags: u32 {
        /// Do not autospawn a server if none is running.
        const NOAUTOSPAWN = 0x0001;

        /// Do not fail the connect attempt immediately; keep waiting for a
        /// server to appear.
        const NOFAIL = 0x0002;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const ALL_STATES: [ContextState; 10] = [
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
    ];

    #[test]
    fn labels() {
        assert_eq!(ContextState::Unconnected.label(), "unconnected");
        assert_eq!(ContextState::Connecting.label(), "connecting");
        assert_eq!(ContextState::Authorizing.label(), "authorizing");
        assert_eq!(ContextState::SettingName.label(), "setting name");
        assert_eq!(ContextState::Ready.label(), "ready");
        assert_eq!(ContextState::Failed.label(), "failed");
        assert_eq!(ContextState::Terminated.label(), "terminated");
        assert_eq!(ContextState::NoAutoSpawn.label(), "no auto spawn");
        assert_eq!(ContextState::NoFail.label(), "no fail");
        assert_eq!(ContextState::NoFlags.label(), "no flags");
    }

    #[test]
    fn display_matches_label() {
        for state in ALL_STATES {
            assert_eq!(state.to_string(), state.label());
        }
    }

    #[test]
    fn significant_states() {
        let significant: Vec<ContextState> = ALL_STATES
            .into_iter()
            .filter(|s| s.is_significant())
            .collect();
        assert_eq!(
            significant,
            vec![
                ContextState::Ready,
                ContextState::Failed,
                ContextState::Terminated
            ]
        );
    }

    #[test]
    fn disconnected_states() {
        let disconnected: Vec<ContextState> = ALL_STATES
            .into_iter()
            .filter(|s| s.is_disconnected())
            .collect();
        assert_eq!(
            disconnected,
            vec![ContextState::Failed, ContextState::Terminated]
        );
    }

    #[test]
    fn default_flags_are_empty() {
        assert_eq!(ConnectFlags::default(), ConnectFlags::empty());
    }

    #[test]
    fn flags_combine() {
        let flags = ConnectFlags::NOAUTOSPAWN | ConnectFlags::NOFAIL;
        assert!(flags.contains(ConnectFlags::NOAUTOSPAWN));
        assert!(flags.contains(ConnectFlags::NOFAIL));
    }
}
