use crate::state::ConnectFlags;
use crate::PulseWatchError;
use std::time::Duration;

/// Represents the configuration for a [`Connection`](crate::Connection).
///
/// This struct carries the application name the connection identifies
/// itself with, an optional server address, the connect flag bitmask, and
/// the poll interval an idle blocking loop iteration waits for.
///
/// The application name is validated up front: configuration is the only
/// place a missing name can surface, and it does so before any loop or
/// dispatch-API resource exists.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    app_name: String,
    server: Option<String>,
    flags: ConnectFlags,
    poll_interval: Duration,
}

impl ConnectionConfig {
    /// How long an idle blocking loop iteration waits before returning
    /// control. Default: 25 milliseconds.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(25);

    /// Creates a new configuration with the given application name.
    ///
    /// The name is trimmed of surrounding whitespace; what remains must be
    /// non-empty. Server address and flags default to the system default
    /// server and an empty flag set.
    ///
    /// # Example
    /// ```rust
    /// use pulsewatch::ConnectionConfig;
    /// let config = ConnectionConfig::new("  demo  ");
    /// assert!(config.is_ok());
    /// assert_eq!(config.unwrap().app_name(), "demo");
    /// ```
    ///
    /// # Errors
    /// - [`PulseWatchError::InvalidAppName`]: If the trimmed name is empty.
    pub fn new(app_name: impl AsRef<str>) -> crate::Result<Self> {
        let app_name = app_name.as_ref().trim();
        if app_name.is_empty() {
            return Err(PulseWatchError::InvalidAppName(
                "empty application name".to_owned(),
            ));
        }

        Ok(Self {
            app_name: app_name.to_owned(),
            server: None,
            flags: ConnectFlags::empty(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        })
    }

    /// Overrides the server address the connection will be made against.
    ///
    /// Without this, the connect attempt targets the system default server.
    /// The address is an opaque daemon address string (for example a unix
    /// socket path or a host name); it is trimmed and must be non-empty,
    /// but is otherwise passed through untouched.
    ///
    /// # Errors
    /// - [`PulseWatchError::InvalidServer`]: If the trimmed address is empty.
    pub fn with_server(mut self, server: impl AsRef<str>) -> crate::Result<Self> {
        let server = server.as_ref().trim();
        if server.is_empty() {
            return Err(PulseWatchError::InvalidServer(
                "empty server address".to_owned(),
            ));
        }

        self.server = Some(server.to_owned());
        Ok(self)
    }

    /// Overrides the connect flag bitmask. Defaults to an empty set.
    ///
    /// # Example
    /// ```rust
    /// use pulsewatch::{ConnectFlags, ConnectionConfig};
    /// let config = ConnectionConfig::new("demo")
    ///     .unwrap()
    ///     .with_flags(ConnectFlags::NOAUTOSPAWN);
    /// assert_eq!(config.flags(), ConnectFlags::NOAUTOSPAWN);
    /// ```
    #[must_use]
    pub fn with_flags(mut self, flags: ConnectFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Overrides the default poll interval.
    ///
    /// A blocking loop iteration with nothing pending waits this long
    /// before handing control back, which bounds how quickly the poll loop
    /// notices a raised stop flag.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The application name the connection identifies itself with.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// The configured server address, if any.
    #[must_use]
    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// The configured connect flags.
    #[must_use]
    pub fn flags(&self) -> ConnectFlags {
        self.flags
    }

    /// The configured poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
