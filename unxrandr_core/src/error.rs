//! Error handling for unxrandr_core

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The display subsystem could not be reached, or reported data that
    /// breaks the snapshot invariants.
    #[error("Platform query error: {message}")]
    PlatformQuery { message: String },

    #[error("Command syntax error: {message}")]
    Syntax { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Helper functions for creating specific error types
impl LayoutError {
    pub fn platform_query<S: Into<String>>(message: S) -> Self {
        Self::PlatformQuery {
            message: message.into(),
        }
    }

    pub fn syntax<S: Into<String>>(message: S) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn is_platform_query(&self) -> bool {
        matches!(self, Self::PlatformQuery { .. })
    }
}

/// Convert X11 transport errors
impl From<x11rb::errors::ConnectError> for LayoutError {
    fn from(err: x11rb::errors::ConnectError) -> Self {
        Self::platform_query(format!("Cannot connect to X server: {}", err))
    }
}

impl From<x11rb::errors::ConnectionError> for LayoutError {
    fn from(err: x11rb::errors::ConnectionError) -> Self {
        Self::platform_query(format!("X11 connection failed: {}", err))
    }
}

impl From<x11rb::errors::ReplyError> for LayoutError {
    fn from(err: x11rb::errors::ReplyError) -> Self {
        Self::platform_query(format!("X11 request failed: {}", err))
    }
}

impl From<toml::de::Error> for LayoutError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse config: {}", err))
    }
}
