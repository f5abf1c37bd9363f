//! CLI error types.

use std::fmt;

use wgmgr_config::ConfigError;
use wgmgr_persist::StoreError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// An engine operation was rejected.
    Config(ConfigError),
    /// Loading or saving the configuration failed.
    Store(StoreError),
    /// A configuration already exists and `--force` was not given.
    AlreadyExists(String),
    /// Output formatting error.
    Format(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::AlreadyExists(location) => write!(
                f,
                "config file \"{location}\" exists, add -f/--force flag to overwrite"
            ),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_config() {
        let err = CliError::from(ConfigError::UnknownPeer { name: "gw".into() });
        assert_eq!(err.to_string(), "unknown peer: gw");
    }

    #[test]
    fn cli_error_display_already_exists() {
        let err = CliError::AlreadyExists("/etc/wgmgr.conf".into());
        assert_eq!(
            err.to_string(),
            "config file \"/etc/wgmgr.conf\" exists, add -f/--force flag to overwrite"
        );
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }

    #[test]
    fn cli_error_keeps_source() {
        use std::error::Error as _;
        let err = CliError::from(StoreError::NotFound("/tmp/absent".into()));
        assert!(err.source().is_some());
    }
}
