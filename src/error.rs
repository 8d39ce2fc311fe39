use thiserror::Error;

/// Failure taxonomy shared by the upstream clients and the proxy gateway.
///
/// `Config` is raised before any network I/O is attempted, `Upstream` when
/// the remote service answered with a non-success status, and `Network` when
/// no usable response came back at all.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Config(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("{0}")]
    Network(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Error::Network(message.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
