use thiserror::Error;

use crate::{
    application::{
        bootstrap::BootstrapError, console::ConsoleError, session::SessionError,
        uploads::UploadError,
    },
    config::LoadError,
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Errors surfaced at the binary boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("no credentials stored; run `postdeck login` first")]
    NotLoggedIn,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Whether the operator should rerun the QR login.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            AppError::NotLoggedIn | AppError::Session(SessionError::CredentialMissing(_))
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Infra(InfraError::Io(err))
    }
}
