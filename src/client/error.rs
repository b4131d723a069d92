use std::error::Error as StdError;

use crate::domain::ValidationError;
use crate::transport::{EntryListError, LoginError, ResponseError};

/// Coarse category of a [`CrmError`], for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Auth,
    Module,
    Data,
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`CrmClient`](crate::CrmClient).
///
/// The display text is the message alone, e.g. `Not logged in.`.
pub enum CrmError {
    /// Bad endpoint, transport failure (DNS, TLS, timeouts) or a non-200 response.
    #[error("{message}")]
    Connection {
        message: String,
        /// HTTP status, when the failure is a non-200 response with a readable status line.
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Login rejected by the server, or a call made without a session.
    #[error("{message}")]
    Auth {
        message: String,
        /// `name` field of a rejected login response.
        name: Option<String>,
        /// `description` field of a rejected login response.
        description: Option<String>,
    },

    /// Missing module information or a call to a module the user can't see.
    #[error("{message}")]
    Module { message: String },

    /// Empty or undecodable response body.
    #[error("{message}")]
    Data {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl CrmError {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            name: None,
            description: None,
        }
    }

    pub(crate) fn module(message: impl Into<String>) -> Self {
        Self::Module {
            message: message.into(),
        }
    }

    pub(crate) fn transport(err: Box<dyn StdError + Send + Sync>) -> Self {
        Self::Connection {
            message: format!("Request error: {err}"),
            status: None,
            source: Some(err),
        }
    }

    pub(crate) fn invalid_endpoint(err: ValidationError) -> Self {
        Self::Connection {
            message: "Invalid endpoint URL given.".to_owned(),
            status: None,
            source: Some(Box::new(err)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Module { .. } => ErrorKind::Module,
            Self::Data { .. } => ErrorKind::Data,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Connection { message, .. }
            | Self::Auth { message, .. }
            | Self::Module { message }
            | Self::Data { message, .. } => message,
        }
    }

    /// HTTP status of a [`CrmError::Connection`] caused by a non-200 response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Connection { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<ResponseError> for CrmError {
    fn from(err: ResponseError) -> Self {
        let message = err.to_string();
        match err {
            ResponseError::HttpStatus { status } => Self::Connection {
                message,
                status,
                source: None,
            },
            ResponseError::Json(source) => Self::Data {
                message,
                source: Some(Box::new(source)),
            },
            ResponseError::EmptyBody | ResponseError::Falsy => Self::Data {
                message,
                source: None,
            },
        }
    }
}

impl From<LoginError> for CrmError {
    fn from(err: LoginError) -> Self {
        let message = err.to_string();
        match err {
            LoginError::Rejected { name, description } => Self::Auth {
                message,
                name,
                description,
            },
            LoginError::MissingModules => Self::Module { message },
        }
    }
}

impl From<EntryListError> for CrmError {
    fn from(err: EntryListError) -> Self {
        Self::Data {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
