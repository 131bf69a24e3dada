use serde::{Deserialize, Serialize};

/// Transport-level failure category, shared by every request builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenericErrorType {
    Timeout,
    NoConnection,
    NotFound,
    ServerError,
    AuthorizationRequired,
    InvalidResponse,
    ParseError,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind:?} ({status:?}): {message}")]
pub struct BaseNetworkError {
    pub kind: GenericErrorType,
    pub message: String,
    pub status: Option<u16>,
    /// `error` code from the service's error envelope, e.g. `unknown_comment`.
    pub api_error: Option<String>,
}

impl BaseNetworkError {
    pub fn new(kind: GenericErrorType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            api_error: None,
        }
    }

    pub fn is_authorization_required(&self) -> bool {
        self.kind == GenericErrorType::AuthorizationRequired
            || matches!(
                self.api_error.as_deref(),
                Some("authorization_required") | Some("unauthorized")
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentErrorType {
    GenericError,
    InvalidResponse,
    AuthorizationRequired,
    DuplicateComment,
    InvalidInput,
    UnknownComment,
    UnknownPost,
}

impl From<&BaseNetworkError> for CommentErrorType {
    fn from(error: &BaseNetworkError) -> Self {
        match error.api_error.as_deref() {
            Some("invalid_input") => return CommentErrorType::InvalidInput,
            Some("unknown_comment") => return CommentErrorType::UnknownComment,
            Some("unknown_post") => return CommentErrorType::UnknownPost,
            Some("comment_duplicate") => return CommentErrorType::DuplicateComment,
            _ => {}
        }
        if error.is_authorization_required() {
            return CommentErrorType::AuthorizationRequired;
        }
        match error.kind {
            GenericErrorType::InvalidResponse | GenericErrorType::ParseError => {
                CommentErrorType::InvalidResponse
            }
            _ => CommentErrorType::GenericError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct CommentError {
    pub kind: CommentErrorType,
    pub message: String,
}

impl From<BaseNetworkError> for CommentError {
    fn from(error: BaseNetworkError) -> Self {
        Self {
            kind: CommentErrorType::from(&error),
            message: error.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReaderErrorType {
    GenericError,
    AuthorizationRequired,
}

impl From<&BaseNetworkError> for ReaderErrorType {
    fn from(error: &BaseNetworkError) -> Self {
        if error.is_authorization_required() {
            ReaderErrorType::AuthorizationRequired
        } else {
            ReaderErrorType::GenericError
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct ReaderError {
    pub kind: ReaderErrorType,
    pub message: String,
}

impl From<BaseNetworkError> for ReaderError {
    fn from(error: BaseNetworkError) -> Self {
        Self {
            kind: ReaderErrorType::from(&error),
            message: error.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthErrorType {
    GenericError,
    InvalidEmail,
    NotAllowed,
}

impl From<&BaseNetworkError> for AuthErrorType {
    fn from(error: &BaseNetworkError) -> Self {
        match error.api_error.as_deref() {
            Some("invalid_email") | Some("unknown_user") => AuthErrorType::InvalidEmail,
            Some("not_allowed") | Some("forbidden") => AuthErrorType::NotAllowed,
            _ => AuthErrorType::GenericError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct AuthError {
    pub kind: AuthErrorType,
    pub message: String,
}

impl From<BaseNetworkError> for AuthError {
    fn from(error: BaseNetworkError) -> Self {
        Self {
            kind: AuthErrorType::from(&error),
            message: error.message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxonomyErrorType {
    GenericError,
    UnauthorizedAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct TaxonomyError {
    pub kind: TaxonomyErrorType,
    pub message: String,
}

impl From<BaseNetworkError> for TaxonomyError {
    fn from(error: BaseNetworkError) -> Self {
        let kind = if error.is_authorization_required() {
            TaxonomyErrorType::UnauthorizedAccess
        } else {
            TaxonomyErrorType::GenericError
        };
        Self {
            kind,
            message: error.message,
        }
    }
}
