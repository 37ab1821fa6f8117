//! Closed error taxonomy shared by every resource layer.
//!
//! # Responsibility
//! - Enumerate every failure kind a resource call can surface.
//! - Keep the low-level cause attached for diagnostics.
//!
//! # Invariants
//! - Classification happens once, in the repository or request boundary.
//!   Services and decorators forward errors unchanged.
//! - `ResourceError::source()` always returns the original storage error
//!   when one exists.

use crate::model::EntityValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Boxed low-level cause kept behind a classified error.
pub type Cause = Box<dyn Error + Send + Sync + 'static>;

/// Every failure kind a resource call can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Entity failed structural validation (enumerated values).
    Validation,
    /// Request carried no bearer token.
    MissingToken,
    /// Bearer token could not be accepted.
    AuthenticationFailed,
    /// Request did not name an entity id.
    MissingId,
    /// Page limit outside `[1, 100]`.
    InvalidLimit,
    /// Page offset not representable by storage.
    InvalidOffset,
    /// Point lookup on an absent id.
    NotFound,
    /// Uniqueness violation.
    Conflict,
    /// Bad JSON or a value storage refused.
    MalformedEntity,
    CreateFailed,
    ViewFailed,
    UpdateFailed,
    RemoveFailed,
    /// Caller cancelled the call or its deadline passed.
    Cancelled,
}

/// Response class a transport maps each kind onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Unauthorized,
    Conflict,
    NotFound,
    Server,
}

impl ErrorKind {
    /// Stable snake_case code used in log records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::MissingToken => "missing_token",
            Self::AuthenticationFailed => "authentication_failed",
            Self::MissingId => "missing_id",
            Self::InvalidLimit => "invalid_limit",
            Self::InvalidOffset => "invalid_offset",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::MalformedEntity => "malformed_entity",
            Self::CreateFailed => "create_failed",
            Self::ViewFailed => "view_failed",
            Self::UpdateFailed => "update_failed",
            Self::RemoveFailed => "remove_failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable summary of the kind.
    pub fn message(self) -> &'static str {
        match self {
            Self::Validation => "invalid entity",
            Self::MissingToken => "missing or invalid bearer user token",
            Self::AuthenticationFailed => "failed to perform authentication over the entity",
            Self::MissingId => "missing entity id",
            Self::InvalidLimit => "invalid limit size",
            Self::InvalidOffset => "invalid offset size",
            Self::NotFound => "entity not found",
            Self::Conflict => "entity already exists",
            Self::MalformedEntity => "malformed entity specification",
            Self::CreateFailed => "failed to create entity in the db",
            Self::ViewFailed => "view entity failed",
            Self::UpdateFailed => "update entity failed",
            Self::RemoveFailed => "failed to remove entity",
            Self::Cancelled => "call cancelled",
        }
    }

    pub fn class(self) -> ErrorClass {
        match self {
            Self::Validation
            | Self::MissingId
            | Self::InvalidLimit
            | Self::InvalidOffset
            | Self::MalformedEntity
            | Self::Cancelled => ErrorClass::Client,
            Self::MissingToken | Self::AuthenticationFailed => ErrorClass::Unauthorized,
            Self::Conflict => ErrorClass::Conflict,
            Self::NotFound => ErrorClass::NotFound,
            Self::CreateFailed | Self::ViewFailed | Self::UpdateFailed | Self::RemoveFailed => {
                ErrorClass::Server
            }
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Resource operation a generic storage failure is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    View,
    List,
    Update,
    Remove,
}

impl Operation {
    /// Generic failure kind for this operation.
    pub fn failed_kind(self) -> ErrorKind {
        match self {
            Self::Create => ErrorKind::CreateFailed,
            Self::View | Self::List => ErrorKind::ViewFailed,
            Self::Update => ErrorKind::UpdateFailed,
            Self::Remove => ErrorKind::RemoveFailed,
        }
    }
}

/// Classified resource failure with optional detail and preserved cause.
#[derive(Debug)]
pub struct ResourceError {
    kind: ErrorKind,
    detail: Option<String>,
    source: Option<Cause>,
}

impl ResourceError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            detail: None,
            source: None,
        }
    }

    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
            source: None,
        }
    }

    /// Wraps a low-level cause under `kind`.
    pub fn with_source(kind: ErrorKind, detail: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the underlying cause rendered for log output.
    pub fn cause_text(&self) -> Option<String> {
        self.source.as_ref().map(|cause| cause.to_string())
    }
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {detail}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Error for ResourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn Error + 'static))
    }
}

impl From<ErrorKind> for ResourceError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<EntityValidationError> for ResourceError {
    fn from(value: EntityValidationError) -> Self {
        let detail = value.to_string();
        Self::with_source(ErrorKind::Validation, detail, value)
    }
}
