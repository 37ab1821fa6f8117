//! Maps SQLite failures onto the resource error taxonomy.
//!
//! # Invariants
//! - The SQLite error is always kept as the cause.
//! - Unrecognized failures fall back to the operation's generic kind.

use crate::error::{ErrorKind, Operation, ResourceError};
use rusqlite::ErrorCode;

// Extended result codes (sqlite3.h).
const CONSTRAINT_CHECK: i32 = 275;
const CONSTRAINT_FOREIGNKEY: i32 = 787;
const CONSTRAINT_NOTNULL: i32 = 1299;
const CONSTRAINT_PRIMARYKEY: i32 = 1555;
const CONSTRAINT_UNIQUE: i32 = 2067;

/// Classifies a storage failure raised while running `operation`.
pub fn classify(operation: Operation, err: rusqlite::Error) -> ResourceError {
    let (kind, detail) = kind_for(operation, &err);
    ResourceError::with_source(kind, detail, err)
}

fn kind_for(operation: Operation, err: &rusqlite::Error) -> (ErrorKind, &'static str) {
    match err {
        rusqlite::Error::QueryReturnedNoRows => (ErrorKind::NotFound, "no row matches id"),
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::ConstraintViolation => match failure.extended_code {
                CONSTRAINT_UNIQUE | CONSTRAINT_PRIMARYKEY => {
                    (ErrorKind::Conflict, "uniqueness violation")
                }
                CONSTRAINT_CHECK | CONSTRAINT_NOTNULL => {
                    (ErrorKind::MalformedEntity, "value rejected by storage")
                }
                CONSTRAINT_FOREIGNKEY => (ErrorKind::CreateFailed, "foreign key violation"),
                _ => (operation.failed_kind(), "constraint violation"),
            },
            ErrorCode::TooBig | ErrorCode::TypeMismatch => {
                (ErrorKind::MalformedEntity, "value rejected by storage")
            }
            ErrorCode::OperationInterrupted => (ErrorKind::Cancelled, "storage call interrupted"),
            _ => (operation.failed_kind(), "storage failure"),
        },
        rusqlite::Error::IntegralValueOutOfRange(_, _)
        | rusqlite::Error::FromSqlConversionFailure(_, _, _)
        | rusqlite::Error::InvalidColumnType(_, _, _) => {
            (ErrorKind::MalformedEntity, "stored value cannot be decoded")
        }
        _ => (operation.failed_kind(), "storage failure"),
    }
}
