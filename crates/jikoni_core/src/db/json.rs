//! JSON containment for metadata filters.
//!
//! `json_contains(stored, probe)` is registered on every pooled connection
//! and follows Postgres `@>` rules:
//! - objects: every probe key exists in `stored` and its value is contained;
//! - arrays: every probe element is contained in some stored element;
//! - scalars: equal values. Integers compare exactly; a float on either
//!   side compares numerically.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use serde_json::{Number, Value};

/// SQL name of the containment function.
pub const JSON_CONTAINS_FN: &str = "json_contains";

pub(crate) fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        JSON_CONTAINS_FN,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let stored: Option<String> = ctx.get(0)?;
            let probe: Option<String> = ctx.get(1)?;
            let (Some(stored), Some(probe)) = (stored, probe) else {
                return Ok(false);
            };
            let stored: Value = serde_json::from_str(&stored)
                .map_err(|err| rusqlite::Error::UserFunctionError(Box::new(err)))?;
            let probe: Value = serde_json::from_str(&probe)
                .map_err(|err| rusqlite::Error::UserFunctionError(Box::new(err)))?;
            Ok(json_contains(&stored, &probe))
        },
    )
}

/// Returns whether `stored` contains `probe`.
pub fn json_contains(stored: &Value, probe: &Value) -> bool {
    match (stored, probe) {
        (Value::Object(stored), Value::Object(probe)) => probe.iter().all(|(key, expected)| {
            stored
                .get(key)
                .is_some_and(|actual| json_contains(actual, expected))
        }),
        (Value::Array(stored), Value::Array(probe)) => probe
            .iter()
            .all(|expected| stored.iter().any(|actual| json_contains(actual, expected))),
        (Value::Number(actual), Value::Number(expected)) => numbers_equal(actual, expected),
        _ => stored == probe,
    }
}

fn numbers_equal(actual: &Number, expected: &Number) -> bool {
    if actual.is_f64() || expected.is_f64() {
        return actual.as_f64() == expected.as_f64();
    }
    match (actual.as_i64(), expected.as_i64()) {
        (Some(actual), Some(expected)) => actual == expected,
        _ => actual.as_u64().is_some() && actual.as_u64() == expected.as_u64(),
    }
}
