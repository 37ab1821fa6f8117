//! Parameterized statement builders for list queries and sparse updates.
//!
//! # Invariants
//! - Statement text is assembled only from `&'static str` column names owned
//!   by the resource mappings. Caller-supplied values are always bound.
//! - The page query and the count query share one predicate set.

use crate::db::json::JSON_CONTAINS_FN;
use crate::error::{ErrorKind, ResourceError, ResourceResult};
use crate::model::Metadata;
use crate::repo::marshal_metadata;
use rusqlite::types::Value;

/// Comparison applied by one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `column = ?`
    Equal,
    /// `json_contains(column, ?)`
    Contains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: &'static str,
    pub comparison: Comparison,
    pub value: Value,
}

/// Conjunction of list filters. Empty when no filter is supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicates {
    clauses: Vec<Predicate>,
}

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column = value` unless `value` is empty.
    pub fn eq_text(&mut self, column: &'static str, value: &str) {
        if value.is_empty() {
            return;
        }
        self.push(column, Comparison::Equal, Value::Text(value.to_string()));
    }

    /// Adds `column = value` unless `value` is zero.
    pub fn eq_unsigned(&mut self, column: &'static str, value: u64) -> ResourceResult<()> {
        if value == 0 {
            return Ok(());
        }
        let value = to_sql_integer(column, value)?;
        self.push(column, Comparison::Equal, Value::Integer(value));
        Ok(())
    }

    /// Adds a JSON containment match unless `metadata` is empty.
    pub fn contains_json(&mut self, column: &'static str, metadata: &Metadata) -> ResourceResult<()> {
        if metadata.is_empty() {
            return Ok(());
        }
        let probe = marshal_metadata(metadata)?;
        self.push(column, Comparison::Contains, Value::Text(probe));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Predicate] {
        &self.clauses
    }

    /// Renders ` WHERE ...` with `?1..?n` placeholders, or an empty string.
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let rendered: Vec<String> = self
            .clauses
            .iter()
            .enumerate()
            .map(|(index, clause)| {
                let slot = index + 1;
                match clause.comparison {
                    Comparison::Equal => format!("{} = ?{slot}", clause.column),
                    Comparison::Contains => {
                        format!("{JSON_CONTAINS_FN}({}, ?{slot})", clause.column)
                    }
                }
            })
            .collect();
        format!(" WHERE {}", rendered.join(" AND "))
    }

    /// Bound values in placeholder order.
    pub fn values(&self) -> Vec<Value> {
        self.clauses.iter().map(|clause| clause.value.clone()).collect()
    }

    fn push(&mut self, column: &'static str, comparison: Comparison, value: Value) {
        self.clauses.push(Predicate {
            column,
            comparison,
            value,
        });
    }
}

/// Page projection ordered by creation time. `LIMIT`/`OFFSET` bind after
/// the predicate values.
pub fn select_page_sql(table: &str, columns: &[&str], predicates: &Predicates) -> String {
    let limit_slot = predicates.len() + 1;
    let offset_slot = predicates.len() + 2;
    format!(
        "SELECT {} FROM {table}{} ORDER BY created_at ASC, id ASC LIMIT ?{limit_slot} OFFSET ?{offset_slot};",
        columns.join(", "),
        predicates.where_clause()
    )
}

/// Row count for the same predicate set, independent of the window.
pub fn count_sql(table: &str, predicates: &Predicates) -> String {
    format!("SELECT COUNT(*) FROM {table}{};", predicates.where_clause())
}

/// Point lookup by id.
pub fn select_by_id_sql(table: &str, columns: &[&str]) -> String {
    format!("SELECT {} FROM {table} WHERE id = ?1;", columns.join(", "))
}

pub fn insert_sql(table: &str, columns: &[&str]) -> String {
    let slots: Vec<String> = (1..=columns.len()).map(|slot| format!("?{slot}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({});",
        columns.join(", "),
        slots.join(", ")
    )
}

pub fn delete_sql(table: &str) -> String {
    format!("DELETE FROM {table} WHERE id = ?1;")
}

/// Column assignments of a sparse update.
///
/// Empty/zero values are skipped, so an update never clears a column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments {
    columns: Vec<(&'static str, Value)>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, column: &'static str, value: &str) {
        if !value.is_empty() {
            self.columns.push((column, Value::Text(value.to_string())));
        }
    }

    pub fn set_unsigned(&mut self, column: &'static str, value: u64) -> ResourceResult<()> {
        if value != 0 {
            let value = to_sql_integer(column, value)?;
            self.columns.push((column, Value::Integer(value)));
        }
        Ok(())
    }

    pub fn set_metadata(&mut self, column: &'static str, metadata: &Metadata) -> ResourceResult<()> {
        if !metadata.is_empty() {
            self.columns
                .push((column, Value::Text(marshal_metadata(metadata)?)));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(column, _)| *column).collect()
    }

    /// Renders the update statement.
    ///
    /// `updated_at` never drops below `created_at`; it binds after the
    /// assignments, followed by the id.
    pub fn update_sql(&self, table: &str) -> String {
        let mut sets: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, (column, _))| format!("{column} = ?{}", index + 1))
            .collect();
        let updated_at_slot = self.columns.len() + 1;
        let id_slot = self.columns.len() + 2;
        sets.push(format!("updated_at = MAX(created_at, ?{updated_at_slot})"));
        format!(
            "UPDATE {table} SET {} WHERE id = ?{id_slot};",
            sets.join(", ")
        )
    }

    /// Bound values for [`Self::update_sql`].
    pub fn into_values(self, updated_at: i64, id: &str) -> Vec<Value> {
        let mut values: Vec<Value> = self.columns.into_iter().map(|(_, value)| value).collect();
        values.push(Value::Integer(updated_at));
        values.push(Value::Text(id.to_string()));
        values
    }
}

fn to_sql_integer(column: &str, value: u64) -> ResourceResult<i64> {
    i64::try_from(value).map_err(|err| {
        ResourceError::with_source(
            ErrorKind::MalformedEntity,
            format!("`{column}` value {value} exceeds storage range"),
            err,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{count_sql, insert_sql, select_page_sql, Assignments, Comparison, Predicates};
    use crate::error::ErrorKind;
    use rusqlite::types::Value;
    use serde_json::json;

    #[test]
    fn no_filters_select_every_row() {
        let predicates = Predicates::new();
        assert!(predicates.is_empty());
        assert_eq!(
            select_page_sql("orders", &["id", "name"], &predicates),
            "SELECT id, name FROM orders ORDER BY created_at ASC, id ASC LIMIT ?1 OFFSET ?2;"
        );
        assert_eq!(count_sql("orders", &predicates), "SELECT COUNT(*) FROM orders;");
    }

    #[test]
    fn empty_values_add_no_predicates() {
        let mut predicates = Predicates::new();
        predicates.eq_text("name", "");
        predicates.eq_unsigned("price", 0).unwrap();
        predicates
            .contains_json("metadata", &serde_json::Map::new())
            .unwrap();
        assert!(predicates.is_empty());
    }

    #[test]
    fn filters_render_numbered_conjunction() {
        let mut predicates = Predicates::new();
        predicates.eq_text("status", "paid");
        predicates.eq_unsigned("price", 1200).unwrap();
        let metadata = json!({"table": 4}).as_object().cloned().unwrap();
        predicates.contains_json("metadata", &metadata).unwrap();

        assert_eq!(
            predicates.where_clause(),
            " WHERE status = ?1 AND price = ?2 AND json_contains(metadata, ?3)"
        );
        assert_eq!(predicates.clauses()[2].comparison, Comparison::Contains);
        assert_eq!(
            predicates.values(),
            vec![
                Value::Text("paid".to_string()),
                Value::Integer(1200),
                Value::Text(r#"{"table":4}"#.to_string()),
            ]
        );
        assert!(select_page_sql("orders", &["id"], &predicates).ends_with("LIMIT ?4 OFFSET ?5;"));
    }

    #[test]
    fn oversized_integers_are_malformed() {
        let mut predicates = Predicates::new();
        let err = predicates.eq_unsigned("price", u64::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedEntity);
    }

    #[test]
    fn sparse_update_skips_empty_fields() {
        let mut assignments = Assignments::new();
        assignments.set_text("name", "");
        assignments.set_text("status", "paid");
        assignments.set_unsigned("price", 0).unwrap();
        assert_eq!(assignments.column_names(), vec!["status"]);
        assert_eq!(
            assignments.update_sql("orders"),
            "UPDATE orders SET status = ?1, updated_at = MAX(created_at, ?2) WHERE id = ?3;"
        );
        let values = assignments.into_values(42, "abc");
        assert_eq!(values.len(), 3);
        assert_eq!(values[1], Value::Integer(42));
    }

    #[test]
    fn insert_binds_every_column() {
        assert_eq!(
            insert_sql("shops", &["id", "name", "email"]),
            "INSERT INTO shops (id, name, email) VALUES (?1, ?2, ?3);"
        );
    }
}
