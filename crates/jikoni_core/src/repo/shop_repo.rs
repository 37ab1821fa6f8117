//! Shop row mapping and filters over the `shops` table.

use crate::error::ResourceResult;
use crate::model::shop::{Shop, ShopFilter};
use crate::repo::{
    marshal_metadata, unmarshal_metadata, Assignments, Predicates, Storable, StorageRow,
    SqliteRepository,
};
use rusqlite::types::Value;
use rusqlite::Row;

/// Repository over the `shops` table.
pub type ShopRepository = SqliteRepository<Shop>;

/// Storage row of a shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbShop {
    pub id: String,
    pub name: String,
    pub email: String,
    pub number: String,
    pub metadata: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StorageRow for DbShop {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "number",
        "metadata",
        "created_at",
        "updated_at",
    ];

    fn into_values(self) -> Vec<Value> {
        vec![
            Value::Text(self.id),
            Value::Text(self.name),
            Value::Text(self.email),
            Value::Text(self.number),
            Value::Text(self.metadata),
            Value::Integer(self.created_at),
            Value::Integer(self.updated_at),
        ]
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            number: row.get("number")?,
            metadata: row.get("metadata")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Storable for Shop {
    const TABLE: &'static str = "shops";

    type Row = DbShop;

    fn to_row(&self) -> ResourceResult<DbShop> {
        Ok(DbShop {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            number: self.number.clone(),
            metadata: marshal_metadata(&self.metadata)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    fn from_row(row: DbShop) -> ResourceResult<Self> {
        Ok(Self {
            metadata: unmarshal_metadata(&row.metadata)?,
            id: row.id,
            name: row.name,
            email: row.email,
            number: row.number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn filter_predicates(filter: &ShopFilter, predicates: &mut Predicates) -> ResourceResult<()> {
        predicates.eq_text("name", &filter.name);
        predicates.eq_text("email", &filter.email);
        predicates.eq_text("number", &filter.number);
        predicates.contains_json("metadata", &filter.metadata)
    }

    fn changes(&self) -> ResourceResult<Assignments> {
        let mut assignments = Assignments::new();
        assignments.set_text("name", &self.name);
        assignments.set_text("email", &self.email);
        assignments.set_text("number", &self.number);
        assignments.set_metadata("metadata", &self.metadata)?;
        Ok(assignments)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::shop::{Shop, ShopFilter};
    use crate::repo::{Predicates, Storable};
    use serde_json::json;

    #[test]
    fn row_mapping_round_trips() {
        let mut shop = Shop::new("Mama Oliech", "orders@oliech.example", "+254700000000");
        shop.id = "0190a3c4-0000-7000-8000-000000000002".to_string();
        shop.metadata = json!({"city": "Nairobi"}).as_object().cloned().unwrap();
        shop.created_at = 5;
        shop.updated_at = 5;

        let row = shop.to_row().unwrap();
        assert_eq!(Shop::from_row(row).unwrap(), shop);
    }

    #[test]
    fn metadata_filter_uses_containment() {
        let filter = ShopFilter {
            email: "orders@oliech.example".to_string(),
            metadata: json!({"city": "Nairobi"}).as_object().cloned().unwrap(),
            ..ShopFilter::default()
        };
        let mut predicates = Predicates::new();
        Shop::filter_predicates(&filter, &mut predicates).unwrap();
        assert_eq!(
            predicates.where_clause(),
            " WHERE email = ?1 AND json_contains(metadata, ?2)"
        );
    }
}
