//! Order row mapping and filters over the `orders` table.

use crate::error::{ErrorKind, ResourceError, ResourceResult};
use crate::model::order::{Order, OrderFilter};
use crate::repo::{
    marshal_metadata, stored_unsigned, unmarshal_metadata, Assignments, Predicates, Storable,
    StorageRow, SqliteRepository,
};
use rusqlite::types::Value;
use rusqlite::Row;

/// Repository over the `orders` table.
pub type OrderRepository = SqliteRepository<Order>;

/// Storage row of an order. `metadata` holds the JSON encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbOrder {
    pub id: String,
    pub vendor: String,
    pub name: String,
    pub price: i64,
    pub place: String,
    pub status: String,
    pub metadata: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StorageRow for DbOrder {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "vendor",
        "name",
        "price",
        "place",
        "status",
        "metadata",
        "created_at",
        "updated_at",
    ];

    fn into_values(self) -> Vec<Value> {
        vec![
            Value::Text(self.id),
            Value::Text(self.vendor),
            Value::Text(self.name),
            Value::Integer(self.price),
            Value::Text(self.place),
            Value::Text(self.status),
            Value::Text(self.metadata),
            Value::Integer(self.created_at),
            Value::Integer(self.updated_at),
        ]
    }

    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            vendor: row.get("vendor")?,
            name: row.get("name")?,
            price: row.get("price")?,
            place: row.get("place")?,
            status: row.get("status")?,
            metadata: row.get("metadata")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Storable for Order {
    const TABLE: &'static str = "orders";

    type Row = DbOrder;

    fn to_row(&self) -> ResourceResult<DbOrder> {
        let price = i64::try_from(self.price).map_err(|err| {
            ResourceError::with_source(
                ErrorKind::MalformedEntity,
                format!("order price {} exceeds storage range", self.price),
                err,
            )
        })?;

        Ok(DbOrder {
            id: self.id.clone(),
            vendor: self.vendor.clone(),
            name: self.name.clone(),
            price,
            place: self.place.clone(),
            status: self.status.clone(),
            metadata: marshal_metadata(&self.metadata)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    fn from_row(row: DbOrder) -> ResourceResult<Self> {
        Ok(Self {
            price: stored_unsigned("orders.price", row.price)?,
            metadata: unmarshal_metadata(&row.metadata)?,
            id: row.id,
            vendor: row.vendor,
            name: row.name,
            place: row.place,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn filter_predicates(filter: &OrderFilter, predicates: &mut Predicates) -> ResourceResult<()> {
        predicates.eq_text("vendor", &filter.vendor);
        predicates.eq_text("name", &filter.name);
        predicates.eq_unsigned("price", filter.price)?;
        predicates.eq_text("place", &filter.place);
        predicates.eq_text("status", &filter.status);
        predicates.contains_json("metadata", &filter.metadata)
    }

    fn changes(&self) -> ResourceResult<Assignments> {
        let mut assignments = Assignments::new();
        assignments.set_text("vendor", &self.vendor);
        assignments.set_text("name", &self.name);
        assignments.set_unsigned("price", self.price)?;
        assignments.set_text("place", &self.place);
        assignments.set_text("status", &self.status);
        assignments.set_metadata("metadata", &self.metadata)?;
        Ok(assignments)
    }
}
