//! Inventory database operations.

use rusqlite::{params, OptionalExtension, Row};
use tracing::{info, warn};

use super::{Database, DbError, DbResult};
use crate::models::InventoryItem;

const INVENTORY_COLUMNS: &str =
    "id, name, category, quantity, unit, min_quantity, price, supplier, last_restocked";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        quantity: row.get(3)?,
        unit: row.get(4)?,
        min_quantity: row.get(5)?,
        price: row.get(6)?,
        supplier: row.get(7)?,
        last_restocked: row.get(8)?,
    })
}

fn warn_if_low(item: &InventoryItem) {
    if item.is_low_stock() {
        warn!(
            item_id = %item.id,
            name = %item.name,
            quantity = item.quantity,
            min_quantity = item.min_quantity,
            "inventory item below minimum"
        );
    }
}

impl Database {
    fn query_inventory(&self, filter: &str) -> DbResult<Vec<InventoryItem>> {
        let sql = format!(
            "SELECT {} FROM inventory {} ORDER BY category, name",
            INVENTORY_COLUMNS, filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], item_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert a new inventory item.
    pub fn insert_inventory_item(&self, item: &InventoryItem) -> DbResult<()> {
        item.validate()?;
        self.conn.execute(
            r#"
            INSERT INTO inventory (
                id, name, category, quantity, unit, min_quantity, price, supplier, last_restocked
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                item.id,
                item.name,
                item.category,
                item.quantity,
                item.unit,
                item.min_quantity,
                item.price,
                item.supplier,
                item.last_restocked,
            ],
        )?;
        warn_if_low(item);
        Ok(())
    }

    /// Update an existing inventory item.
    pub fn update_inventory_item(&self, item: &InventoryItem) -> DbResult<bool> {
        item.validate()?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE inventory SET
                name = ?2,
                category = ?3,
                quantity = ?4,
                unit = ?5,
                min_quantity = ?6,
                price = ?7,
                supplier = ?8,
                last_restocked = ?9
            WHERE id = ?1
            "#,
            params![
                item.id,
                item.name,
                item.category,
                item.quantity,
                item.unit,
                item.min_quantity,
                item.price,
                item.supplier,
                item.last_restocked,
            ],
        )?;
        if rows_affected > 0 {
            warn_if_low(item);
        }
        Ok(rows_affected > 0)
    }

    pub fn get_inventory_item(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let sql = format!("SELECT {} FROM inventory WHERE id = ?", INVENTORY_COLUMNS);
        self.conn
            .query_row(&sql, [id], item_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// All items, by category then name.
    pub fn list_inventory(&self) -> DbResult<Vec<InventoryItem>> {
        self.query_inventory("")
    }

    /// Items strictly below their minimum quantity.
    pub fn list_low_stock(&self) -> DbResult<Vec<InventoryItem>> {
        self.query_inventory("WHERE quantity < min_quantity")
    }

    /// Add stock to an item.
    pub fn restock_inventory_item(&self, id: &str, amount: u32) -> DbResult<InventoryItem> {
        let mut item = self
            .get_inventory_item(id)?
            .ok_or_else(|| DbError::not_found("inventory item", id))?;
        item.restock(amount);
        self.update_inventory_item(&item)?;
        info!(item_id = %id, amount, quantity = item.quantity, "inventory restocked");
        Ok(item)
    }

    /// Take stock out of an item. Fails if there is not enough.
    pub fn consume_inventory_item(&self, id: &str, amount: u32) -> DbResult<InventoryItem> {
        let mut item = self
            .get_inventory_item(id)?
            .ok_or_else(|| DbError::not_found("inventory item", id))?;
        item.consume(amount)?;
        self.update_inventory_item(&item)?;
        Ok(item)
    }

    pub fn delete_inventory_item(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM inventory WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_item(name: &str, quantity: u32, min_quantity: u32) -> InventoryItem {
        let mut item = InventoryItem::new(name.into(), "Material".into(), "caja".into());
        item.quantity = quantity;
        item.min_quantity = min_quantity;
        item.price = 12.5;
        item
    }

    #[test]
    fn test_insert_update_and_get_item() {
        let db = setup_db();
        let mut item = make_item("Guantes", 20, 5);
        db.insert_inventory_item(&item).unwrap();
        assert_eq!(db.get_inventory_item(&item.id).unwrap().unwrap(), item);

        item.quantity = 2;
        assert!(db.update_inventory_item(&item).unwrap());
        assert_eq!(db.get_inventory_item(&item.id).unwrap().unwrap().quantity, 2);
        assert_eq!(db.list_inventory().unwrap().len(), 1);
    }

    #[test]
    fn test_low_stock_is_strict() {
        let db = setup_db();
        db.insert_inventory_item(&make_item("Guantes", 3, 10)).unwrap();
        db.insert_inventory_item(&make_item("Mascarillas", 10, 10)).unwrap();
        db.insert_inventory_item(&make_item("Anestesia", 50, 10)).unwrap();

        let low = db.list_low_stock().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Guantes");
    }

    #[test]
    fn test_restock_and_consume() {
        let db = setup_db();
        let item = make_item("Guantes", 3, 10);
        db.insert_inventory_item(&item).unwrap();

        let restocked = db.restock_inventory_item(&item.id, 10).unwrap();
        assert_eq!(restocked.quantity, 13);
        assert!(restocked.last_restocked.is_some());
        assert!(db.list_low_stock().unwrap().is_empty());

        assert!(db.consume_inventory_item(&item.id, 20).is_err());
        let consumed = db.consume_inventory_item(&item.id, 5).unwrap();
        assert_eq!(consumed.quantity, 8);
        assert_eq!(db.get_inventory_item(&item.id).unwrap().unwrap().quantity, 8);

        assert!(matches!(
            db.restock_inventory_item("missing", 1),
            Err(DbError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_item() {
        let db = setup_db();
        let item = make_item("Guantes", 3, 10);
        db.insert_inventory_item(&item).unwrap();
        assert!(db.delete_inventory_item(&item.id).unwrap());
        assert!(db.get_inventory_item(&item.id).unwrap().is_none());
    }
}
