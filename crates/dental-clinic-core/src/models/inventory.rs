//! Inventory models.

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// A stocked supply item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    /// e.g. "Material", "Anestesia", "Instrumental"
    pub category: String,
    pub quantity: u32,
    /// e.g. "caja", "unidad", "ml"
    pub unit: String,
    /// Reorder threshold
    pub min_quantity: u32,
    pub price: f64,
    pub supplier: Option<String>,
    /// RFC 3339 timestamp of the last restock
    pub last_restocked: Option<String>,
}

impl InventoryItem {
    /// Create a new item with required fields.
    pub fn new(name: String, category: String, unit: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            category,
            quantity: 0,
            unit,
            min_quantity: 0,
            price: 0.0,
            supplier: None,
            last_restocked: None,
        }
    }

    /// Strictly below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.min_quantity
    }

    /// Units needed to get back to the threshold.
    pub fn shortfall(&self) -> u32 {
        self.min_quantity.saturating_sub(self.quantity)
    }

    /// Add stock and stamp the restock time.
    pub fn restock(&mut self, amount: u32) {
        self.quantity = self.quantity.saturating_add(amount);
        self.last_restocked = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Take stock out. Fails without changing anything if there is not enough.
    pub fn consume(&mut self, amount: u32) -> Result<(), ValidationError> {
        self.quantity = self.quantity.checked_sub(amount).ok_or_else(|| {
            ValidationError::invalid(
                "quantity",
                format!("only {} {} of {} in stock", self.quantity, self.unit, self.name),
            )
        })?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::invalid("price", "must be a non-negative amount"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(quantity: u32, min_quantity: u32) -> InventoryItem {
        let mut item = InventoryItem::new("Guantes de nitrilo".into(), "Material".into(), "caja".into());
        item.quantity = quantity;
        item.min_quantity = min_quantity;
        item
    }

    #[test]
    fn test_low_stock_is_strict() {
        assert!(make_item(3, 10).is_low_stock());
        assert!(!make_item(10, 10).is_low_stock());
        assert_eq!(make_item(3, 10).shortfall(), 7);
    }

    #[test]
    fn test_restock_and_consume() {
        let mut item = make_item(3, 10);
        item.restock(20);
        assert_eq!(item.quantity, 23);
        assert!(item.last_restocked.is_some());

        item.consume(5).unwrap();
        assert_eq!(item.quantity, 18);

        assert!(item.consume(100).is_err());
        assert_eq!(item.quantity, 18);
    }
}
