// Stock Item Entity - inventory on hand

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    #[serde(default)]
    pub id: String,

    pub company_id: String,

    pub name: String,

    /// Unit of measure ("Nos", "Kg", "Box")
    pub unit: String,

    pub quantity: f64,

    /// Valuation rate per unit
    pub rate: f64,

    #[serde(default)]
    pub reorder_level: f64,
}

impl StockItem {
    pub fn new(
        company_id: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        quantity: f64,
        rate: f64,
    ) -> Self {
        StockItem {
            id: uuid::Uuid::new_v4().to_string(),
            company_id: company_id.into(),
            name: name.into(),
            unit: unit.into(),
            quantity,
            rate,
            reorder_level: 0.0,
        }
    }

    pub fn with_reorder_level(mut self, reorder_level: f64) -> Self {
        self.reorder_level = reorder_level;
        self
    }

    /// Closing value = quantity x rate
    pub fn value(&self) -> f64 {
        self.quantity * self.rate
    }

    /// At or below the reorder level
    pub fn is_low(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_and_low_stock() {
        let item = StockItem::new("c1", "A4 Paper", "Box", 12.0, 250.0).with_reorder_level(20.0);
        assert_eq!(item.value(), 3_000.0);
        assert!(item.is_low());

        let item = StockItem::new("c1", "Stapler", "Nos", 40.0, 85.5).with_reorder_level(10.0);
        assert!(!item.is_low());

        // Reorder level defaults to zero, so only empty stock is low
        let empty = StockItem::new("c1", "Toner", "Nos", 0.0, 1_900.0);
        assert!(empty.is_low());
    }
}
