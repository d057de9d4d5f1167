// Company Entity - the books every other record belongs to

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::format::DEFAULT_PREFIX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Stable identity (UUID or backend key)
    #[serde(default)]
    pub id: String,

    pub name: String,

    /// GST registration number, when the company has one
    #[serde(default, deserialize_with = "crate::entities::empty_as_none")]
    pub gstin: Option<String>,

    /// First day of the financial year (1 April for most Indian books)
    pub financial_year_start: NaiveDate,

    /// Display prefix for amounts ("₹", "Rs. ")
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Company {
    pub fn new(name: impl Into<String>, financial_year_start: NaiveDate) -> Self {
        Company {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            gstin: None,
            financial_year_start,
            currency_symbol: default_currency_symbol(),
        }
    }

    /// Last day of the financial year that starts on `financial_year_start`
    pub fn financial_year_end(&self) -> NaiveDate {
        self.financial_year_start
            .checked_add_months(chrono::Months::new(12))
            .and_then(|d| d.pred_opt())
            .unwrap_or(self.financial_year_start)
    }

    /// "2024-25" style label
    pub fn financial_year_label(&self) -> String {
        let start = self.financial_year_start.format("%Y").to_string();
        let end = self.financial_year_end().format("%y").to_string();
        format!("{}-{}", start, end)
    }

    pub fn is_gst_registered(&self) -> bool {
        self.gstin.as_deref().is_some_and(|g| !g.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_financial_year() {
        let company = Company::new("Acme Traders", NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());

        assert_eq!(
            company.financial_year_end(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
        );
        assert_eq!(company.financial_year_label(), "2024-25");
        assert_eq!(company.currency_symbol, "₹");
        assert!(!company.is_gst_registered());
    }
}
