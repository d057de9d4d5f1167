// Voucher Entity - one accounting transaction and its line items

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

// ============================================================================
// VOUCHER TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VoucherType {
    Sales,
    Purchase,
    Payment,
    Receipt,
    Journal,
    Contra,
    CreditNote,
    DebitNote,
}

impl VoucherType {
    pub const ALL: [VoucherType; 8] = [
        VoucherType::Sales,
        VoucherType::Purchase,
        VoucherType::Payment,
        VoucherType::Receipt,
        VoucherType::Journal,
        VoucherType::Contra,
        VoucherType::CreditNote,
        VoucherType::DebitNote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherType::Sales => "Sales",
            VoucherType::Purchase => "Purchase",
            VoucherType::Payment => "Payment",
            VoucherType::Receipt => "Receipt",
            VoucherType::Journal => "Journal",
            VoucherType::Contra => "Contra",
            VoucherType::CreditNote => "Credit Note",
            VoucherType::DebitNote => "Debit Note",
        }
    }
}

impl TryFrom<String> for VoucherType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let normalized: String = value
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();

        VoucherType::ALL
            .into_iter()
            .find(|t| t.as_str().to_lowercase().replace(' ', "") == normalized)
            .ok_or_else(|| format!("unknown voucher type '{}'", value))
    }
}

impl From<VoucherType> for String {
    fn from(voucher_type: VoucherType) -> Self {
        voucher_type.as_str().to_string()
    }
}

impl fmt::Display for VoucherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VOUCHER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    #[serde(default)]
    pub id: String,

    pub company_id: String,

    /// Number as printed on the voucher ("SAL/2024/0042")
    pub voucher_number: String,

    pub voucher_type: VoucherType,

    pub date: NaiveDate,

    /// Customer / supplier ledger, when the voucher has a party
    #[serde(default, deserialize_with = "crate::entities::empty_as_none")]
    pub party_ledger_id: Option<String>,

    #[serde(default)]
    pub narration: String,

    /// Voucher total
    pub amount: f64,
}

impl Voucher {
    pub fn new(
        company_id: impl Into<String>,
        voucher_number: impl Into<String>,
        voucher_type: VoucherType,
        date: NaiveDate,
        amount: f64,
    ) -> Self {
        Voucher {
            id: uuid::Uuid::new_v4().to_string(),
            company_id: company_id.into(),
            voucher_number: voucher_number.into(),
            voucher_type,
            date,
            party_ledger_id: None,
            narration: String::new(),
            amount,
        }
    }

    /// Hash for duplicate detection on import.
    /// Identity is `id`; this only says "same voucher content".
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}|{}",
            self.company_id, self.voucher_type, self.voucher_number, self.date, self.amount
        ));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// VOUCHER ITEM
// ============================================================================

/// A voucher line: either a ledger posting or a stock movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherItem {
    #[serde(default)]
    pub id: String,

    pub voucher_id: String,

    #[serde(default, deserialize_with = "crate::entities::empty_as_none")]
    pub ledger_id: Option<String>,

    #[serde(default, deserialize_with = "crate::entities::empty_as_none")]
    pub stock_item_id: Option<String>,

    #[serde(default)]
    pub quantity: f64,

    #[serde(default)]
    pub rate: f64,

    pub amount: f64,
}

impl VoucherItem {
    pub fn is_stock_line(&self) -> bool {
        self.stock_item_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_voucher_type_parsing() {
        assert_eq!(VoucherType::try_from("sales".to_string()), Ok(VoucherType::Sales));
        assert_eq!(VoucherType::try_from("Credit Note".to_string()), Ok(VoucherType::CreditNote));
        assert_eq!(VoucherType::try_from("DEBIT_NOTE".to_string()), Ok(VoucherType::DebitNote));
        assert!(VoucherType::try_from("Memo".to_string()).is_err());
    }

    #[test]
    fn test_idempotency_hash_ignores_identity() {
        let a = Voucher::new("c1", "SAL/1", VoucherType::Sales, date(2024, 4, 2), 1_180.0);
        let mut b = a.clone();
        b.id = uuid::Uuid::new_v4().to_string();
        b.narration = "edited".to_string();

        assert_ne!(a.id, b.id);
        assert_eq!(a.compute_idempotency_hash(), b.compute_idempotency_hash());
        assert_eq!(a.compute_idempotency_hash().len(), 64);

        let c = Voucher::new("c1", "SAL/2", VoucherType::Sales, date(2024, 4, 2), 1_180.0);
        assert_ne!(a.compute_idempotency_hash(), c.compute_idempotency_hash());
    }
}
