// Entity Models
//
// Read-only records owned by the backing store. The dashboard renders
// them and never mutates them.

pub mod company;
pub mod ledger;
pub mod stock;
pub mod voucher;

pub use company::Company;
pub use ledger::{Ledger, LedgerGroup};
pub use stock::StockItem;
pub use voucher::{Voucher, VoucherItem, VoucherType};

use serde::{Deserialize, Deserializer};

/// CSV exports write missing optional values as empty cells
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

/// Fill a blank id with a UUID derived from the row's natural key, so the
/// same export imported twice maps onto the same rows
pub(crate) fn ensure_id(id: &mut String, natural_key: &str) {
    if id.trim().is_empty() {
        *id = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, natural_key.as_bytes()).to_string();
    }
}
