//! Read-only access to the bookkeeping records.
//!
//! Screens never talk to a store directly. They hold a [`Fetch`] per
//! collection and ask a [`RecordSource`] to fill it.

use crate::entities::{Company, Ledger, StockItem, Voucher, VoucherItem};
use crate::error::Result;

/// Read-only queries against the backing store
pub trait RecordSource {
    fn companies(&self) -> Result<Vec<Company>>;

    fn ledgers(&self, company_id: &str) -> Result<Vec<Ledger>>;

    /// Newest first
    fn vouchers(&self, company_id: &str) -> Result<Vec<Voucher>>;

    fn voucher_items(&self, voucher_id: &str) -> Result<Vec<VoucherItem>>;

    fn stock_items(&self, company_id: &str) -> Result<Vec<StockItem>>;
}

/// Loading state of one collection
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Loading,
    Ready(Vec<T>),
    Failed(String),
}

impl<T> Default for Fetch<T> {
    fn default() -> Self {
        Fetch::Loading
    }
}

impl<T> Fetch<T> {
    /// Run a query and capture its outcome
    pub fn from_result(result: Result<Vec<T>>) -> Self {
        match result {
            Ok(rows) => Fetch::Ready(rows),
            Err(e) => {
                tracing::warn!(error = %e, "query failed");
                Fetch::Failed(e.to_string())
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Fetch::Loading)
    }

    /// Rows when ready, otherwise an empty slice
    pub fn data(&self) -> &[T] {
        match self {
            Fetch::Ready(rows) => rows,
            Fetch::Loading | Fetch::Failed(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Fetch::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_fetch_states() {
        let loading: Fetch<u32> = Fetch::default();
        assert!(loading.is_loading());
        assert!(loading.data().is_empty());

        let ready = Fetch::from_result(Ok(vec![1, 2, 3]));
        assert!(!ready.is_loading());
        assert_eq!(ready.data(), &[1, 2, 3]);
        assert_eq!(ready.error(), None);

        let failed: Fetch<u32> = Fetch::from_result(Err(Error::Remote("timed out".to_string())));
        assert!(failed.data().is_empty());
        assert_eq!(failed.error(), Some("remote store error: timed out"));
    }
}
