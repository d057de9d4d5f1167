// Dashboard metrics - headline numbers for the metric cards

use serde::Serialize;

use crate::entities::{Ledger, LedgerGroup, StockItem, Voucher, VoucherType};
use crate::format::Formatter;
use crate::source::RecordSource;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_sales: f64,
    pub total_purchases: f64,
    /// Closing balances of Sundry Debtors
    pub receivables: f64,
    /// Closing balances of Sundry Creditors, as a positive amount
    pub payables: f64,
    /// Cash-in-Hand plus Bank Accounts
    pub cash_balance: f64,
    pub stock_value: f64,
    pub voucher_count: usize,
    pub low_stock_count: usize,
}

impl DashboardMetrics {
    pub fn compute(ledgers: &[Ledger], vouchers: &[Voucher], stock: &[StockItem]) -> Self {
        let mut metrics = DashboardMetrics {
            voucher_count: vouchers.len(),
            ..Default::default()
        };

        for voucher in vouchers {
            match voucher.voucher_type {
                VoucherType::Sales => metrics.total_sales += voucher.amount,
                VoucherType::Purchase => metrics.total_purchases += voucher.amount,
                _ => {}
            }
        }

        for ledger in ledgers {
            match &ledger.group {
                LedgerGroup::SundryDebtors => metrics.receivables += ledger.closing_balance,
                LedgerGroup::SundryCreditors => metrics.payables += ledger.closing_balance.abs(),
                group if group.is_liquid() => metrics.cash_balance += ledger.closing_balance,
                _ => {}
            }
        }

        for item in stock {
            metrics.stock_value += item.value();
            if item.is_low() {
                metrics.low_stock_count += 1;
            }
        }

        metrics
    }

    /// Fetch everything for one company and compute
    pub fn load(source: &dyn RecordSource, company_id: &str) -> Result<Self> {
        let ledgers = source.ledgers(company_id)?;
        let vouchers = source.vouchers(company_id)?;
        let stock = source.stock_items(company_id)?;
        Ok(Self::compute(&ledgers, &vouchers, &stock))
    }

    /// Sales minus purchases
    pub fn gross_margin(&self) -> f64 {
        self.total_sales - self.total_purchases
    }

    /// (label, abbreviated amount) pairs for the amount cards
    pub fn cards(&self, formatter: &Formatter) -> Vec<(&'static str, String)> {
        vec![
            ("Sales", formatter.format(self.total_sales)),
            ("Purchases", formatter.format(self.total_purchases)),
            ("Receivables", formatter.format(self.receivables)),
            ("Payables", formatter.format(self.payables)),
            ("Cash & Bank", formatter.format(self.cash_balance)),
            ("Stock Value", formatter.format(self.stock_value)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixture() -> (Vec<Ledger>, Vec<Voucher>, Vec<StockItem>) {
        let day = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let ledgers = vec![
            Ledger::new("c1", "Sharma & Sons", LedgerGroup::SundryDebtors, 0.0, 2_50_000.0),
            Ledger::new("c1", "Verma Retail", LedgerGroup::SundryDebtors, 0.0, 50_000.0),
            Ledger::new("c1", "Gupta Supplies", LedgerGroup::SundryCreditors, 0.0, -1_20_000.0),
            Ledger::new("c1", "Cash", LedgerGroup::CashInHand, 5_000.0, 15_000.0),
            Ledger::new("c1", "HDFC Current", LedgerGroup::BankAccounts, 0.0, 4_85_000.0),
            Ledger::new("c1", "Sales", LedgerGroup::Sales, 0.0, -12_00_000.0),
        ];
        let vouchers = vec![
            Voucher::new("c1", "SAL/1", VoucherType::Sales, day, 1_00_00_000.0),
            Voucher::new("c1", "SAL/2", VoucherType::Sales, day, 25_00_000.0),
            Voucher::new("c1", "PUR/1", VoucherType::Purchase, day, 40_00_000.0),
            Voucher::new("c1", "RCT/1", VoucherType::Receipt, day, 3_00_000.0),
        ];
        let stock = vec![
            StockItem::new("c1", "A4 Paper", "Box", 100.0, 250.0).with_reorder_level(20.0),
            StockItem::new("c1", "Toner", "Nos", 2.0, 1_900.0).with_reorder_level(5.0),
        ];
        (ledgers, vouchers, stock)
    }

    #[test]
    fn test_compute() {
        let (ledgers, vouchers, stock) = fixture();
        let metrics = DashboardMetrics::compute(&ledgers, &vouchers, &stock);

        assert_eq!(metrics.total_sales, 1_25_00_000.0);
        assert_eq!(metrics.total_purchases, 40_00_000.0);
        assert_eq!(metrics.receivables, 3_00_000.0);
        assert_eq!(metrics.payables, 1_20_000.0);
        assert_eq!(metrics.cash_balance, 5_00_000.0);
        assert_eq!(metrics.stock_value, 28_800.0);
        assert_eq!(metrics.voucher_count, 4);
        assert_eq!(metrics.low_stock_count, 1);
        assert_eq!(metrics.gross_margin(), 85_00_000.0);
    }

    #[test]
    fn test_empty_books() {
        let metrics = DashboardMetrics::compute(&[], &[], &[]);
        assert_eq!(metrics, DashboardMetrics::default());
        assert_eq!(metrics.cards(&Formatter::default())[0], ("Sales", "₹0".to_string()));
    }

    #[test]
    fn test_cards_are_abbreviated() {
        let (ledgers, vouchers, stock) = fixture();
        let metrics = DashboardMetrics::compute(&ledgers, &vouchers, &stock);
        let cards = metrics.cards(&Formatter::default());

        assert_eq!(cards[0], ("Sales", "₹1.25 Cr".to_string()));
        assert_eq!(cards[1], ("Purchases", "₹40.00 L".to_string()));
        assert_eq!(cards[5], ("Stock Value", "₹28.80 K".to_string()));
    }
}
