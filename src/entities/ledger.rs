// Ledger Entity - an account head in the books, grouped Tally-style

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// LEDGER GROUP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LedgerGroup {
    /// Customers who owe us (receivables)
    SundryDebtors,

    /// Suppliers we owe (payables)
    SundryCreditors,

    CashInHand,
    BankAccounts,
    Sales,
    Purchase,
    DirectExpenses,
    IndirectExpenses,
    DirectIncomes,
    IndirectIncomes,
    Capital,
    DutiesAndTaxes,

    /// Any user-defined group
    Other(String),
}

impl LedgerGroup {
    pub fn as_str(&self) -> &str {
        match self {
            LedgerGroup::SundryDebtors => "Sundry Debtors",
            LedgerGroup::SundryCreditors => "Sundry Creditors",
            LedgerGroup::CashInHand => "Cash-in-Hand",
            LedgerGroup::BankAccounts => "Bank Accounts",
            LedgerGroup::Sales => "Sales Accounts",
            LedgerGroup::Purchase => "Purchase Accounts",
            LedgerGroup::DirectExpenses => "Direct Expenses",
            LedgerGroup::IndirectExpenses => "Indirect Expenses",
            LedgerGroup::DirectIncomes => "Direct Incomes",
            LedgerGroup::IndirectIncomes => "Indirect Incomes",
            LedgerGroup::Capital => "Capital Account",
            LedgerGroup::DutiesAndTaxes => "Duties & Taxes",
            LedgerGroup::Other(name) => name,
        }
    }

    /// Cash-in-Hand and Bank Accounts
    pub fn is_liquid(&self) -> bool {
        matches!(self, LedgerGroup::CashInHand | LedgerGroup::BankAccounts)
    }
}

impl From<String> for LedgerGroup {
    fn from(value: String) -> Self {
        let normalized: String = value
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "sundrydebtors" | "debtors" => LedgerGroup::SundryDebtors,
            "sundrycreditors" | "creditors" => LedgerGroup::SundryCreditors,
            "cashinhand" | "cash" => LedgerGroup::CashInHand,
            "bankaccounts" | "bank" => LedgerGroup::BankAccounts,
            "salesaccounts" | "sales" => LedgerGroup::Sales,
            "purchaseaccounts" | "purchase" | "purchases" => LedgerGroup::Purchase,
            "directexpenses" => LedgerGroup::DirectExpenses,
            "indirectexpenses" => LedgerGroup::IndirectExpenses,
            "directincomes" => LedgerGroup::DirectIncomes,
            "indirectincomes" => LedgerGroup::IndirectIncomes,
            "capitalaccount" | "capital" => LedgerGroup::Capital,
            "dutiestaxes" | "dutiesandtaxes" => LedgerGroup::DutiesAndTaxes,
            _ => LedgerGroup::Other(value.trim().to_string()),
        }
    }
}

impl From<LedgerGroup> for String {
    fn from(group: LedgerGroup) -> Self {
        group.as_str().to_string()
    }
}

impl fmt::Display for LedgerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LEDGER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub id: String,

    pub company_id: String,

    pub name: String,

    #[serde(alias = "ledger_group")]
    pub group: LedgerGroup,

    /// Positive = debit balance, negative = credit balance
    pub opening_balance: f64,

    pub closing_balance: f64,
}

impl Ledger {
    pub fn new(
        company_id: impl Into<String>,
        name: impl Into<String>,
        group: LedgerGroup,
        opening_balance: f64,
        closing_balance: f64,
    ) -> Self {
        Ledger {
            id: uuid::Uuid::new_v4().to_string(),
            company_id: company_id.into(),
            name: name.into(),
            group,
            opening_balance,
            closing_balance,
        }
    }

    pub fn movement(&self) -> f64 {
        self.closing_balance - self.opening_balance
    }

    /// "Dr" for debit balances, "Cr" for credit balances
    pub fn balance_side(&self) -> &'static str {
        if self.closing_balance < 0.0 {
            "Cr"
        } else {
            "Dr"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_parsing() {
        assert_eq!(LedgerGroup::from("Sundry Debtors".to_string()), LedgerGroup::SundryDebtors);
        assert_eq!(LedgerGroup::from("cash-in-hand".to_string()), LedgerGroup::CashInHand);
        assert_eq!(LedgerGroup::from("Duties & Taxes".to_string()), LedgerGroup::DutiesAndTaxes);
        assert_eq!(
            LedgerGroup::from(" Loans (Liability) ".to_string()),
            LedgerGroup::Other("Loans (Liability)".to_string())
        );
    }

    #[test]
    fn test_group_round_trips_display_name() {
        for group in [LedgerGroup::SundryCreditors, LedgerGroup::BankAccounts, LedgerGroup::Capital] {
            assert_eq!(LedgerGroup::from(String::from(group.clone())), group);
        }
    }

    #[test]
    fn test_balance_side() {
        let debtor = Ledger::new("c1", "Sharma & Sons", LedgerGroup::SundryDebtors, 0.0, 15_000.0);
        let creditor = Ledger::new("c1", "Gupta Supplies", LedgerGroup::SundryCreditors, 0.0, -8_000.0);

        assert_eq!(debtor.balance_side(), "Dr");
        assert_eq!(creditor.balance_side(), "Cr");
        assert_eq!(debtor.movement(), 15_000.0);
        assert!(LedgerGroup::BankAccounts.is_liquid());
        assert!(!LedgerGroup::Sales.is_liquid());
    }
}
