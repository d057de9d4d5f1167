use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::entities::{
    ensure_id, Company, Ledger, LedgerGroup, StockItem, Voucher, VoucherItem, VoucherType,
};
use crate::error::{Error, Result};
use crate::source::RecordSource;

/// CSV files read by [`import_dir`], in dependency order
pub const COMPANIES_CSV: &str = "companies.csv";
pub const LEDGERS_CSV: &str = "ledgers.csv";
pub const STOCK_ITEMS_CSV: &str = "stock_items.csv";
pub const VOUCHERS_CSV: &str = "vouchers.csv";
pub const VOUCHER_ITEMS_CSV: &str = "voucher_items.csv";

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS companies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            gstin TEXT,
            financial_year_start TEXT NOT NULL,
            currency_symbol TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ledgers (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            name TEXT NOT NULL,
            ledger_group TEXT NOT NULL,
            opening_balance REAL NOT NULL,
            closing_balance REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vouchers (
            id TEXT PRIMARY KEY,
            idempotency_hash TEXT UNIQUE NOT NULL,
            company_id TEXT NOT NULL,
            voucher_number TEXT NOT NULL,
            voucher_type TEXT NOT NULL,
            date TEXT NOT NULL,
            party_ledger_id TEXT,
            narration TEXT NOT NULL,
            amount REAL NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS voucher_items (
            id TEXT PRIMARY KEY,
            voucher_id TEXT NOT NULL,
            ledger_id TEXT,
            stock_item_id TEXT,
            quantity REAL NOT NULL,
            rate REAL NOT NULL,
            amount REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stock_items (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL,
            name TEXT NOT NULL,
            unit TEXT NOT NULL,
            quantity REAL NOT NULL,
            rate REAL NOT NULL,
            reorder_level REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ledgers_company ON ledgers(company_id);
        CREATE INDEX IF NOT EXISTS idx_vouchers_company_date ON vouchers(company_id, date);
        CREATE INDEX IF NOT EXISTS idx_voucher_items_voucher ON voucher_items(voucher_id);
        CREATE INDEX IF NOT EXISTS idx_stock_company ON stock_items(company_id);",
    )?;

    Ok(())
}

// ============================================================================
// CSV IMPORT
// ============================================================================

/// Rows inserted and skipped for one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCount {
    pub inserted: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub companies: ImportCount,
    pub ledgers: ImportCount,
    pub stock_items: ImportCount,
    pub vouchers: ImportCount,
    pub voucher_items: ImportCount,
}

impl ImportSummary {
    pub fn total_inserted(&self) -> usize {
        self.companies.inserted
            + self.ledgers.inserted
            + self.stock_items.inserted
            + self.vouchers.inserted
            + self.voucher_items.inserted
    }
}

pub fn load_csv<T: DeserializeOwned>(csv_path: &Path) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let rows = rdr.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    debug!(path = %csv_path.display(), rows = rows.len(), "loaded CSV");

    Ok(rows)
}

/// Import every known CSV present in `dir`. Missing files are skipped.
pub fn import_dir(conn: &Connection, dir: &Path) -> Result<ImportSummary> {
    if !dir.is_dir() {
        return Err(Error::NotFound {
            kind: "import directory",
            id: dir.display().to_string(),
        });
    }

    let mut summary = ImportSummary::default();

    if let Some(rows) = load_optional::<Company>(&dir.join(COMPANIES_CSV))? {
        summary.companies = insert_companies(conn, &rows)?;
    }
    if let Some(rows) = load_optional::<Ledger>(&dir.join(LEDGERS_CSV))? {
        summary.ledgers = insert_ledgers(conn, &rows)?;
    }
    if let Some(rows) = load_optional::<StockItem>(&dir.join(STOCK_ITEMS_CSV))? {
        summary.stock_items = insert_stock_items(conn, &rows)?;
    }
    if let Some(rows) = load_optional::<Voucher>(&dir.join(VOUCHERS_CSV))? {
        summary.vouchers = insert_vouchers(conn, &rows)?;
    }
    if let Some(rows) = load_optional::<VoucherItem>(&dir.join(VOUCHER_ITEMS_CSV))? {
        summary.voucher_items = insert_voucher_items(conn, &rows)?;
    }

    info!(
        inserted = summary.total_inserted(),
        vouchers = summary.vouchers.inserted,
        duplicate_vouchers = summary.vouchers.duplicates,
        "import finished"
    );

    Ok(summary)
}

fn load_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>> {
    if !path.exists() {
        warn!(path = %path.display(), "CSV not found, skipping");
        return Ok(None);
    }
    load_csv(path).map(Some)
}

/// Count a row as inserted, or as a duplicate on a constraint violation
fn track(count: &mut ImportCount, result: rusqlite::Result<usize>) -> Result<()> {
    match result {
        Ok(0) => count.duplicates += 1,
        Ok(_) => count.inserted += 1,
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            count.duplicates += 1;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub fn insert_companies(conn: &Connection, companies: &[Company]) -> Result<ImportCount> {
    let mut count = ImportCount::default();

    for company in companies {
        let mut company = company.clone();
        ensure_id(
            &mut company.id,
            &format!("company|{}|{}", company.name, company.financial_year_start),
        );

        let result = conn.execute(
            "INSERT INTO companies (id, name, gstin, financial_year_start, currency_symbol)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                company.id,
                company.name,
                company.gstin,
                company.financial_year_start.to_string(),
                company.currency_symbol,
            ],
        );
        track(&mut count, result)?;
    }

    Ok(count)
}

pub fn insert_ledgers(conn: &Connection, ledgers: &[Ledger]) -> Result<ImportCount> {
    let mut count = ImportCount::default();

    for ledger in ledgers {
        let mut ledger = ledger.clone();
        ensure_id(&mut ledger.id, &format!("ledger|{}|{}", ledger.company_id, ledger.name));

        let result = conn.execute(
            "INSERT INTO ledgers (id, company_id, name, ledger_group, opening_balance, closing_balance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ledger.id,
                ledger.company_id,
                ledger.name,
                ledger.group.as_str(),
                ledger.opening_balance,
                ledger.closing_balance,
            ],
        );
        track(&mut count, result)?;
    }

    Ok(count)
}

pub fn insert_stock_items(conn: &Connection, items: &[StockItem]) -> Result<ImportCount> {
    let mut count = ImportCount::default();

    for item in items {
        let mut item = item.clone();
        ensure_id(&mut item.id, &format!("stock|{}|{}", item.company_id, item.name));

        let result = conn.execute(
            "INSERT INTO stock_items (id, company_id, name, unit, quantity, rate, reorder_level)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.id,
                item.company_id,
                item.name,
                item.unit,
                item.quantity,
                item.rate,
                item.reorder_level,
            ],
        );
        track(&mut count, result)?;
    }

    Ok(count)
}

/// Vouchers are deduplicated on content, not only on id
pub fn insert_vouchers(conn: &Connection, vouchers: &[Voucher]) -> Result<ImportCount> {
    let mut count = ImportCount::default();

    for voucher in vouchers {
        let mut voucher = voucher.clone();
        let hash = voucher.compute_idempotency_hash();
        ensure_id(&mut voucher.id, &format!("voucher|{}", hash));

        let result = conn.execute(
            "INSERT INTO vouchers (
                id, idempotency_hash, company_id, voucher_number, voucher_type,
                date, party_ledger_id, narration, amount
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                voucher.id,
                hash,
                voucher.company_id,
                voucher.voucher_number,
                voucher.voucher_type.as_str(),
                voucher.date.to_string(),
                voucher.party_ledger_id,
                voucher.narration,
                voucher.amount,
            ],
        );
        track(&mut count, result)?;
    }

    debug!(inserted = count.inserted, duplicates = count.duplicates, "vouchers imported");
    Ok(count)
}

/// Identical lines within one voucher are told apart by their position
pub fn insert_voucher_items(conn: &Connection, items: &[VoucherItem]) -> Result<ImportCount> {
    let mut count = ImportCount::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for item in items {
        let mut item = item.clone();
        let content = format!(
            "item|{}|{}|{}|{}|{}|{}",
            item.voucher_id,
            item.ledger_id.as_deref().unwrap_or(""),
            item.stock_item_id.as_deref().unwrap_or(""),
            item.quantity,
            item.rate,
            item.amount,
        );
        let occurrence = seen.entry(content.clone()).or_insert(0);
        *occurrence += 1;
        ensure_id(&mut item.id, &format!("{}|{}", content, occurrence));

        let result = conn.execute(
            "INSERT INTO voucher_items (id, voucher_id, ledger_id, stock_item_id, quantity, rate, amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.id,
                item.voucher_id,
                item.ledger_id,
                item.stock_item_id,
                item.quantity,
                item.rate,
                item.amount,
            ],
        );
        track(&mut count, result)?;
    }

    Ok(count)
}

pub fn verify_count(conn: &Connection, table: &str) -> Result<i64> {
    // Table names cannot be bound as parameters
    let table = match table {
        "companies" | "ledgers" | "vouchers" | "voucher_items" | "stock_items" => table,
        other => {
            return Err(Error::NotFound {
                kind: "table",
                id: other.to_string(),
            })
        }
    };

    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;

    Ok(count)
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn parse_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn company_from_row(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        gstin: row.get(2)?,
        financial_year_start: parse_date(row, 3)?,
        currency_symbol: row.get(4)?,
    })
}

fn ledger_from_row(row: &Row) -> rusqlite::Result<Ledger> {
    let group: String = row.get(3)?;
    Ok(Ledger {
        id: row.get(0)?,
        company_id: row.get(1)?,
        name: row.get(2)?,
        group: LedgerGroup::from(group),
        opening_balance: row.get(4)?,
        closing_balance: row.get(5)?,
    })
}

fn voucher_from_row(row: &Row) -> rusqlite::Result<Voucher> {
    let voucher_type: String = row.get(3)?;
    let voucher_type = VoucherType::try_from(voucher_type)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;

    Ok(Voucher {
        id: row.get(0)?,
        company_id: row.get(1)?,
        voucher_number: row.get(2)?,
        voucher_type,
        date: parse_date(row, 4)?,
        party_ledger_id: row.get(5)?,
        narration: row.get(6)?,
        amount: row.get(7)?,
    })
}

fn voucher_item_from_row(row: &Row) -> rusqlite::Result<VoucherItem> {
    Ok(VoucherItem {
        id: row.get(0)?,
        voucher_id: row.get(1)?,
        ledger_id: row.get(2)?,
        stock_item_id: row.get(3)?,
        quantity: row.get(4)?,
        rate: row.get(5)?,
        amount: row.get(6)?,
    })
}

fn stock_item_from_row(row: &Row) -> rusqlite::Result<StockItem> {
    Ok(StockItem {
        id: row.get(0)?,
        company_id: row.get(1)?,
        name: row.get(2)?,
        unit: row.get(3)?,
        quantity: row.get(4)?,
        rate: row.get(5)?,
        reorder_level: row.get(6)?,
    })
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// Local SQLite copy of the books
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        info!(path = %path.display(), "opened SQLite store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn import_dir(&self, dir: &Path) -> Result<ImportSummary> {
        import_dir(&self.conn, dir)
    }

    pub fn company(&self, company_id: &str) -> Result<Company> {
        self.companies()?
            .into_iter()
            .find(|c| c.id == company_id)
            .ok_or_else(|| Error::NotFound {
                kind: "company",
                id: company_id.to_string(),
            })
    }

    fn query<T>(
        &self,
        sql: &str,
        param: Option<&str>,
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = match param {
            Some(p) => stmt.query_map([p], map)?.collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt.query_map([], map)?.collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
    }
}

impl RecordSource for SqliteStore {
    fn companies(&self) -> Result<Vec<Company>> {
        self.query(
            "SELECT id, name, gstin, financial_year_start, currency_symbol
             FROM companies ORDER BY name",
            None,
            company_from_row,
        )
    }

    fn ledgers(&self, company_id: &str) -> Result<Vec<Ledger>> {
        self.query(
            "SELECT id, company_id, name, ledger_group, opening_balance, closing_balance
             FROM ledgers WHERE company_id = ?1 ORDER BY ledger_group, name",
            Some(company_id),
            ledger_from_row,
        )
    }

    fn vouchers(&self, company_id: &str) -> Result<Vec<Voucher>> {
        self.query(
            "SELECT id, company_id, voucher_number, voucher_type, date,
                    party_ledger_id, narration, amount
             FROM vouchers WHERE company_id = ?1 ORDER BY date DESC, voucher_number DESC",
            Some(company_id),
            voucher_from_row,
        )
    }

    fn voucher_items(&self, voucher_id: &str) -> Result<Vec<VoucherItem>> {
        self.query(
            "SELECT id, voucher_id, ledger_id, stock_item_id, quantity, rate, amount
             FROM voucher_items WHERE voucher_id = ?1 ORDER BY rowid",
            Some(voucher_id),
            voucher_item_from_row,
        )
    }

    fn stock_items(&self, company_id: &str) -> Result<Vec<StockItem>> {
        self.query(
            "SELECT id, company_id, name, unit, quantity, rate, reorder_level
             FROM stock_items WHERE company_id = ?1 ORDER BY name",
            Some(company_id),
            stock_item_from_row,
        )
    }
}
