//! Hosted backend client.
//!
//! Talks to a PostgREST-style endpoint (`/rest/v1/<table>`) with an API key.
//! Read-only: only GET requests are ever issued.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::entities::{Company, Ledger, StockItem, Voucher, VoucherItem};
use crate::error::{Error, Result};
use crate::source::RecordSource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RestSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestSource {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Remote(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// `{base}/rest/v1/{table}?select=*&{column}=eq.{value}&order={order}`
    pub fn table_url(&self, table: &str, filter: Option<(&str, &str)>, order: Option<&str>) -> String {
        let mut url = format!("{}/rest/v1/{}?select=*", self.base_url, table);
        if let Some((column, value)) = filter {
            url.push_str(&format!("&{}=eq.{}", column, urlencoding::encode(value)));
        }
        if let Some(order) = order {
            url.push_str(&format!("&order={}", order));
        }
        url
    }

    fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        debug!(%url, "remote query");

        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|e| Error::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Remote(format!("{} from {}: {}", status, url, body)));
        }

        response
            .json::<Vec<T>>()
            .map_err(|e| Error::Remote(format!("invalid response from {}: {}", url, e)))
    }
}

impl RecordSource for RestSource {
    fn companies(&self) -> Result<Vec<Company>> {
        self.fetch(&self.table_url("companies", None, Some("name.asc")))
    }

    fn ledgers(&self, company_id: &str) -> Result<Vec<Ledger>> {
        self.fetch(&self.table_url("ledgers", Some(("company_id", company_id)), Some("name.asc")))
    }

    fn vouchers(&self, company_id: &str) -> Result<Vec<Voucher>> {
        self.fetch(&self.table_url("vouchers", Some(("company_id", company_id)), Some("date.desc")))
    }

    fn voucher_items(&self, voucher_id: &str) -> Result<Vec<VoucherItem>> {
        self.fetch(&self.table_url("voucher_items", Some(("voucher_id", voucher_id)), None))
    }

    fn stock_items(&self, company_id: &str) -> Result<Vec<StockItem>> {
        self.fetch(&self.table_url("stock_items", Some(("company_id", company_id)), Some("name.asc")))
    }
}
