use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use time::Date;
use tracing::debug;

use super::{from_previous_month, is_placeholder, send, success_body};
use crate::data_source::{FetchError, FetchFuture, QuoteQuery, QuoteSource};
use crate::domain::{parse_exchange_date, previous_month};
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::numeric::normalize;
use crate::{RawRecord, SourceId};

pub const DEFAULT_TWSE_BASE_URL: &str = "https://www.twse.com.tw";

// Column offsets of a STOCK_DAY row:
// date, shares, turnover, open, high, low, close, change, transactions
const DATE_COLUMN: usize = 0;
const HIGH_COLUMN: usize = 4;
const LOW_COLUMN: usize = 5;
const CLOSE_COLUMN: usize = 6;

const STAT_OK: &str = "OK";
const NO_MATCHING_DATA: &str = "沒有符合條件";
const DATE_IN_FUTURE: &str = "大於今日";

/// Adapter for the TWSE monthly `STOCK_DAY` JSON feed.
///
/// Each row is a fixed-position array of strings; the last row of the month
/// is the latest session. A month without rows falls back to the month
/// before it.
#[derive(Clone)]
pub struct TwseAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl TwseAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: DEFAULT_TWSE_BASE_URL.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn endpoint(&self, query: &QuoteQuery, month: Date) -> String {
        format!(
            "{}/exchangeReport/STOCK_DAY?response=json&date={}&stockNo={}",
            self.base_url.trim_end_matches('/'),
            compact_date(month),
            urlencoding::encode(query.stock_id.as_str())
        )
    }

    async fn fetch_month(
        &self,
        query: &QuoteQuery,
        month: Date,
    ) -> Result<Option<RawRecord>, FetchError> {
        let request = HttpRequest::get(self.endpoint(query, month))
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);
        let response = send(self.http_client.as_ref(), request, self.id()).await?;
        let body = success_body(response, self.id())?;
        parse_stock_day(&body)
    }
}

impl QuoteSource for TwseAdapter {
    fn id(&self) -> SourceId {
        SourceId::Twse
    }

    fn fetch<'a>(&'a self, query: &'a QuoteQuery) -> FetchFuture<'a> {
        Box::pin(async move {
            if let Some(record) = self.fetch_month(query, query.session_date).await? {
                return query.check_freshness(record);
            }
            debug!(
                stock_id = %query.stock_id,
                "twse session month is empty, reading the previous month"
            );
            let previous = self.fetch_month(query, previous_month(query.session_date)).await?;
            from_previous_month(previous, query, self.id())
        })
    }
}

#[derive(Debug, Deserialize)]
struct StockDayResponse {
    stat: String,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

/// Extract the latest session from a `STOCK_DAY` body.
///
/// `Ok(None)` means the month lists no sessions. TWSE answers an unknown code
/// and a month with no trading yet with the same "no matching data" stat.
pub(crate) fn parse_stock_day(body: &str) -> Result<Option<RawRecord>, FetchError> {
    let response: StockDayResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::parse(format!("failed to parse twse response: {e}")))?;

    if response.stat.trim() != STAT_OK {
        let stat = response.stat.trim();
        if stat.contains(NO_MATCHING_DATA) {
            return Ok(None);
        }
        if stat.contains(DATE_IN_FUTURE) {
            return Err(FetchError::not_yet_published(format!(
                "twse has not published this session: {stat}"
            )));
        }
        return Err(FetchError::parse(format!("twse returned stat '{stat}'")));
    }

    let Some(row) = response.data.last() else {
        return Ok(None);
    };

    let cells = row.iter().map(cell_text).collect::<Vec<_>>();
    if cells.len() <= CLOSE_COLUMN {
        return Err(FetchError::parse(format!(
            "twse row has {} columns, expected at least {}",
            cells.len(),
            CLOSE_COLUMN + 1
        )));
    }

    if is_placeholder(&cells[CLOSE_COLUMN]) {
        return Err(FetchError::not_yet_published(
            "twse close price is not available yet",
        ));
    }

    let record = RawRecord::new(
        normalize(&cells[HIGH_COLUMN])?,
        normalize(&cells[LOW_COLUMN])?,
        normalize(&cells[CLOSE_COLUMN])?,
        SourceId::Twse,
    );

    Ok(Some(match parse_exchange_date(&cells[DATE_COLUMN]) {
        Some(as_of) => record.with_as_of(as_of),
        None => record,
    }))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn compact_date(date: Date) -> String {
    format!("{:04}{:02}{:02}", date.year(), u8::from(date.month()), date.day())
}
