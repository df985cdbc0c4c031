use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use super::{is_placeholder, send, success_body};
use crate::data_source::{FetchError, FetchFuture, QuoteQuery, QuoteSource};
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::numeric::normalize;
use crate::{RawRecord, SourceId};

pub const DEFAULT_GOODINFO_BASE_URL: &str = "https://goodinfo.tw";
pub const DEFAULT_GOODINFO_TABLE_SELECTOR: &str = "table.b1.p4_2.r10.box_shadow";

// Price summary row: the label cell reads "最高" and the row carries
// high, low and (six cells in) close.
const SUMMARY_ROW_LABEL: &str = "最高";
const SUMMARY_MIN_CELLS: usize = 7;
const SUMMARY_HIGH_CELL: usize = 1;
const SUMMARY_LOW_CELL: usize = 2;
const SUMMARY_CLOSE_CELL: usize = 6;

const HIGH_LABEL: &str = "最高";
const LOW_LABEL: &str = "最低";
const CLOSE_LABELS: [&str; 2] = ["收盤", "成交價"];
const NOT_FOUND_MARKERS: [&str; 2] = ["查無", "不存在"];

/// Adapter scraping the price table of the Goodinfo stock detail page.
#[derive(Clone)]
pub struct GoodinfoAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    table_selector: String,
    timeout_ms: u64,
}

impl GoodinfoAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: DEFAULT_GOODINFO_BASE_URL.to_owned(),
            table_selector: DEFAULT_GOODINFO_TABLE_SELECTOR.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the CSS selector locating the price table.
    pub fn with_table_selector(mut self, selector: impl Into<String>) -> Self {
        self.table_selector = selector.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn endpoint(&self, query: &QuoteQuery) -> String {
        format!(
            "{}/tw/StockDetail.asp?STOCK_ID={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query.stock_id.as_str())
        )
    }
}

impl QuoteSource for GoodinfoAdapter {
    fn id(&self) -> SourceId {
        SourceId::Goodinfo
    }

    fn fetch<'a>(&'a self, query: &'a QuoteQuery) -> FetchFuture<'a> {
        Box::pin(async move {
            let request = HttpRequest::get(self.endpoint(query))
                .with_header("referer", DEFAULT_GOODINFO_BASE_URL)
                .with_timeout_ms(self.timeout_ms);
            let response = send(self.http_client.as_ref(), request, self.id()).await?;
            let body = success_body(response, self.id())?;
            let record = parse_detail_page(&body, &self.table_selector)?;
            query.check_freshness(record)
        })
    }
}

/// Extract high/low/close from the Goodinfo detail page markup.
///
/// The summary-row layout is tried first; otherwise every row is scanned for
/// label cells followed by their value.
pub(crate) fn parse_detail_page(body: &str, table_selector: &str) -> Result<RawRecord, FetchError> {
    let table_selector = compile(table_selector)?;
    let row_selector = compile("tr")?;
    let cell_selector = compile("td, th")?;

    let document = Html::parse_document(body);
    let Some(table) = document.select(&table_selector).next() else {
        if NOT_FOUND_MARKERS.iter().any(|marker| body.contains(marker)) {
            return Err(FetchError::no_such_identifier(
                "goodinfo reports no such stock code",
            ));
        }
        return Err(FetchError::parse(
            "goodinfo price table marker not found",
        ));
    };

    let rows = table
        .select(&row_selector)
        .map(|row| row_cells(row, &cell_selector))
        .collect::<Vec<_>>();

    let (high, low, close) = summary_row(&rows)
        .or_else(|| labelled_cells(&rows))
        .ok_or_else(|| FetchError::parse("goodinfo price table has no high/low/close fields"))?;

    if is_placeholder(&close) {
        return Err(FetchError::not_yet_published(
            "goodinfo close price is not available yet",
        ));
    }

    Ok(RawRecord::new(
        normalize(&high)?,
        normalize(&low)?,
        normalize(&close)?,
        SourceId::Goodinfo,
    ))
}

fn compile(selector: &str) -> Result<Selector, FetchError> {
    Selector::parse(selector)
        .map_err(|e| FetchError::parse(format!("invalid selector '{selector}': {e}")))
}

fn row_cells(row: ElementRef<'_>, cell_selector: &Selector) -> Vec<String> {
    row.select(cell_selector)
        .map(|cell| cell.text().collect::<String>().trim().to_owned())
        .collect()
}

fn summary_row(rows: &[Vec<String>]) -> Option<(String, String, String)> {
    rows.iter()
        .find(|cells| cells.len() >= SUMMARY_MIN_CELLS && cells[0].contains(SUMMARY_ROW_LABEL))
        .map(|cells| {
            (
                cells[SUMMARY_HIGH_CELL].clone(),
                cells[SUMMARY_LOW_CELL].clone(),
                cells[SUMMARY_CLOSE_CELL].clone(),
            )
        })
}

fn labelled_cells(rows: &[Vec<String>]) -> Option<(String, String, String)> {
    let value_after = |labels: &[&str]| {
        rows.iter().find_map(|cells| {
            cells
                .windows(2)
                .find(|pair| labels.iter().any(|label| pair[0].starts_with(label)))
                .map(|pair| pair[1].clone())
        })
    };

    Some((
        value_after(&[HIGH_LABEL])?,
        value_after(&[LOW_LABEL])?,
        value_after(&CLOSE_LABELS)?,
    ))
}
