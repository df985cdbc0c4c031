use std::sync::Arc;

use time::Date;
use tracing::debug;

use super::{from_previous_month, is_placeholder, send, success_body};
use crate::data_source::{FetchError, FetchFuture, QuoteQuery, QuoteSource};
use crate::domain::{parse_exchange_date, previous_month};
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::numeric::normalize;
use crate::{RawRecord, SourceId};

pub const DEFAULT_TPEX_BASE_URL: &str = "https://www.tpex.org.tw";

const DATE_LABEL: &str = "日期";
const HIGH_LABEL: &str = "最高";
const LOW_LABEL: &str = "最低";
const CLOSE_LABEL: &str = "收盤";

/// Adapter for the TPEx daily trading CSV download.
///
/// The file carries a free-form preamble, a header row naming the columns,
/// the session rows and a trailer. Columns are located by header text. A
/// month without rows falls back to the month before it.
#[derive(Clone)]
pub struct TpexAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl TpexAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: DEFAULT_TPEX_BASE_URL.to_owned(),
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
            "{}/web/stock/aftertrading/daily_trading_info/st43_download.php?l=zh-tw&d={}&stkno={}&s=0,asc,0",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&roc_month(month)),
            urlencoding::encode(query.stock_id.as_str())
        )
    }

    async fn fetch_month(
        &self,
        query: &QuoteQuery,
        month: Date,
    ) -> Result<Option<RawRecord>, FetchError> {
        let request = HttpRequest::get(self.endpoint(query, month))
            .with_header("accept", "text/csv")
            .with_timeout_ms(self.timeout_ms);
        let response = send(self.http_client.as_ref(), request, self.id()).await?;
        let body = success_body(response, self.id())?;
        parse_daily_csv(&body)
    }
}

impl QuoteSource for TpexAdapter {
    fn id(&self) -> SourceId {
        SourceId::Tpex
    }

    fn fetch<'a>(&'a self, query: &'a QuoteQuery) -> FetchFuture<'a> {
        Box::pin(async move {
            if let Some(record) = self.fetch_month(query, query.session_date).await? {
                return query.check_freshness(record);
            }
            debug!(
                stock_id = %query.stock_id,
                "tpex session month is empty, reading the previous month"
            );
            let previous = self.fetch_month(query, previous_month(query.session_date)).await?;
            from_previous_month(previous, query, self.id())
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    high: usize,
    low: usize,
    close: usize,
}

impl Columns {
    fn locate(cells: &[String]) -> Option<Self> {
        let find = |label: &str| cells.iter().position(|cell| cell.contains(label));
        Some(Self {
            date: find(DATE_LABEL)?,
            high: find(HIGH_LABEL)?,
            low: find(LOW_LABEL)?,
            close: find(CLOSE_LABEL)?,
        })
    }

    fn width(self) -> usize {
        self.date.max(self.high).max(self.low).max(self.close) + 1
    }
}

/// Extract the latest session from a TPEx daily trading CSV body.
///
/// `Ok(None)` means the header is present but the month lists no sessions,
/// which is how TPEx answers both an unknown code and a month with no
/// trading yet.
pub(crate) fn parse_daily_csv(body: &str) -> Result<Option<RawRecord>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.trim_start_matches('\u{feff}').as_bytes());

    let mut columns: Option<Columns> = None;
    let mut latest: Option<(Vec<String>, Date)> = None;

    for result in reader.records() {
        let record = result.map_err(|e| FetchError::parse(format!("malformed tpex csv: {e}")))?;
        let cells = record
            .iter()
            .map(|cell| cell.split_whitespace().collect::<String>())
            .collect::<Vec<_>>();

        let Some(layout) = columns else {
            columns = Columns::locate(&cells);
            continue;
        };

        if cells.len() < layout.width() {
            continue;
        }
        // Trailer lines follow the data; only rows starting with a date count.
        if let Some(date) = parse_exchange_date(&cells[layout.date]) {
            latest = Some((cells, date));
        }
    }

    let Some(layout) = columns else {
        return Err(FetchError::parse("tpex csv has no recognizable header row"));
    };
    let Some((cells, as_of)) = latest else {
        return Ok(None);
    };

    if is_placeholder(&cells[layout.close]) {
        return Err(FetchError::not_yet_published(
            "tpex close price is not available yet",
        ));
    }

    Ok(Some(
        RawRecord::new(
            normalize(&cells[layout.high])?,
            normalize(&cells[layout.low])?,
            normalize(&cells[layout.close])?,
            SourceId::Tpex,
        )
        .with_as_of(as_of),
    ))
}

fn roc_month(date: Date) -> String {
    format!("{}/{:02}", date.year() - 1911, u8::from(date.month()))
}
