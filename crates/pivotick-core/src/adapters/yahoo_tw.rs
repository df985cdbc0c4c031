use std::sync::{Arc, LazyLock};

use regex::Regex;
use scraper::Html;

use super::{is_placeholder, send, success_body};
use crate::data_source::{FetchError, FetchFuture, QuoteQuery, QuoteSource};
use crate::domain::parse_exchange_date;
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::numeric::normalize;
use crate::{RawRecord, SourceId};

pub const DEFAULT_YAHOO_TW_BASE_URL: &str = "https://tw.stock.yahoo.com";

const NOT_FOUND_STATUS: u16 = 404;
const NOT_FOUND_MARKERS: [&str; 3] = ["查無", "找不到", "不存在"];

// Each label is matched against the value immediately following it, so
// "成交量" (volume) never satisfies the "成交" (last price) label.
const VALUE_PATTERN: &str = r"\s*[:：]?\s*(--|－－|[+\-]?[\d,，．.]+)";

static HIGH_PATTERN: LazyLock<Regex> = LazyLock::new(|| labelled("最高"));
static LOW_PATTERN: LazyLock<Regex> = LazyLock::new(|| labelled("最低"));
static CLOSE_PATTERNS: LazyLock<[Regex; 2]> =
    LazyLock::new(|| [labelled("成交"), labelled("收盤")]);
static AS_OF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"資料時間\s*[:：]?\s*(\d{4}[/-]\d{1,2}[/-]\d{1,2})")
        .expect("Invalid regex pattern")
});

fn labelled(label: &str) -> Regex {
    Regex::new(&format!("{label}{VALUE_PATTERN}")).expect("Invalid regex pattern")
}

/// Adapter reading the Yahoo Taiwan quote page as plain text.
#[derive(Clone)]
pub struct YahooTwAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl YahooTwAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: DEFAULT_YAHOO_TW_BASE_URL.to_owned(),
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

    fn endpoint(&self, query: &QuoteQuery) -> String {
        format!(
            "{}/quote/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query.stock_id.as_str())
        )
    }
}

impl QuoteSource for YahooTwAdapter {
    fn id(&self) -> SourceId {
        SourceId::YahooTw
    }

    fn fetch<'a>(&'a self, query: &'a QuoteQuery) -> FetchFuture<'a> {
        Box::pin(async move {
            let request = HttpRequest::get(self.endpoint(query))
                .with_header("accept", "text/html")
                .with_timeout_ms(self.timeout_ms);
            let response = send(self.http_client.as_ref(), request, self.id()).await?;
            if response.status == NOT_FOUND_STATUS {
                return Err(FetchError::no_such_identifier(format!(
                    "yahoo_tw has no quote page for {}",
                    query.stock_id
                )));
            }
            let body = success_body(response, self.id())?;
            let record = parse_quote_page(&body)?;
            query.check_freshness(record)
        })
    }
}

/// Extract high/low/close from the visible text of a quote page.
pub(crate) fn parse_quote_page(body: &str) -> Result<RawRecord, FetchError> {
    let text = visible_text(&Html::parse_document(body));

    let high = capture(&HIGH_PATTERN, &text);
    let low = capture(&LOW_PATTERN, &text);
    let close = CLOSE_PATTERNS.iter().find_map(|pattern| capture(pattern, &text));

    let (Some(high), Some(low), Some(close)) = (high, low, close) else {
        if NOT_FOUND_MARKERS.iter().any(|marker| text.contains(marker)) {
            return Err(FetchError::no_such_identifier(
                "yahoo_tw reports no such stock code",
            ));
        }
        return Err(FetchError::parse(
            "yahoo_tw page has no high/low/close labels",
        ));
    };

    if is_placeholder(&close) {
        return Err(FetchError::not_yet_published(
            "yahoo_tw close price is not available yet",
        ));
    }

    let record = RawRecord::new(
        normalize(&high)?,
        normalize(&low)?,
        normalize(&close)?,
        SourceId::YahooTw,
    );

    Ok(match capture(&AS_OF_PATTERN, &text).and_then(|raw| parse_exchange_date(&raw)) {
        Some(as_of) => record.with_as_of(as_of),
        None => record,
    })
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_owned())
}

fn visible_text(document: &Html) -> String {
    document
        .root_element()
        .descendants()
        .filter(|node| {
            node.parent()
                .and_then(|parent| parent.value().as_element())
                .map_or(true, |element| !matches!(element.name(), "script" | "style" | "noscript"))
        })
        .filter_map(|node| node.value().as_text().map(|text| text.trim().to_owned()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
