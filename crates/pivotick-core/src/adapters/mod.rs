//! Upstream adapters, one per response shape.
//!
//! | Adapter | Upstream | Shape |
//! |---------|----------|-------|
//! | [`TwseAdapter`] | TWSE `STOCK_DAY` | indexed-array JSON |
//! | [`TpexAdapter`] | TPEx daily trading download | delimited CSV |
//! | [`GoodinfoAdapter`] | Goodinfo stock detail page | markup table |
//! | [`YahooTwAdapter`] | Yahoo Taiwan quote page | free text |

mod goodinfo;
mod tpex;
mod twse;
mod yahoo_tw;

pub use goodinfo::{GoodinfoAdapter, DEFAULT_GOODINFO_TABLE_SELECTOR};
pub use tpex::TpexAdapter;
pub use twse::TwseAdapter;
pub use yahoo_tw::YahooTwAdapter;

use tracing::debug;

use crate::data_source::{FetchError, FreshnessPolicy, QuoteQuery};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::{RawRecord, SourceId};

/// Execute one upstream call, mapping transport failures to network errors.
async fn send(
    http_client: &dyn HttpClient,
    request: HttpRequest,
    source: SourceId,
) -> Result<HttpResponse, FetchError> {
    debug!(source = %source, url = %request.url, timeout_ms = request.timeout_ms, "requesting upstream");
    http_client.execute(request).await.map_err(|error| {
        if error.timed_out() {
            FetchError::network(format!("{source} request timed out: {}", error.message()))
        } else {
            FetchError::network(format!("{source} transport error: {}", error.message()))
        }
    })
}

/// Body of a 2xx response; any other status is a network failure.
fn success_body(response: HttpResponse, source: SourceId) -> Result<String, FetchError> {
    if !response.is_success() {
        return Err(FetchError::network(format!(
            "{source} upstream returned status {}",
            response.status
        )));
    }
    Ok(response.body)
}

/// Cell text the exchanges use when a session has no value yet (`--`, `—`).
fn is_placeholder(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || trimmed.chars().all(|ch| matches!(ch, '-' | '—' | '－' | '–'))
}

/// Settle a monthly feed whose session month had no rows yet.
///
/// `previous` is the latest row of the month before. Early in a month the
/// session month is legitimately empty, so only two empty months mean the
/// upstream does not know the code.
fn from_previous_month(
    previous: Option<RawRecord>,
    query: &QuoteQuery,
    source: SourceId,
) -> Result<RawRecord, FetchError> {
    let Some(record) = previous else {
        return Err(FetchError::no_such_identifier(format!(
            "{source} lists no sessions for {} in this or the previous month",
            query.stock_id
        )));
    };
    if query.freshness == FreshnessPolicy::RequireSessionDate {
        return Err(FetchError::not_yet_published(format!(
            "{source} has no rows for the month of {} yet",
            query.session_date
        )));
    }
    Ok(record)
}
