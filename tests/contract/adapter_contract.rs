//! Contract every upstream adapter honours: parse its captured fixture into
//! a record that passes validation, and classify transport and structure
//! failures the same way.

use std::sync::Arc;

use pivotick_core::{
    validate, FetchErrorKind, GoodinfoAdapter, HttpError, HttpResponse, MarketAffiliation,
    QuoteQuery, QuoteSource, SourceId, StaticHttpClient, StockId, TpexAdapter, TwseAdapter,
    YahooTwAdapter,
};
use time::macros::date;

const TWSE_FIXTURE: &str = include_str!("../fixtures/twse_stock_day_2330.json");
const TPEX_FIXTURE: &str = include_str!("../fixtures/tpex_st43_5274.csv");
const GOODINFO_FIXTURE: &str = include_str!("../fixtures/goodinfo_stock_detail_2454.html");
const YAHOO_FIXTURE: &str = include_str!("../fixtures/yahoo_tw_quote_2330.html");

const ANY_URL: &str = "https://";

struct AdapterCase {
    id: SourceId,
    stock_id: &'static str,
    affiliation: MarketAffiliation,
    fixture: &'static str,
    expected: (f64, f64, f64),
}

fn adapter_cases() -> Vec<AdapterCase> {
    vec![
        AdapterCase {
            id: SourceId::Twse,
            stock_id: "2330",
            affiliation: MarketAffiliation::Primary,
            fixture: TWSE_FIXTURE,
            expected: (582.0, 574.0, 576.0),
        },
        AdapterCase {
            id: SourceId::Tpex,
            stock_id: "5274",
            affiliation: MarketAffiliation::Secondary,
            fixture: TPEX_FIXTURE,
            expected: (2415.0, 2340.0, 2400.0),
        },
        AdapterCase {
            id: SourceId::Goodinfo,
            stock_id: "2454",
            affiliation: MarketAffiliation::Primary,
            fixture: GOODINFO_FIXTURE,
            expected: (1085.0, 1060.0, 1080.0),
        },
        AdapterCase {
            id: SourceId::YahooTw,
            stock_id: "2330",
            affiliation: MarketAffiliation::Primary,
            fixture: YAHOO_FIXTURE,
            expected: (582.0, 574.0, 576.0),
        },
    ]
}

fn adapter(id: SourceId, http_client: Arc<StaticHttpClient>) -> Arc<dyn QuoteSource> {
    match id {
        SourceId::Twse => Arc::new(TwseAdapter::new(http_client)),
        SourceId::Tpex => Arc::new(TpexAdapter::new(http_client)),
        SourceId::Goodinfo => Arc::new(GoodinfoAdapter::new(http_client)),
        SourceId::YahooTw => Arc::new(YahooTwAdapter::new(http_client)),
    }
}

fn query(case: &AdapterCase) -> QuoteQuery {
    QuoteQuery::new(
        StockId::parse(case.stock_id).expect("valid stock id"),
        case.affiliation,
        date!(2024 - 01 - 05),
    )
}

#[tokio::test]
async fn every_adapter_parses_its_fixture_into_a_valid_record() {
    for case in adapter_cases() {
        let client = Arc::new(
            StaticHttpClient::new().with_route(ANY_URL, HttpResponse::ok(case.fixture)),
        );
        let source = adapter(case.id, client.clone());
        assert_eq!(source.id(), case.id);

        let raw = source
            .fetch(&query(&case))
            .await
            .unwrap_or_else(|error| panic!("adapter '{}' failed on its fixture: {error}", case.id));
        assert_eq!(raw.source, case.id, "adapter '{}': source tag", case.id);
        assert_eq!(
            (raw.high, raw.low, raw.close),
            case.expected,
            "adapter '{}': high/low/close",
            case.id
        );

        let record = validate(raw).unwrap_or_else(|error| {
            panic!("adapter '{}' produced an invalid record: {error}", case.id)
        });
        assert!(record.low() <= record.close() && record.close() <= record.high());

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1, "adapter '{}': one upstream call", case.id);
        assert!(
            requests[0].url.contains(case.stock_id),
            "adapter '{}': url carries the stock id",
            case.id
        );
        assert!(requests[0].timeout_ms > 0, "adapter '{}': bounded timeout", case.id);
    }
}

#[tokio::test]
async fn every_adapter_reports_server_errors_as_network_failures() {
    for case in adapter_cases() {
        let client = Arc::new(StaticHttpClient::new().with_route(
            ANY_URL,
            HttpResponse::with_status(503, "Service Unavailable"),
        ));

        let error = adapter(case.id, client)
            .fetch(&query(&case))
            .await
            .expect_err("503 must fail");
        assert_eq!(error.kind(), FetchErrorKind::Network, "adapter '{}'", case.id);
        assert!(error.kind().retryable_later());
    }
}

#[tokio::test]
async fn every_adapter_reports_timeouts_as_network_failures() {
    for case in adapter_cases() {
        let client = Arc::new(
            StaticHttpClient::new().with_failure(ANY_URL, HttpError::timeout("deadline elapsed")),
        );

        let error = adapter(case.id, client)
            .fetch(&query(&case))
            .await
            .expect_err("timeout must fail");
        assert_eq!(error.kind(), FetchErrorKind::Network, "adapter '{}'", case.id);
        assert!(error.message().contains("timed out"), "adapter '{}'", case.id);
    }
}

#[tokio::test]
async fn every_adapter_reports_unrecognized_bodies_as_parse_failures() {
    for case in adapter_cases() {
        let client = Arc::new(StaticHttpClient::new().with_route(
            ANY_URL,
            HttpResponse::ok("<html><body>系統維護中，請稍後再試</body></html>"),
        ));

        let error = adapter(case.id, client)
            .fetch(&query(&case))
            .await
            .expect_err("maintenance page must fail");
        assert_eq!(error.kind(), FetchErrorKind::Parse, "adapter '{}'", case.id);
        assert!(!error.kind().retryable_later());
    }
}
