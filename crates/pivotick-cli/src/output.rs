use std::fmt::Write as _;

use pivotick_core::{PivotBands, Resolution, ResolutionOutcome};

use crate::cli::OutputFormat;
use crate::commands::{ClassificationReport, PivotsReport, Report, SourcesReport};
use crate::error::CliError;

pub fn render(report: &Report, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(report)?
            } else {
                serde_json::to_string(report)?
            };
            println!("{payload}");
        }
        OutputFormat::Text => println!("{}", render_text(report)),
    }

    Ok(())
}

/// Chat-reply rendering of a report.
pub fn render_text(report: &Report) -> String {
    match report {
        Report::Quote(outcome) => outcome_text(outcome),
        Report::Pivots(pivots) => pivots_text(pivots),
        Report::Classification(classification) => classification_text(classification),
        Report::Sources(sources) => sources_text(sources),
    }
}

fn outcome_text(outcome: &ResolutionOutcome) -> String {
    match outcome {
        ResolutionOutcome::Success(resolution) => resolution_text(resolution),
        ResolutionOutcome::MarketNotYetPublished { .. } => {
            String::from("⏳ 今日行情尚未更新，請稍後再試。")
        }
        ResolutionOutcome::NotFound { .. } => String::from("⚠️ 查無此股票代號，請確認後再試。"),
        ResolutionOutcome::UpstreamError { .. } => {
            String::from("⚠️ 資料來源暫時無法連線，請稍後再試。")
        }
        ResolutionOutcome::InvalidInput { error } => {
            format!("⚠️ 請輸入數字股票代號（{error}）")
        }
    }
}

fn resolution_text(resolution: &Resolution) -> String {
    let record = &resolution.record;
    let mut text = format!(
        "📌 {} 今日行情\n📉 收盤：{}\n📈 高點：{}\n📉 低點：{}\n\n",
        resolution.stock_id,
        record.close(),
        record.high(),
        record.low()
    );
    text.push_str(&bands_text(&resolution.bands));
    let _ = write!(text, "\n🔎 資料來源：{}", resolution.source);
    if let Some(as_of) = record.as_of() {
        let _ = write!(text, "（{as_of}）");
    }
    text
}

fn pivots_text(pivots: &PivotsReport) -> String {
    let mut text = format!(
        "📉 收盤：{}\n📈 高點：{}\n📉 低點：{}\n\n",
        pivots.close, pivots.high, pivots.low
    );
    text.push_str(&bands_text(&pivots.bands));
    text
}

fn bands_text(bands: &PivotBands) -> String {
    format!(
        "📊 明日撐壓（{}，CDP {}）\n🔺 強壓：{}\n🔻 弱壓：{}\n🔻 弱撐：{}\n🔽 強撐：{}",
        bands.variant, bands.cdp, bands.ah, bands.nh, bands.nl, bands.al
    )
}

fn classification_text(classification: &ClassificationReport) -> String {
    let priority = classification
        .priority
        .iter()
        .map(|source| source.as_str())
        .collect::<Vec<_>>()
        .join(" → ");
    format!(
        "{}: {} ({})",
        classification.stock_id, classification.affiliation, priority
    )
}

fn sources_text(sources: &SourcesReport) -> String {
    sources
        .boards
        .iter()
        .map(|board| {
            let entries = board
                .sources
                .iter()
                .map(|entry| {
                    if entry.registered {
                        entry.id.as_str().to_owned()
                    } else {
                        format!("{} (unregistered)", entry.id)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{:<10} {entries}", board.affiliation.as_str())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
