use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pcb_cogs::{ComponentRecord, ExtractError, Tier, attach_pricing, availability};
use pcb_digikey::{KeywordSearch, SearchBody};
use serde::Serialize;

use crate::bom::BomLine;

/// How a BOM line was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LineStatus {
    Matched,
    NoMatch,
    /// The search never produced a usable payload.
    Failed {
        status: Option<u16>,
        reason: String,
    },
}

impl LineStatus {
    /// Stable identifier, matching the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            LineStatus::Matched => "matched",
            LineStatus::NoMatch => "no-match",
            LineStatus::Failed { .. } => "failed",
        }
    }

    pub fn label(&self) -> String {
        match self {
            LineStatus::Matched => "matched".to_string(),
            LineStatus::NoMatch => "no match".to_string(),
            LineStatus::Failed {
                status: Some(status),
                ..
            } => format!("failed ({status})"),
            LineStatus::Failed { status: None, .. } => "failed".to_string(),
        }
    }
}

/// A BOM line together with everything learned about it.
#[derive(Debug, Clone)]
pub struct ReportLine {
    pub keyword: String,
    pub per_board_qty: u64,
    pub record: ComponentRecord,
    pub status: LineStatus,
    pub issues: Vec<ExtractError>,
}

impl ReportLine {
    pub fn availability(&self) -> Tier {
        availability(self.record.commercial.quantity_available, self.per_board_qty)
    }
}

/// Resolve every BOM line in order, one search at a time.
///
/// No per-line failure aborts the run: a line whose search fails keeps a
/// record carrying only its designators.
pub fn resolve_lines<S: KeywordSearch + ?Sized>(
    source: &S,
    lines: &[BomLine],
    quantities: &[u64],
) -> Vec<ReportLine> {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{pos}/{len}]") {
        spinner.set_style(style);
    }
    spinner.set_length(lines.len() as u64);

    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        spinner.set_message(format!("Fetching {}", line.keyword));
        resolved.push(resolve_line(source, line, quantities));
        spinner.inc(1);
    }

    spinner.finish_and_clear();
    resolved
}

pub fn resolve_line<S: KeywordSearch + ?Sized>(
    source: &S,
    line: &BomLine,
    quantities: &[u64],
) -> ReportLine {
    let per_board_qty = line.per_board_qty();
    let failed = |status: Option<u16>, reason: String| ReportLine {
        keyword: line.keyword.clone(),
        per_board_qty,
        record: ComponentRecord::unmatched(line.designators.clone()),
        status: LineStatus::Failed { status, reason },
        issues: Vec::new(),
    };

    let outcome = match source.keyword_search(&line.keyword) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("{e}");
            return failed(None, e.to_string());
        }
    };

    let payload = match (&outcome.body, outcome.payload()) {
        (_, Some(payload)) => payload,
        (SearchBody::Json(body), None) => {
            log::error!(
                "Search for '{}' returned {}: {body}",
                line.keyword,
                outcome.status
            );
            return failed(Some(outcome.status), body.to_string());
        }
        (SearchBody::Text(body), None) => {
            log::error!(
                "Search for '{}' returned {}: {body}",
                line.keyword,
                outcome.status
            );
            let reason = if outcome.is_success() {
                "response was not JSON".to_string()
            } else {
                body.clone()
            };
            return failed(Some(outcome.status), reason);
        }
    };

    let extraction = pcb_cogs::extract_with_issues(payload);
    let status = if extraction.has_match() {
        LineStatus::Matched
    } else {
        log::warn!("No exact match for '{}'", line.keyword);
        LineStatus::NoMatch
    };

    let mut record = extraction.record;
    record.associated_refdes = line.designators.clone();
    if !quantities.is_empty() && per_board_qty > 0 {
        attach_pricing(&mut record, per_board_qty, quantities);
    }

    ReportLine {
        keyword: line.keyword.clone(),
        per_board_qty,
        record,
        status,
        issues: extraction.issues,
    }
}
