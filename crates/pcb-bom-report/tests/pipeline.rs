use std::cell::Cell;
use std::collections::HashMap;
use std::fs::{self, File};

use pcb_bom_report::{
    LineStatus, OutputFormat, Report, parse_bom_csv, resolve_lines, write_report,
};
use pcb_cogs::CUT_TAPE_DIGI_REEL;
use pcb_digikey::{KeywordSearch, SearchError, SearchOutcome};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const RESISTOR: &str = include_str!("../../pcb-cogs/tests/fixtures/keyword_search_resistor.json");
const PARTIAL: &str = include_str!("../../pcb-cogs/tests/fixtures/keyword_search_partial.json");
const NO_MATCH: &str = include_str!("../../pcb-cogs/tests/fixtures/keyword_search_no_match.json");

const BOM: &str = "\
Manufacturer Part Number,Designator,Description
RC0603FR-0710KL,\"R1,R2,R3,R4\",10k resistor
STM32F103C8T6,U1,MCU
NOT-A-PART,J1,Connector
FLAKY-PART,\"C1, C2\",Decoupling
";

/// Serves canned payloads; unknown keywords get a 503.
struct FixtureSource {
    responses: HashMap<&'static str, &'static str>,
    calls: Cell<usize>,
}

impl FixtureSource {
    fn new() -> Self {
        Self {
            responses: HashMap::from([
                ("RC0603FR-0710KL", RESISTOR),
                ("STM32F103C8T6", PARTIAL),
                ("NOT-A-PART", NO_MATCH),
            ]),
            calls: Cell::new(0),
        }
    }
}

impl KeywordSearch for FixtureSource {
    fn keyword_search(&self, keyword: &str) -> Result<SearchOutcome, SearchError> {
        self.calls.set(self.calls.get() + 1);
        Ok(match self.responses.get(keyword) {
            Some(body) => SearchOutcome::new(200, body.to_string()),
            None => SearchOutcome::new(503, "Service Unavailable".to_string()),
        })
    }
}

#[test]
fn test_bom_to_records() {
    let lines = parse_bom_csv(BOM).unwrap();
    let source = FixtureSource::new();
    let resolved = resolve_lines(&source, &lines, &[10, 100]);

    assert_eq!(source.calls.get(), 4);
    assert_eq!(resolved.len(), 4);

    let resistor = &resolved[0];
    assert_eq!(resistor.status, LineStatus::Matched);
    assert_eq!(resistor.per_board_qty, 4);
    assert_eq!(resistor.record.refdes_joined(), "R1,R2,R3,R4");
    let cut_tape = resistor
        .record
        .cogs
        .iter()
        .find(|c| c.package_type == CUT_TAPE_DIGI_REEL)
        .unwrap();
    assert_eq!(cut_tape.entry_for(10).unwrap().total_price, dec!(0.88));

    let mcu = &resolved[1];
    assert_eq!(mcu.status, LineStatus::Matched);
    assert_eq!(mcu.issues.len(), 2);
    assert!(mcu.record.cogs.is_empty());

    assert_eq!(resolved[2].status, LineStatus::NoMatch);
    assert!(resolved[2].record.is_sparse());

    let flaky = &resolved[3];
    assert!(matches!(
        flaky.status,
        LineStatus::Failed {
            status: Some(503),
            ..
        }
    ));
    assert_eq!(flaky.record.associated_refdes, vec!["C1", "C2"]);
}

#[test]
fn test_build_costs_skip_unpriced_lines() {
    let lines = parse_bom_csv(BOM).unwrap();
    let resolved = resolve_lines(&FixtureSource::new(), &lines, &[10, 100]);
    let report = Report::new(&resolved, &[10, 100], "USD");

    assert_eq!(report.builds.len(), 2);
    assert_eq!(report.builds[0].total, dec!(0.88));
    assert_eq!(report.builds[0].priced_lines, 1);
    assert_eq!(report.builds[0].unpriced_lines, 3);
    assert_eq!(report.builds[1].total, dec!(4.36));
}

#[test]
fn test_json_bundle() {
    let temp = tempfile::tempdir().unwrap();
    let lines = parse_bom_csv(BOM).unwrap();
    let resolved = resolve_lines(&FixtureSource::new(), &lines, &[10]);
    let report = Report::new(&resolved, &[10], "USD");

    let output = write_report(&report, OutputFormat::Json, temp.path(), None).unwrap();
    let contents = fs::read_to_string(output.bundle_dir.join("components.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();

    let components = json["components"].as_array().unwrap();
    assert_eq!(components.len(), 4);
    assert_eq!(components[0]["manufacturer_part_number"], "RC0603FR-0710KL");
    assert_eq!(components[0]["availability"], "plenty");
    assert_eq!(components[2]["status"]["kind"], "no-match");
    assert_eq!(components[3]["status"]["kind"], "failed");
    let total: Decimal = json["builds"][0]["total"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, dec!(0.88));

    let archive = zip::ZipArchive::new(File::open(&output.archive).unwrap()).unwrap();
    assert!(
        archive
            .file_names()
            .any(|name| name == "component_report/components.json")
    );
}

#[test]
fn test_html_bundle() {
    let temp = tempfile::tempdir().unwrap();
    let lines = parse_bom_csv(BOM).unwrap();
    let resolved = resolve_lines(&FixtureSource::new(), &lines, &[]);
    let report = Report::new(&resolved, &[], "USD");

    let output = write_report(&report, OutputFormat::Html, temp.path(), None).unwrap();
    let html = fs::read_to_string(output.bundle_dir.join("index.html")).unwrap();

    assert!(html.contains("RC0603FR-0710KL"));
    assert!(html.contains("Cut Tape (CT) &amp; Digi-Reel"));
    assert!(html.contains("Integrated Circuits (ICs) &gt; Embedded &gt; Microcontrollers"));
    assert!(html.contains("NOT-A-PART"));
    assert!(!html.contains("Build cost"));
}
