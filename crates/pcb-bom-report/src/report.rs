use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use minijinja::{Environment, context};
use pcb_cogs::{BuildCost, ComponentRecord, cheapest, summarize_builds};
use serde::Serialize;

use crate::archive;
use crate::format::{format_number_with_commas, format_price, format_unit_price};
use crate::pipeline::{LineStatus, ReportLine};

pub const BUNDLE_DIR: &str = "component_report";
pub const ARCHIVE_NAME: &str = "component_report.zip";

const HTML_TEMPLATE: &str = include_str!("templates/index.html.jinja");
const CSS_STYLES: &str = include_str!("templates/style.css");

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

/// Resolved lines plus the build summary derived from them.
#[derive(Debug)]
pub struct Report<'a> {
    pub lines: &'a [ReportLine],
    pub quantities: &'a [u64],
    pub currency: &'a str,
    pub builds: Vec<BuildCost>,
}

impl<'a> Report<'a> {
    pub fn new(lines: &'a [ReportLine], quantities: &'a [u64], currency: &'a str) -> Self {
        Self {
            lines,
            quantities,
            currency,
            builds: summarize_builds(lines.iter().map(|l| &l.record), quantities),
        }
    }
}

/// Paths produced by [`write_report`].
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub bundle_dir: PathBuf,
    pub archive: PathBuf,
}

/// Write the report bundle under `output_path` and zip it next to the bundle.
pub fn write_report(
    report: &Report,
    format: OutputFormat,
    output_path: &Path,
    assets: Option<&Path>,
) -> Result<ReportOutput> {
    let bundle_dir = output_path.join(BUNDLE_DIR);
    fs::create_dir_all(&bundle_dir)
        .with_context(|| format!("Failed to create {}", bundle_dir.display()))?;

    match format {
        OutputFormat::Html => {
            if let Some(assets) = assets {
                archive::extract_zip(assets, &bundle_dir)?;
            }
            let html = render_html(report)?;
            write_file(&bundle_dir.join("index.html"), &html)?;
            write_file(&bundle_dir.join("style.css"), CSS_STYLES)?;
        }
        OutputFormat::Json => {
            if assets.is_some() {
                log::warn!("--assets is ignored for JSON output");
            }
            let json = render_json(report)?;
            write_file(&bundle_dir.join("components.json"), &json)?;
        }
    }

    let archive_path = output_path.join(ARCHIVE_NAME);
    archive::zip_directory(&bundle_dir, &archive_path)
        .with_context(|| format!("Failed to zip {}", bundle_dir.display()))?;

    Ok(ReportOutput {
        bundle_dir,
        archive: archive_path,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn render_html(report: &Report) -> Result<String> {
    let mut env = Environment::new();
    // The .html name turns on HTML auto-escaping
    env.add_template("index.html", HTML_TEMPLATE)
        .context("Failed to add HTML template")?;

    let template = env.get_template("index.html")?;

    let components: Vec<ComponentView> = report
        .lines
        .iter()
        .map(|line| ComponentView::new(line, report.currency))
        .collect();
    let builds: Vec<BuildView> = report
        .builds
        .iter()
        .map(|b| BuildView::new(b, report.currency))
        .collect();
    let unresolved = report
        .lines
        .iter()
        .filter(|l| l.status != LineStatus::Matched)
        .count();
    let version = env!("CARGO_PKG_VERSION");

    let html = template
        .render(context! {
            components,
            builds,
            quantities => report.quantities,
            currency => report.currency,
            unresolved,
            version,
        })
        .context("Failed to render HTML template")?;

    Ok(html)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generator: String,
    currency: &'a str,
    quantities: &'a [u64],
    components: Vec<JsonComponent<'a>>,
    builds: &'a [BuildCost],
}

#[derive(Serialize)]
struct JsonComponent<'a> {
    keyword: &'a str,
    per_board_qty: u64,
    status: &'a LineStatus,
    availability: pcb_cogs::Tier,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<String>,
    #[serde(flatten)]
    record: &'a ComponentRecord,
}

pub fn render_json(report: &Report) -> Result<String> {
    let components = report
        .lines
        .iter()
        .map(|line| JsonComponent {
            keyword: &line.keyword,
            per_board_qty: line.per_board_qty,
            status: &line.status,
            availability: line.availability(),
            issues: line.issues.iter().map(|i| i.to_string()).collect(),
            record: &line.record,
        })
        .collect();

    let json = JsonReport {
        generator: format!("pcb-bom-report {}", env!("CARGO_PKG_VERSION")),
        currency: report.currency,
        quantities: report.quantities,
        components,
        builds: &report.builds,
    };
    serde_json::to_string_pretty(&json).context("Failed to serialize report")
}

#[derive(Serialize)]
struct Detail {
    label: &'static str,
    value: String,
}

fn details(pairs: &[(&'static str, &Option<String>)]) -> Vec<Detail> {
    pairs
        .iter()
        .filter_map(|&(label, value)| {
            value.as_ref().map(|v| Detail {
                label,
                value: v.clone(),
            })
        })
        .collect()
}

#[derive(Serialize)]
struct ComponentView {
    refdes: String,
    per_board_qty: u64,
    keyword: String,
    status: String,
    status_kind: &'static str,
    matched: bool,
    description: Option<String>,
    detailed_description: Option<String>,
    manufacturer: Option<String>,
    mpn: Option<String>,
    photo_url: Option<String>,
    datasheet_url: Option<String>,
    product_url: Option<String>,
    stock: Option<String>,
    availability: &'static str,
    lifecycle: Option<String>,
    end_of_life: Option<bool>,
    discontinued: Option<bool>,
    category: Option<String>,
    physical: Vec<Detail>,
    compliance: Vec<Detail>,
    pricing: Vec<TierView>,
    cogs: Vec<CogsView>,
    issues: Vec<String>,
}

impl ComponentView {
    fn new(line: &ReportLine, currency: &str) -> Self {
        let record = &line.record;
        let physical = &record.physical;
        let compliance = &record.compliance;

        let physical = details(&[
            ("Package / Case", &physical.package_case),
            ("Supplier Device Package", &physical.supplier_device_package),
            ("Operating Temperature", &physical.operating_temp),
            ("Size / Dimension", &physical.xy_size),
            ("Height", &physical.height),
            ("Thickness", &physical.thickness),
            ("Ratings", &physical.ratings),
            ("Grade", &physical.grade),
            ("Qualification", &physical.qualification),
        ]);
        let compliance = details(&[
            ("RoHS", &compliance.rohs_status),
            ("Moisture Sensitivity", &compliance.moisture_sensitivity_level),
            ("REACH", &compliance.reach_status),
            ("ECCN", &compliance.export_control_class_number),
            ("HTSUS", &compliance.htsus_code),
        ]);

        let cogs = record
            .cogs
            .iter()
            .map(|package| CogsView {
                package: package.package_type.clone(),
                rows: package
                    .entries
                    .iter()
                    .map(|e| CogsRowView {
                        pcb_quantity: format_number_with_commas(e.pcb_quantity),
                        part_quantity: format_number_with_commas(e.part_quantity),
                        break_quantity: format_number_with_commas(e.break_quantity),
                        unit_price: format_unit_price(e.unit_price, currency),
                        total_price: format_price(e.total_price, currency),
                        below_minimum_order: e.below_minimum_order,
                        cheapest: cheapest(record, e.pcb_quantity)
                            .is_some_and(|(pkg, _)| pkg == package.package_type),
                    })
                    .collect(),
            })
            .collect();

        Self {
            refdes: record.refdes_joined(),
            per_board_qty: line.per_board_qty,
            keyword: line.keyword.clone(),
            status: line.status.label(),
            status_kind: line.status.kind(),
            matched: line.status == LineStatus::Matched,
            description: record.description.clone(),
            detailed_description: record.detailed_description.clone(),
            manufacturer: record.manufacturer.clone(),
            mpn: record.manufacturer_part_number.clone(),
            photo_url: record.commercial.photo_url.clone(),
            datasheet_url: record.commercial.datasheet_url.clone(),
            product_url: record.commercial.product_url.clone(),
            stock: record
                .commercial
                .quantity_available
                .map(format_number_with_commas),
            availability: line.availability().as_str(),
            lifecycle: record.commercial.lifecycle_status.clone(),
            end_of_life: record.commercial.end_of_life,
            discontinued: record.commercial.discontinued,
            category: record.category_display(),
            physical,
            compliance,
            pricing: record
                .pricing
                .iter()
                .map(|tier| TierView {
                    package: tier.package_type.clone(),
                    part_number: tier.distributor_part_number.clone(),
                    minimum_order: tier.minimum_order_quantity.map(format_number_with_commas),
                    breaks: tier
                        .breaks
                        .iter()
                        .map(|b| BreakView {
                            quantity: format_number_with_commas(b.quantity),
                            unit_price: format_unit_price(b.unit_price, currency),
                        })
                        .collect(),
                })
                .collect(),
            cogs,
            issues: line.issues.iter().map(|i| i.to_string()).collect(),
        }
    }
}

#[derive(Serialize)]
struct TierView {
    package: String,
    part_number: Option<String>,
    minimum_order: Option<String>,
    breaks: Vec<BreakView>,
}

#[derive(Serialize)]
struct BreakView {
    quantity: String,
    unit_price: String,
}

#[derive(Serialize)]
struct CogsView {
    package: String,
    rows: Vec<CogsRowView>,
}

#[derive(Serialize)]
struct CogsRowView {
    pcb_quantity: String,
    part_quantity: String,
    break_quantity: String,
    unit_price: String,
    total_price: String,
    below_minimum_order: bool,
    cheapest: bool,
}

#[derive(Serialize)]
struct BuildView {
    pcb_quantity: String,
    total: String,
    per_board: Option<String>,
    priced_lines: usize,
    unpriced_lines: usize,
}

impl BuildView {
    fn new(build: &BuildCost, currency: &str) -> Self {
        Self {
            pcb_quantity: format_number_with_commas(build.pcb_quantity),
            total: format_price(build.total, currency),
            per_board: build.per_board().map(|p| format_price(p, currency)),
            priced_lines: build.priced_lines,
            unpriced_lines: build.unpriced_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcb_cogs::{PriceBreak, PriceTier, attach_pricing};
    use rust_decimal_macros::dec;

    fn matched_line() -> ReportLine {
        let mut record = ComponentRecord::unmatched(vec!["R1".into(), "R2".into()]);
        record.manufacturer = Some("YAGEO".into());
        record.manufacturer_part_number = Some("RC0603FR-0710KL".into());
        record.description = Some("RES 10K <0603>".into());
        record.commercial.quantity_available = Some(1_000_000);
        record.physical.package_case = Some("0603 (1608 Metric)".into());
        record.pricing = vec![PriceTier::new(
            "Cut Tape (CT)",
            vec![
                PriceBreak::new(1, dec!(1.00)),
                PriceBreak::new(10, dec!(0.80)),
                PriceBreak::new(100, dec!(0.50)),
            ],
        )];
        attach_pricing(&mut record, 2, &[1, 10, 100]);

        ReportLine {
            keyword: "RC0603FR-0710KL".into(),
            per_board_qty: 2,
            record,
            status: LineStatus::Matched,
            issues: Vec::new(),
        }
    }

    fn failed_line() -> ReportLine {
        ReportLine {
            keyword: "MYSTERY".into(),
            per_board_qty: 1,
            record: ComponentRecord::unmatched(vec!["U9".into()]),
            status: LineStatus::Failed {
                status: Some(503),
                reason: "Service Unavailable".into(),
            },
            issues: Vec::new(),
        }
    }

    #[test]
    fn test_build_summary() {
        let lines = vec![matched_line(), failed_line()];
        let report = Report::new(&lines, &[1, 10, 100], "USD");
        let totals: Vec<_> = report.builds.iter().map(|b| b.total).collect();
        assert_eq!(totals, vec![dec!(2.00), dec!(16.00), dec!(100.00)]);
        assert!(report.builds.iter().all(|b| b.unpriced_lines == 1));
    }

    #[test]
    fn test_render_html() {
        let lines = vec![matched_line(), failed_line()];
        let report = Report::new(&lines, &[1, 10, 100], "USD");
        let html = render_html(&report).unwrap();

        assert!(html.contains("RC0603FR-0710KL"));
        assert!(html.contains("R1,R2"));
        assert!(html.contains("$16.00"));
        assert!(html.contains("0603 (1608 Metric)"));
        assert!(html.contains("failed (503)"));
        assert!(html.contains(r#"class="status status-failed""#));
        assert!(html.contains(r#"class="status status-matched""#));
        // Distributor text is escaped
        assert!(html.contains("RES 10K &lt;0603&gt;"));
        assert!(!html.contains("RES 10K <0603>"));
    }

    #[test]
    fn test_render_json() {
        let lines = vec![matched_line(), failed_line()];
        let report = Report::new(&lines, &[10], "USD");
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&report).unwrap()).unwrap();

        let first = &json["components"][0];
        assert_eq!(first["status"]["kind"], "matched");
        assert_eq!(first["availability"], "plenty");
        assert_eq!(first["associated_refdes"][1], "R2");
        assert_eq!(first["cogs"][0]["entries"][0]["total_price"], "16.00");

        let second = &json["components"][1];
        assert_eq!(second["status"]["kind"], "failed");
        assert_eq!(second["status"]["status"], 503);
        assert_eq!(json["builds"][0]["unpriced_lines"], 1);
    }

    #[test]
    fn test_write_report_bundles() {
        let temp = tempfile::tempdir().unwrap();
        let lines = vec![matched_line()];
        let report = Report::new(&lines, &[10], "USD");

        let html = write_report(&report, OutputFormat::Html, temp.path(), None).unwrap();
        assert!(html.bundle_dir.join("index.html").exists());
        assert!(html.bundle_dir.join("style.css").exists());
        assert!(html.archive.exists());

        let json_dir = temp.path().join("json");
        let json = write_report(&report, OutputFormat::Json, &json_dir, None).unwrap();
        assert!(json.bundle_dir.join("components.json").exists());
        assert_eq!(json.archive, json_dir.join(ARCHIVE_NAME));
    }
}
