use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, Table};
use pcb_cogs::{Tier, cheapest};

use crate::format::{format_number_with_commas, format_price};
use crate::pipeline::{LineStatus, ReportLine};
use crate::report::Report;

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::Plenty => Color::Green,
        Tier::Limited => Color::Yellow,
        Tier::Insufficient => Color::Red,
    }
}

/// One row per BOM line: part, stock tier and cheapest price at the smallest build.
pub fn lines_table(report: &Report) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);

    let first_qty = report.quantities.first().copied();
    let mut header = vec!["Designators", "Part", "Manufacturer", "Stock", "Status"];
    if first_qty.is_some() {
        header.push("Best option");
    }
    table.set_header(header);

    for line in report.lines {
        let record = &line.record;
        let tier = line.availability();
        let stock = record
            .commercial
            .quantity_available
            .map(format_number_with_commas)
            .unwrap_or_else(|| "-".to_string());
        let status = match &line.status {
            LineStatus::Matched => Cell::new(line.status.label()),
            _ => Cell::new(line.status.label()).fg(Color::Red),
        };

        let mut row = vec![
            Cell::new(record.refdes_joined()),
            Cell::new(
                record
                    .manufacturer_part_number
                    .as_deref()
                    .unwrap_or(&line.keyword),
            ),
            Cell::new(record.manufacturer.as_deref().unwrap_or("-")),
            Cell::new(stock).fg(tier_color(tier)),
            status,
        ];
        if let Some(qty) = first_qty {
            let best = cheapest(record, qty)
                .map(|(package, entry)| {
                    format!(
                        "{} ({package})",
                        format_price(entry.total_price, report.currency)
                    )
                })
                .unwrap_or_else(|| "-".to_string());
            row.push(Cell::new(best));
        }
        table.add_row(row);
    }

    table
}

/// Build totals per PCB quantity, or `None` when no quantities were requested.
pub fn builds_table(report: &Report) -> Option<Table> {
    if report.builds.is_empty() {
        return None;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table.set_header(vec!["PCBs", "Total", "Per board", "Unpriced lines"]);

    for build in &report.builds {
        let unpriced = Cell::new(build.unpriced_lines.to_string());
        table.add_row(vec![
            Cell::new(format_number_with_commas(build.pcb_quantity)),
            Cell::new(format_price(build.total, report.currency)).fg(Color::Cyan),
            Cell::new(
                build
                    .per_board()
                    .map(|p| format_price(p, report.currency))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            if build.unpriced_lines > 0 {
                unpriced.fg(Color::Yellow)
            } else {
                unpriced
            },
        ]);
    }

    Some(table)
}

/// Lines whose data is incomplete, for the closing warning.
pub fn unresolved(lines: &[ReportLine]) -> Vec<&ReportLine> {
    lines
        .iter()
        .filter(|l| l.status != LineStatus::Matched)
        .collect()
}
