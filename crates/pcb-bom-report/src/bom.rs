use std::path::Path;

/// Headers that name the manufacturer part number, in lookup order.
pub const KEYWORD_HEADERS: &[&str] = &[
    "Manufacturer Part Number",
    "MPN",
    "Part Number",
    "Mfr Part Number",
];

pub const DESIGNATOR_HEADER: &str = "Designator";

/// One BOM row: a group of reference designators sharing a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomLine {
    pub keyword: String,
    pub designators: Vec<String>,
}

impl BomLine {
    /// Parts used per assembled board.
    pub fn per_board_qty(&self) -> u64 {
        self.designators.len() as u64
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BomError {
    #[error("BOM has no 'Designator' column")]
    MissingDesignatorColumn,

    #[error("BOM has no header row")]
    MissingHeader,

    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub fn read_bom(path: &Path) -> Result<Vec<BomLine>, BomError> {
    let content = std::fs::read_to_string(path)?;
    parse_bom_csv(&content)
}

/// Parse a comma-delimited BOM with a header row.
pub fn parse_bom_csv(csv_content: &str) -> Result<Vec<BomLine>, BomError> {
    // Spreadsheet exports often lead with a byte-order mark
    let csv_content = csv_content.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_content.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(BomError::MissingHeader);
    }
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let refdes_col = find(DESIGNATOR_HEADER).ok_or(BomError::MissingDesignatorColumn)?;
    let keyword_col = KEYWORD_HEADERS.iter().find_map(|h| find(*h)).unwrap_or(0);
    log::debug!(
        "BOM keyword column '{}', designator column {refdes_col}",
        &headers[keyword_col]
    );

    let mut lines = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        // Header is row 1
        let row = idx + 2;
        let keyword = record.get(keyword_col).unwrap_or("").trim();
        if keyword.is_empty() {
            log::warn!("Skipping BOM row {row}: no part number");
            continue;
        }

        let designators = split_designators(record.get(refdes_col).unwrap_or(""));
        if designators.is_empty() {
            log::warn!("BOM row {row} ({keyword}) has no designators");
        }

        lines.push(BomLine {
            keyword: keyword.to_string(),
            designators,
        });
    }

    Ok(lines)
}

/// Split a designator cell such as `"R1, R2,R3"`.
pub fn split_designators(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}
