//! Component report generation for a bill of materials.
//!
//! Each BOM line is searched on Digi-Key, turned into a
//! [`pcb_cogs::ComponentRecord`], priced at the requested build quantities and
//! rendered into an HTML or JSON bundle that is zipped for archiving.

pub mod archive;
pub mod bom;
pub mod config;
pub mod format;
pub mod pipeline;
pub mod report;
pub mod summary;

pub use bom::{BomError, BomLine, parse_bom_csv, read_bom};
pub use config::{Overrides, ReportConfig, Settings};
pub use pipeline::{LineStatus, ReportLine, resolve_lines};
pub use report::{OutputFormat, Report, ReportOutput, write_report};
