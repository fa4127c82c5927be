//! Component metadata extraction and cost-of-goods pricing.
//!
//! The crate turns one distributor keyword-search response into a
//! [`ComponentRecord`] ([`extract`]) and prices that record's packaging
//! variants at a set of target build quantities ([`resolve_pricing`]).
//!
//! Both halves are pure functions over already-fetched payloads. Nothing in
//! here performs I/O, and nothing in here fails a whole batch: a payload that
//! is missing pieces yields a record that is missing the same pieces.

pub mod availability;
mod error;
pub mod extract;
pub mod pricing;
pub mod record;

pub use availability::{NUM_BOARDS, Tier, availability};
pub use error::ExtractError;
pub use extract::{Extraction, extract, extract_with_issues};
pub use pricing::{
    BuildCost, attach_pricing, cheapest, resolve_pricing, select_break, summarize_builds,
};
pub use record::{
    CUT_TAPE_DIGI_REEL, CogsEntry, Commercial, ComponentRecord, Compliance, PackageCogs, Physical,
    PriceBreak, PriceTier,
};
