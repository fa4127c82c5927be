use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display name for a merged Cut Tape + Digi-Reel packaging variant.
pub const CUT_TAPE_DIGI_REEL: &str = "Cut Tape (CT) & Digi-Reel";

/// One BOM line item resolved to a distributor part.
///
/// Only `associated_refdes` is guaranteed to be populated. A line whose
/// keyword had no exact match keeps every other field empty, see
/// [`ComponentRecord::is_sparse`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub associated_refdes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_part_number: Option<String>,
    #[serde(default)]
    pub commercial: Commercial,
    #[serde(default)]
    pub physical: Physical,
    #[serde(default)]
    pub compliance: Compliance,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pricing: Vec<PriceTier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cogs: Vec<PackageCogs>,
}

impl ComponentRecord {
    /// Record for a line with no resolved part.
    pub fn unmatched(associated_refdes: Vec<String>) -> Self {
        Self {
            associated_refdes,
            ..Default::default()
        }
    }

    /// True when nothing beyond the reference designators is known.
    pub fn is_sparse(&self) -> bool {
        *self == Self::unmatched(self.associated_refdes.clone())
    }

    /// Reference designators in their source form ("R1,R2,R5").
    pub fn refdes_joined(&self) -> String {
        self.associated_refdes.join(",")
    }

    /// Category names from root to leaf, joined for display.
    pub fn category_display(&self) -> Option<String> {
        if self.category_path.is_empty() {
            None
        } else {
            Some(self.category_path.join(" > "))
        }
    }
}

/// Sourcing and lifecycle data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Commercial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_available: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_of_life: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discontinued: Option<bool>,
}

/// Package and mechanical parameters picked out of the free-form parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Physical {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_case: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_device_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_temp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
}

/// Environmental and trade classification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Compliance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rohs_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture_sensitivity_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reach_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_control_class_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htsus_code: Option<String>,
}

/// Price break: at least `quantity` units cost `unit_price` each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreak {
    pub quantity: u64,
    pub unit_price: Decimal,
}

impl PriceBreak {
    pub fn new(quantity: u64, unit_price: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
        }
    }
}

/// One packaging variant of a part and its price breaks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceTier {
    pub package_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributor_part_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_order_quantity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_available: Option<u64>,
    pub breaks: Vec<PriceBreak>, // ascending by quantity
}

impl PriceTier {
    pub fn new(package_type: impl Into<String>, breaks: Vec<PriceBreak>) -> Self {
        Self {
            package_type: package_type.into(),
            breaks,
            ..Default::default()
        }
    }
}

/// COGS row for one packaging variant at one build quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CogsEntry {
    pub pcb_quantity: u64,
    pub part_quantity: u64,
    pub break_quantity: u64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub below_minimum_order: bool,
}

/// COGS breakdown for one packaging variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCogs {
    pub package_type: String,
    pub entries: Vec<CogsEntry>,
}

impl PackageCogs {
    pub fn entry_for(&self, pcb_quantity: u64) -> Option<&CogsEntry> {
        self.entries.iter().find(|e| e.pcb_quantity == pcb_quantity)
    }
}
