//! Search response → [`ComponentRecord`] extraction.
//!
//! The distributor payload is third-party data with no schema guarantees, so
//! every lookup here is fallible and every failure is local: a missing or
//! mistyped key empties the field it feeds and is recorded as an
//! [`ExtractError`], then extraction carries on with the next field.
//!
//! Scalar fields carry an explicit absence policy ([`Presence`]). `Expected`
//! fields are ones every well-formed exact match has, so their absence is
//! logged as a malformed payload. `Optional` fields are ones the distributor
//! legitimately omits. A JSON `null` always reads as "not provided".

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ExtractError;
use crate::record::{
    CUT_TAPE_DIGI_REEL, Commercial, ComponentRecord, Compliance, Physical, PriceBreak, PriceTier,
};

/// Longest category chain followed before the walk is cut short.
pub const MAX_CATEGORY_DEPTH: usize = 16;

/// Location of the product object inside a search response.
const PRODUCT_AT: &str = "/ExactMatches/0";

/// How to treat a key that is absent from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Absence indicates a malformed payload and is reported.
    Expected,
    /// Absence means the distributor has nothing for this field.
    Optional,
}

/// JSON pointer (relative to the product object) plus its absence policy.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub pointer: &'static str,
    pub presence: Presence,
}

impl Field {
    const fn expected(pointer: &'static str) -> Self {
        Self {
            pointer,
            presence: Presence::Expected,
        }
    }

    const fn optional(pointer: &'static str) -> Self {
        Self {
            pointer,
            presence: Presence::Optional,
        }
    }
}

/// Absence policy for every scalar field of an exact match.
pub mod fields {
    use super::Field;

    pub const DESCRIPTION: Field = Field::expected("/Description/ProductDescription");
    pub const DETAILED_DESCRIPTION: Field = Field::optional("/Description/DetailedDescription");
    pub const MANUFACTURER: Field = Field::expected("/Manufacturer/Name");
    pub const MANUFACTURER_PART_NUMBER: Field = Field::expected("/ManufacturerProductNumber");
    pub const PHOTO_URL: Field = Field::optional("/PhotoUrl");
    pub const DATASHEET_URL: Field = Field::optional("/DatasheetUrl");
    pub const PRODUCT_URL: Field = Field::expected("/ProductUrl");
    pub const QUANTITY_AVAILABLE: Field = Field::expected("/QuantityAvailable");
    pub const LIFECYCLE_STATUS: Field = Field::expected("/ProductStatus/Status");
    pub const END_OF_LIFE: Field = Field::expected("/EndOfLife");
    pub const DISCONTINUED: Field = Field::expected("/Discontinued");
    pub const PRODUCT_VARIATIONS: Field = Field::expected("/ProductVariations");
    pub const PARAMETERS: Field = Field::optional("/Parameters");
    pub const CLASSIFICATIONS: Field = Field::optional("/Classifications");
    pub const CATEGORY: Field = Field::optional("/Category");

    // Relative to one entry of ProductVariations.
    pub const PACKAGE_TYPE: Field = Field::expected("/PackageType/Name");
    pub const DISTRIBUTOR_PART_NUMBER: Field = Field::optional("/DigiKeyProductNumber");
    pub const MINIMUM_ORDER_QUANTITY: Field = Field::optional("/MinimumOrderQuantity");
    pub const PACKAGE_QUANTITY_AVAILABLE: Field =
        Field::optional("/QuantityAvailableforPackageType");
    pub const STANDARD_PRICING: Field = Field::expected("/StandardPricing");

    // Relative to one entry of StandardPricing.
    pub const BREAK_QUANTITY: Field = Field::expected("/BreakQuantity");
    pub const UNIT_PRICE: Field = Field::expected("/UnitPrice");
}

/// Classification keys, all of which must be present for any to be used.
const CLASSIFICATION_KEYS: [&str; 5] = [
    "RohsStatus",
    "MoistureSensitivityLevel",
    "ReachStatus",
    "ExportControlClassNumber",
    "HtsusCode",
];

#[derive(Debug, Clone, Copy)]
enum NameMatch {
    Exact(&'static str),
    Contains(&'static str),
}

impl NameMatch {
    fn matches(self, name: &str) -> bool {
        match self {
            NameMatch::Exact(s) => name == s,
            NameMatch::Contains(s) => name.contains(s),
        }
    }
}

/// Physical attribute a product parameter can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalField {
    PackageCase,
    SupplierDevicePackage,
    OperatingTemp,
    XySize,
    Height,
    Thickness,
    Ratings,
    Grade,
    Qualification,
}

impl PhysicalField {
    fn slot(self, physical: &mut Physical) -> &mut Option<String> {
        match self {
            PhysicalField::PackageCase => &mut physical.package_case,
            PhysicalField::SupplierDevicePackage => &mut physical.supplier_device_package,
            PhysicalField::OperatingTemp => &mut physical.operating_temp,
            PhysicalField::XySize => &mut physical.xy_size,
            PhysicalField::Height => &mut physical.height,
            PhysicalField::Thickness => &mut physical.thickness,
            PhysicalField::Ratings => &mut physical.ratings,
            PhysicalField::Grade => &mut physical.grade,
            PhysicalField::Qualification => &mut physical.qualification,
        }
    }
}

struct ParameterRule {
    name: NameMatch,
    field: PhysicalField,
}

/// Parameter name → field rules, in precedence order.
const PARAMETER_RULES: &[ParameterRule] = &[
    ParameterRule {
        name: NameMatch::Exact("Package / Case"),
        field: PhysicalField::PackageCase,
    },
    ParameterRule {
        name: NameMatch::Exact("Supplier Device Package"),
        field: PhysicalField::SupplierDevicePackage,
    },
    ParameterRule {
        name: NameMatch::Exact("Operating Temperature"),
        field: PhysicalField::OperatingTemp,
    },
    ParameterRule {
        name: NameMatch::Contains("Dimension"),
        field: PhysicalField::XySize,
    },
    ParameterRule {
        name: NameMatch::Contains("Height"),
        field: PhysicalField::Height,
    },
    ParameterRule {
        name: NameMatch::Exact("Thickness (Max)"),
        field: PhysicalField::Thickness,
    },
    ParameterRule {
        name: NameMatch::Contains("Ratings"),
        field: PhysicalField::Ratings,
    },
    ParameterRule {
        name: NameMatch::Contains("Grade"),
        field: PhysicalField::Grade,
    },
    ParameterRule {
        name: NameMatch::Contains("Qualification"),
        field: PhysicalField::Qualification,
    },
];

/// Field a parameter name maps to, using the first matching rule.
pub fn classify_parameter(name: &str) -> Option<PhysicalField> {
    PARAMETER_RULES
        .iter()
        .find(|rule| rule.name.matches(name))
        .map(|rule| rule.field)
}

/// Extracted record together with everything that went wrong on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: ComponentRecord,
    pub issues: Vec<ExtractError>,
    /// The response carried an exact-match product, however little of it
    /// could be read.
    pub matched: bool,
}

impl Extraction {
    pub fn has_match(&self) -> bool {
        self.matched
    }
}

/// Extract a component record from one keyword-search response.
///
/// `associated_refdes` is left empty; the caller owns the BOM line.
pub fn extract(response: &Value) -> ComponentRecord {
    extract_with_issues(response).record
}

/// Like [`extract`], also returning the non-fatal problems encountered.
pub fn extract_with_issues(response: &Value) -> Extraction {
    let mut extractor = Extractor::default();
    let record = extractor.run(response);
    Extraction {
        record,
        issues: extractor.issues,
        matched: extractor.matched,
    }
}

/// Merge a Cut Tape and a Digi-Reel variant into one display variant.
///
/// The first Cut Tape entry is renamed and keeps its breaks, the first
/// Digi-Reel entry is removed. Nothing changes unless both exist.
pub fn merge_reel_variants(tiers: &mut Vec<PriceTier>) {
    let Some(cut_tape) = tiers
        .iter()
        .position(|t| t.package_type.contains("Cut Tape"))
    else {
        return;
    };
    let Some(digi_reel) = tiers
        .iter()
        .enumerate()
        .find(|(i, t)| *i != cut_tape && t.package_type.contains("Digi-Reel"))
        .map(|(i, _)| i)
    else {
        return;
    };

    log::debug!(
        "Merging '{}' into '{}'",
        tiers[digi_reel].package_type,
        tiers[cut_tape].package_type
    );
    tiers[cut_tape].package_type = CUT_TAPE_DIGI_REEL.to_string();
    tiers.remove(digi_reel);
}

#[derive(Default)]
struct Extractor {
    issues: Vec<ExtractError>,
    matched: bool,
}

impl Extractor {
    fn report(&mut self, issue: ExtractError) {
        log::warn!("Partial extraction: {issue}");
        self.issues.push(issue);
    }

    /// Look up `field` inside `value`, which sits at `at` in the response.
    fn get<'a>(&mut self, value: &'a Value, at: &str, field: Field) -> Option<&'a Value> {
        match value.pointer(field.pointer) {
            Some(Value::Null) => None,
            Some(found) => Some(found),
            None => {
                match field.presence {
                    Presence::Expected => {
                        self.report(ExtractError::MissingField(format!("{at}{}", field.pointer)))
                    }
                    Presence::Optional => log::debug!("{at}{} not provided", field.pointer),
                }
                None
            }
        }
    }

    fn mistyped(&mut self, at: &str, field: Field, expected: &'static str) {
        self.report(ExtractError::UnexpectedType {
            path: format!("{at}{}", field.pointer),
            expected,
        });
    }

    fn text(&mut self, value: &Value, at: &str, field: Field) -> Option<String> {
        let found = self.get(value, at, field)?;
        match found.as_str() {
            Some(s) if s.is_empty() => None,
            Some(s) => Some(s.to_string()),
            None => {
                self.mistyped(at, field, "a string");
                None
            }
        }
    }

    fn count(&mut self, value: &Value, at: &str, field: Field) -> Option<u64> {
        let found = self.get(value, at, field)?;
        match found.as_u64() {
            Some(n) => Some(n),
            None => {
                self.mistyped(at, field, "a non-negative integer");
                None
            }
        }
    }

    fn flag(&mut self, value: &Value, at: &str, field: Field) -> Option<bool> {
        let found = self.get(value, at, field)?;
        match found.as_bool() {
            Some(b) => Some(b),
            None => {
                self.mistyped(at, field, "a boolean");
                None
            }
        }
    }

    fn price(&mut self, value: &Value, at: &str, field: Field) -> Option<Decimal> {
        let found = self.get(value, at, field)?;
        match parse_decimal(found) {
            Some(d) => Some(d),
            None => {
                self.mistyped(at, field, "a decimal number");
                None
            }
        }
    }

    fn array<'a>(&mut self, value: &'a Value, at: &str, field: Field) -> Option<&'a [Value]> {
        let found = self.get(value, at, field)?;
        match found.as_array() {
            Some(items) => Some(items.as_slice()),
            None => {
                self.mistyped(at, field, "an array");
                None
            }
        }
    }

    fn run(&mut self, response: &Value) -> ComponentRecord {
        let mut record = ComponentRecord::default();

        let Some(matches) = self.array(response, "", Field::expected("/ExactMatches")) else {
            return record;
        };
        let Some(product) = matches.first() else {
            log::debug!("No exact match in search response");
            self.issues.push(ExtractError::NoExactMatch);
            return record;
        };
        if matches.len() > 1 {
            log::debug!("{} exact matches, using the first", matches.len());
        }
        if !product.is_object() {
            self.report(ExtractError::UnexpectedType {
                path: PRODUCT_AT.to_string(),
                expected: "an object",
            });
            return record;
        }
        self.matched = true;

        record.description = self.text(product, PRODUCT_AT, fields::DESCRIPTION);
        record.detailed_description = self.text(product, PRODUCT_AT, fields::DETAILED_DESCRIPTION);
        record.manufacturer = self.text(product, PRODUCT_AT, fields::MANUFACTURER);
        record.manufacturer_part_number =
            self.text(product, PRODUCT_AT, fields::MANUFACTURER_PART_NUMBER);
        record.commercial = self.commercial(product);
        record.pricing = self.pricing(product);
        record.physical = self.physical(product);
        record.compliance = self.compliance(product);
        record.category_path = self.category_path(product);

        record
    }

    fn commercial(&mut self, product: &Value) -> Commercial {
        Commercial {
            photo_url: self.text(product, PRODUCT_AT, fields::PHOTO_URL),
            datasheet_url: self.text(product, PRODUCT_AT, fields::DATASHEET_URL),
            product_url: self.text(product, PRODUCT_AT, fields::PRODUCT_URL),
            quantity_available: self.count(product, PRODUCT_AT, fields::QUANTITY_AVAILABLE),
            lifecycle_status: self.text(product, PRODUCT_AT, fields::LIFECYCLE_STATUS),
            end_of_life: self.flag(product, PRODUCT_AT, fields::END_OF_LIFE),
            discontinued: self.flag(product, PRODUCT_AT, fields::DISCONTINUED),
        }
    }

    fn pricing(&mut self, product: &Value) -> Vec<PriceTier> {
        let Some(variations) = self.array(product, PRODUCT_AT, fields::PRODUCT_VARIATIONS) else {
            return Vec::new();
        };

        let mut tiers = Vec::with_capacity(variations.len());
        for (i, variation) in variations.iter().enumerate() {
            let at = format!("{PRODUCT_AT}/ProductVariations/{i}");
            if let Some(tier) = self.price_tier(variation, &at) {
                tiers.push(tier);
            }
        }

        merge_reel_variants(&mut tiers);
        tiers
    }

    fn price_tier(&mut self, variation: &Value, at: &str) -> Option<PriceTier> {
        let package_type = self.text(variation, at, fields::PACKAGE_TYPE)?;

        let mut breaks = Vec::new();
        if let Some(rows) = self.array(variation, at, fields::STANDARD_PRICING) {
            for (i, row) in rows.iter().enumerate() {
                let row_at = format!("{at}/StandardPricing/{i}");
                let quantity = self.count(row, &row_at, fields::BREAK_QUANTITY);
                let unit_price = self.price(row, &row_at, fields::UNIT_PRICE);
                if let (Some(quantity), Some(unit_price)) = (quantity, unit_price) {
                    breaks.push(PriceBreak::new(quantity, unit_price));
                }
            }
        }
        breaks.sort_by_key(|b| b.quantity);

        if breaks.is_empty() {
            log::debug!("No price breaks for '{package_type}'");
        }

        Some(PriceTier {
            distributor_part_number: self.text(variation, at, fields::DISTRIBUTOR_PART_NUMBER),
            minimum_order_quantity: self.count(variation, at, fields::MINIMUM_ORDER_QUANTITY),
            quantity_available: self.count(variation, at, fields::PACKAGE_QUANTITY_AVAILABLE),
            package_type,
            breaks,
        })
    }

    fn physical(&mut self, product: &Value) -> Physical {
        let mut physical = Physical::default();
        let Some(parameters) = self.array(product, PRODUCT_AT, fields::PARAMETERS) else {
            return physical;
        };

        for (i, parameter) in parameters.iter().enumerate() {
            let Some(name) = parameter.get("ParameterText").and_then(Value::as_str) else {
                log::debug!("Skipping unnamed parameter {i}");
                continue;
            };
            let Some(field) = classify_parameter(name) else {
                continue;
            };
            let at = format!("{PRODUCT_AT}/Parameters/{i}");
            if let Some(value) = self.text(parameter, &at, Field::expected("/ValueText")) {
                *field.slot(&mut physical) = Some(value);
            }
        }

        physical
    }

    fn compliance(&mut self, product: &Value) -> Compliance {
        let Some(block) = self.get(product, PRODUCT_AT, fields::CLASSIFICATIONS) else {
            return Compliance::default();
        };

        match read_classifications(block) {
            Ok(compliance) => compliance,
            Err(missing) => {
                self.report(ExtractError::IncompleteClassifications(missing.to_string()));
                Compliance::default()
            }
        }
    }

    fn category_path(&mut self, product: &Value) -> Vec<String> {
        let mut path = Vec::new();
        let Some(mut node) = self.get(product, PRODUCT_AT, fields::CATEGORY) else {
            return path;
        };

        let mut seen = HashSet::new();
        loop {
            if path.len() >= MAX_CATEGORY_DEPTH {
                self.truncate_category(&path, format!("deeper than {MAX_CATEGORY_DEPTH} levels"));
                break;
            }
            if let Some(id) = node.get("CategoryId").and_then(Value::as_i64) {
                if !seen.insert(id) {
                    self.truncate_category(&path, format!("category {id} repeats"));
                    break;
                }
            }
            match node.get("Name").and_then(Value::as_str) {
                Some(name) => path.push(name.to_string()),
                None => {
                    self.truncate_category(&path, "category without a name".to_string());
                    break;
                }
            }
            match node
                .get("ChildCategories")
                .and_then(Value::as_array)
                .and_then(|children| children.first())
            {
                Some(child) => node = child,
                None => break,
            }
        }

        path
    }

    fn truncate_category(&mut self, path: &[String], reason: String) {
        self.report(ExtractError::MalformedCategoryChain {
            depth: path.len(),
            reason,
        });
    }
}

fn read_classifications(block: &Value) -> Result<Compliance, &'static str> {
    let [rohs, msl, reach, eccn, hts] = CLASSIFICATION_KEYS;
    let field = |key: &'static str| {
        block
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(key)
    };

    Ok(Compliance {
        rohs_status: Some(field(rohs)?),
        moisture_sensitivity_level: Some(field(msl)?),
        reach_status: Some(field(reach)?),
        export_control_class_number: Some(field(eccn)?),
        htsus_code: Some(field(hts)?),
    })
}

/// Parse a JSON number or numeric string without going through `f64` math.
fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            let s = n.to_string();
            Decimal::from_str(&s)
                .or_else(|_| Decimal::from_scientific(&s))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
