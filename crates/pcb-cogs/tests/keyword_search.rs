use pcb_cogs::{
    CUT_TAPE_DIGI_REEL, Compliance, ExtractError, PriceBreak, Tier, attach_pricing, availability,
    cheapest, extract_with_issues, resolve_pricing,
};
use rust_decimal_macros::dec;
use serde_json::Value;

fn fixture(json: &str) -> Value {
    serde_json::from_str(json).expect("fixture is valid JSON")
}

const RESISTOR: &str = include_str!("fixtures/keyword_search_resistor.json");
const NO_MATCH: &str = include_str!("fixtures/keyword_search_no_match.json");
const PARTIAL: &str = include_str!("fixtures/keyword_search_partial.json");

#[test]
fn test_full_exact_match() {
    let extraction = extract_with_issues(&fixture(RESISTOR));
    assert!(extraction.issues.is_empty(), "{:?}", extraction.issues);
    assert!(extraction.has_match());

    let record = extraction.record;
    assert_eq!(record.description.as_deref(), Some("RES 10K OHM 1% 1/10W 0603"));
    assert_eq!(record.manufacturer.as_deref(), Some("YAGEO"));
    assert_eq!(
        record.manufacturer_part_number.as_deref(),
        Some("RC0603FR-0710KL")
    );
    assert_eq!(record.commercial.quantity_available, Some(5_596_613));
    assert_eq!(record.commercial.lifecycle_status.as_deref(), Some("Active"));
    assert_eq!(record.commercial.end_of_life, Some(false));
    assert_eq!(record.commercial.discontinued, Some(false));
    assert!(record.commercial.datasheet_url.is_some());

    assert_eq!(
        record.physical.package_case.as_deref(),
        Some("0603 (1608 Metric)")
    );
    assert_eq!(
        record.physical.supplier_device_package.as_deref(),
        Some("0603")
    );
    assert_eq!(
        record.physical.xy_size.as_deref(),
        Some("0.063\" L x 0.031\" W (1.60mm x 0.80mm)")
    );
    assert_eq!(record.physical.height.as_deref(), Some("0.022\" (0.55mm)"));
    assert_eq!(record.physical.ratings.as_deref(), Some("-"));
    assert_eq!(record.physical.thickness, None);
    assert_eq!(record.physical.grade, None);

    assert_eq!(
        record.compliance,
        Compliance {
            rohs_status: Some("ROHS3 Compliant".into()),
            moisture_sensitivity_level: Some("1  (Unlimited)".into()),
            reach_status: Some("REACH Unaffected".into()),
            export_control_class_number: Some("EAR99".into()),
            htsus_code: Some("8533.21.0030".into()),
        }
    );
    assert_eq!(
        record.category_path,
        vec!["Resistors", "Chip Resistor - Surface Mount"]
    );

    let packages: Vec<&str> = record
        .pricing
        .iter()
        .map(|t| t.package_type.as_str())
        .collect();
    assert_eq!(packages, vec!["Tape & Reel (TR)", CUT_TAPE_DIGI_REEL]);
    assert_eq!(record.pricing[1].breaks.len(), 4);
    assert_eq!(record.pricing[1].breaks[0], PriceBreak::new(1, dec!(0.1)));
    assert_eq!(
        record.pricing[1].distributor_part_number.as_deref(),
        Some("311-10.0KHRCT-ND")
    );
}

#[test]
fn test_full_exact_match_cogs() {
    let mut record = extract_with_issues(&fixture(RESISTOR)).record;
    record.associated_refdes = vec!["R1".into(), "R2".into(), "R3".into(), "R4".into()];
    attach_pricing(&mut record, 4, &[10, 100, 1000]);

    let reel = &record.cogs[0];
    assert_eq!(reel.package_type, "Tape & Reel (TR)");
    assert!(reel.entries.iter().all(|e| e.below_minimum_order));
    assert_eq!(reel.entries[0].break_quantity, 5000);

    let cut_tape = &record.cogs[1];
    let totals: Vec<_> = cut_tape.entries.iter().map(|e| e.total_price).collect();
    assert_eq!(totals, vec![dec!(0.88), dec!(4.36), dec!(19.8)]);
    let breaks: Vec<_> = cut_tape.entries.iter().map(|e| e.break_quantity).collect();
    assert_eq!(breaks, vec![10, 100, 1000]);

    let (package, entry) = cheapest(&record, 10).unwrap();
    assert_eq!(package, CUT_TAPE_DIGI_REEL);
    assert_eq!(entry.part_quantity, 40);

    assert_eq!(
        availability(record.commercial.quantity_available, 4),
        Tier::Plenty
    );
}

#[test]
fn test_no_exact_match() {
    let extraction = extract_with_issues(&fixture(NO_MATCH));
    assert!(extraction.record.is_sparse());
    assert_eq!(extraction.issues, vec![ExtractError::NoExactMatch]);
    assert!(resolve_pricing(&extraction.record, 1, &[1, 10]).is_empty());
}

#[test]
fn test_partial_exact_match() {
    let extraction = extract_with_issues(&fixture(PARTIAL));
    let record = &extraction.record;

    assert_eq!(
        extraction.issues,
        vec![
            ExtractError::MissingField("/ExactMatches/0/EndOfLife".into()),
            ExtractError::IncompleteClassifications("MoistureSensitivityLevel".into()),
        ]
    );

    assert_eq!(record.manufacturer_part_number.as_deref(), Some("STM32F103C8T6"));
    assert_eq!(record.commercial.end_of_life, None);
    assert_eq!(record.commercial.discontinued, Some(false));
    assert_eq!(record.commercial.quantity_available, Some(0));
    assert_eq!(record.physical.grade.as_deref(), Some("Industrial"));
    assert_eq!(record.physical.package_case.as_deref(), Some("48-LQFP"));
    assert_eq!(record.compliance, Compliance::default());
    assert_eq!(
        record.category_path,
        vec!["Integrated Circuits (ICs)", "Embedded", "Microcontrollers"]
    );

    // Tray variant has no price breaks
    assert_eq!(record.pricing.len(), 1);
    assert!(resolve_pricing(record, 1, &[1, 10]).is_empty());
    assert_eq!(
        availability(record.commercial.quantity_available, 1),
        Tier::Insufficient
    );
}

#[test]
fn test_extreme_unit_price_does_not_abort_pricing() {
    let response = fixture(
        r#"{
            "ExactMatches": [{
                "ManufacturerProductNumber": "HUGE-1",
                "ProductVariations": [
                    {
                        "PackageType": { "Name": "Tray" },
                        "StandardPricing": [
                            { "BreakQuantity": 1, "UnitPrice": "79228162514264337593543950335" }
                        ]
                    },
                    {
                        "PackageType": { "Name": "Bulk" },
                        "StandardPricing": [{ "BreakQuantity": 1, "UnitPrice": 0.5 }]
                    }
                ]
            }]
        }"#,
    );
    let mut record = extract_with_issues(&response).record;
    attach_pricing(&mut record, 2, &[1]);

    let tray = record.cogs.iter().find(|c| c.package_type == "Tray").unwrap();
    assert!(tray.entries.is_empty());
    let (package, entry) = cheapest(&record, 1).unwrap();
    assert_eq!(package, "Bulk");
    assert_eq!(entry.total_price, dec!(1.0));
}
