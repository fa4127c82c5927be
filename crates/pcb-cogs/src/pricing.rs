//! Price-break resolution and COGS breakdowns.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::record::{CogsEntry, ComponentRecord, PackageCogs, PriceBreak, PriceTier};

/// Price break that applies when buying `part_quantity` units.
///
/// Picks the break with the greatest quantity not exceeding `part_quantity`.
/// Below the smallest break the smallest one applies, so a quantity is never
/// unpriced as long as the table has a row. Input order does not matter.
pub fn select_break(breaks: &[PriceBreak], part_quantity: u64) -> Option<&PriceBreak> {
    breaks
        .iter()
        .filter(|b| b.quantity <= part_quantity)
        .max_by_key(|b| b.quantity)
        .or_else(|| breaks.iter().min_by_key(|b| b.quantity))
}

fn tier_cogs(tier: &PriceTier, per_board_qty: u64, pcb_quantities: &[u64]) -> Option<PackageCogs> {
    if tier.breaks.is_empty() {
        log::debug!("No pricing for '{}', skipping", tier.package_type);
        return None;
    }

    let entries = pcb_quantities
        .iter()
        .filter_map(|&pcb_quantity| {
            let Some(part_quantity) = per_board_qty.checked_mul(pcb_quantity) else {
                log::warn!(
                    "Part quantity overflows for '{}' at {} boards, skipping",
                    tier.package_type,
                    pcb_quantity
                );
                return None;
            };
            let selected = select_break(&tier.breaks, part_quantity)?;
            let Some(total_price) = selected.unit_price.checked_mul(Decimal::from(part_quantity))
            else {
                log::warn!(
                    "Total price overflows for '{}' at {} parts, skipping",
                    tier.package_type,
                    part_quantity
                );
                return None;
            };
            Some(CogsEntry {
                pcb_quantity,
                part_quantity,
                break_quantity: selected.quantity,
                unit_price: selected.unit_price,
                total_price,
                below_minimum_order: tier
                    .minimum_order_quantity
                    .is_some_and(|moq| part_quantity < moq),
            })
        })
        .collect();

    Some(PackageCogs {
        package_type: tier.package_type.clone(),
        entries,
    })
}

/// COGS breakdown of every priced packaging variant of `record`.
///
/// Variants without price breaks are skipped; a record without any pricing
/// yields an empty list.
pub fn resolve_pricing(
    record: &ComponentRecord,
    per_board_qty: u64,
    pcb_quantities: &[u64],
) -> Vec<PackageCogs> {
    record
        .pricing
        .iter()
        .filter_map(|tier| tier_cogs(tier, per_board_qty, pcb_quantities))
        .collect()
}

/// Resolve pricing and store it on the record.
pub fn attach_pricing(record: &mut ComponentRecord, per_board_qty: u64, pcb_quantities: &[u64]) {
    record.cogs = resolve_pricing(record, per_board_qty, pcb_quantities);
}

/// Cheapest packaging option for one line at one build quantity.
///
/// Options that meet the variant's minimum order quantity win over ones
/// that don't, then lowest total price.
pub fn cheapest(record: &ComponentRecord, pcb_quantity: u64) -> Option<(&str, &CogsEntry)> {
    record
        .cogs
        .iter()
        .filter_map(|p| {
            p.entry_for(pcb_quantity)
                .map(|e| (p.package_type.as_str(), e))
        })
        .min_by(|(_, a), (_, b)| {
            a.below_minimum_order
                .cmp(&b.below_minimum_order)
                .then_with(|| a.total_price.cmp(&b.total_price))
        })
}

/// Material cost of a full build at one PCB quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildCost {
    pub pcb_quantity: u64,
    pub total: Decimal,
    pub priced_lines: usize,
    pub unpriced_lines: usize,
}

impl BuildCost {
    /// Material cost per board.
    pub fn per_board(&self) -> Option<Decimal> {
        (self.pcb_quantity > 0).then(|| self.total / Decimal::from(self.pcb_quantity))
    }
}

/// Sum the cheapest option of every line for each build quantity.
///
/// A line whose cost would overflow the running total counts as unpriced.
pub fn summarize_builds<'a>(
    records: impl IntoIterator<Item = &'a ComponentRecord>,
    pcb_quantities: &[u64],
) -> Vec<BuildCost> {
    let mut costs: Vec<BuildCost> = pcb_quantities
        .iter()
        .map(|&pcb_quantity| BuildCost {
            pcb_quantity,
            total: Decimal::ZERO,
            priced_lines: 0,
            unpriced_lines: 0,
        })
        .collect();

    for record in records {
        for cost in &mut costs {
            let total = cheapest(record, cost.pcb_quantity)
                .and_then(|(_, entry)| cost.total.checked_add(entry.total_price));
            match total {
                Some(total) => {
                    cost.total = total;
                    cost.priced_lines += 1;
                }
                None => cost.unpriced_lines += 1,
            }
        }
    }
    costs
}
