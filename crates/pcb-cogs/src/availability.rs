//! Stock classification for a resolved part.

use serde::Serialize;

/// Number of boards stock must cover to count as plentiful
pub const NUM_BOARDS: u64 = 20;

/// Availability tier for sourcing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Insufficient = 0,
    Limited = 1,
    Plenty = 2,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Plenty => "plenty",
            Tier::Limited => "limited",
            Tier::Insufficient => "insufficient",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Determine availability tier from distributor stock and per-board usage
pub fn availability(stock: Option<u64>, per_board_qty: u64) -> Tier {
    let Some(stock) = stock else {
        return Tier::Insufficient;
    };

    // Not enough for even 1 board
    if stock < per_board_qty.max(1) {
        return Tier::Insufficient;
    }

    if stock >= per_board_qty.saturating_mul(NUM_BOARDS) {
        Tier::Plenty
    } else {
        Tier::Limited
    }
}
