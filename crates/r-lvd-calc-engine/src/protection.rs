//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Overload protection coordination (Secção 433.2): Ib ≤ In ≤ Iz'.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcEngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionSelection {
    pub rating_a: u32,
    /// Whether the rating satisfies Ib ≤ In ≤ Iz'.
    pub coordinated: bool,
}

/// Pick a rating from an ascending breaker sequence.
///
/// Falls back to the smallest rating not below Ib, then to the largest
/// rating, flagging either fallback as uncoordinated.
pub fn select_protection(
    ratings: &[u32],
    design_current_a: f64,
    corrected_ampacity_a: f64,
) -> Result<ProtectionSelection> {
    let coordinated = ratings.iter().copied().find(|&rating| {
        let rating = f64::from(rating);
        rating >= design_current_a && rating <= corrected_ampacity_a
    });
    if let Some(rating_a) = coordinated {
        return Ok(ProtectionSelection {
            rating_a,
            coordinated: true,
        });
    }

    ratings
        .iter()
        .copied()
        .find(|&rating| f64::from(rating) >= design_current_a)
        .or_else(|| ratings.last().copied())
        .map(|rating_a| ProtectionSelection {
            rating_a,
            coordinated: false,
        })
        .ok_or_else(|| CalcEngineError::TableData("breaker rating sequence is empty".into()))
}

/// Textual coordination criterion, e.g. `39.84 A ≤ 40 A ≤ 66.6 A`.
pub fn coordination_criterion(design_current_a: f64, rating_a: u32, ampacity_a: f64) -> String {
    fn relation(lower: f64, upper: f64) -> &'static str {
        if lower <= upper {
            "≤"
        } else {
            ">"
        }
    }
    let rating = f64::from(rating_a);
    format!(
        "{:.2} A {} {} A {} {:.1} A",
        design_current_a,
        relation(design_current_a, rating),
        rating_a,
        relation(rating, ampacity_a),
        ampacity_a
    )
}
