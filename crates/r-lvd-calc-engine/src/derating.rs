//! ---
//! lvd_section: "02-dimensioning-engine"
//! lvd_subsection: "module"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Dimensioning routines for low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
//! Correction factors K1 (temperature), K2 (grouping) and Kh (harmonics).

use r_lvd_common::LookupPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    conditions::{DeratingTable, LookupMiss},
    model::CircuitInput,
    tables::{TableRepository, HARMONIC_DERATING_FACTOR},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionFactors {
    pub k1: f64,
    pub k2: f64,
    pub kh: f64,
    /// FC = K1 × K2 × Kh
    pub combined: f64,
}

impl CorrectionFactors {
    pub fn new(k1: f64, k2: f64, kh: f64) -> Self {
        Self {
            k1,
            k2,
            kh,
            combined: k1 * k2 * kh,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Derating {
    pub factors: CorrectionFactors,
    pub misses: Vec<LookupMiss>,
}

/// Resolve FC for a circuit. Missing keys never abort; each one is reported
/// as a [`LookupMiss`].
pub fn correction_factors(
    input: &CircuitInput,
    tables: &TableRepository,
    policy: LookupPolicy,
) -> Derating {
    let mut misses = Vec::new();

    let temperature_keys: Vec<(i64, f64)> = tables
        .temperature_table(input.insulation)
        .map(|table| {
            table
                .entries
                .iter()
                .map(|e| (i64::from(e.temperature_c), e.factor))
                .collect()
        })
        .unwrap_or_default();
    let k1 = resolve(
        DeratingTable::Temperature,
        &temperature_keys,
        i64::from(input.ambient_temperature_c),
        policy,
        &mut misses,
    );

    let grouping_keys: Vec<(i64, f64)> = tables
        .grouping_factors
        .iter()
        .map(|e| (i64::from(e.circuits), e.factor))
        .collect();
    let k2 = resolve(
        DeratingTable::Grouping,
        &grouping_keys,
        i64::from(input.grouping_count),
        policy,
        &mut misses,
    );

    let kh = if input.has_harmonics {
        HARMONIC_DERATING_FACTOR
    } else {
        1.0
    };

    let factors = CorrectionFactors::new(k1, k2, kh);
    debug!(
        k1 = factors.k1,
        k2 = factors.k2,
        kh = factors.kh,
        fc = factors.combined,
        "correction factors resolved"
    );
    Derating { factors, misses }
}

/// `entries` must be sorted by ascending key; larger keys are more severe.
fn resolve(
    table: DeratingTable,
    entries: &[(i64, f64)],
    key: i64,
    policy: LookupPolicy,
    misses: &mut Vec<LookupMiss>,
) -> f64 {
    if let Some(&(_, factor)) = entries.iter().find(|(k, _)| *k == key) {
        return factor;
    }

    let fallback = match policy {
        LookupPolicy::Exact => None,
        LookupPolicy::NextTabulated => entries
            .iter()
            .find(|(k, _)| *k > key)
            .or_else(|| entries.last())
            .copied(),
    };
    let applied_factor = fallback.map_or(1.0, |(_, factor)| factor);
    misses.push(LookupMiss {
        table,
        requested_key: key,
        applied_key: fallback.map(|(k, _)| k),
        applied_factor,
    });
    applied_factor
}
