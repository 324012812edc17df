//! ---
//! lvd_section: "05-networking-external-interfaces"
//! lvd_subsection: "binary"
//! lvd_type: "source"
//! lvd_scope: "code"
//! lvd_description: "Control CLI for dimensioning low-voltage circuits."
//! lvd_version: "v0.0.0-prealpha"
//! lvd_owner: "tbd"
//! ---
use anyhow::Result;
use clap::Args;
use r_lvd_calc_engine::model::{Vocabulary, VocabularyOption};
use serde_json::json;

use crate::Session;

#[derive(Debug, Args)]
pub struct VocabArgs {
    /// Print as JSON.
    #[arg(long)]
    json: bool,
}

pub fn run(session: &Session, args: VocabArgs) -> Result<()> {
    let vocabulary = Vocabulary::build();
    let tables = &session.tables;
    if args.json {
        let document = json!({
            "vocabulary": vocabulary,
            "apparent_power_steps_kva": tables.apparent_power_steps_kva,
            "simultaneity_bands": tables.simultaneity_bands,
            "tables_version": tables.version,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    print_group("phase", &vocabulary.phase_configurations);
    print_group("insulation", &vocabulary.insulation_classes);
    print_group("material", &vocabulary.conductor_materials);
    print_group("installation_method", &vocabulary.installation_methods);
    print_group("usage", &vocabulary.usage_categories);

    let steps: Vec<String> = tables
        .apparent_power_steps_kva
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("standard apparent power (kVA): {}", steps.join(", "));
    println!("simultaneity (dwellings, Quadro 803A):");
    for band in &tables.simultaneity_bands {
        println!("  {:<10} {:.2}", band.label(), band.factor);
    }
    Ok(())
}

fn print_group(field: &str, options: &[VocabularyOption]) {
    println!("{}:", field);
    for option in options {
        match &option.table {
            Some(table) => println!("  {:<8} {} (Quadro {})", option.code, option.label, table),
            None => println!("  {:<8} {}", option.code, option.label),
        }
    }
}
