//! Test fixtures: texts, packs and configurations.

use exercise_core::{EngineConfig, SelectionStrategy};

pub const APPLES: &str = "El niño come manzanas. El niño come manzanas rojas.";

/// Sentences that analyze cleanly and combine into usable texts.
pub const SENTENCE_POOL: &[&str] = &[
    "El niño come manzanas.",
    "La niña lee un libro nuevo.",
    "Mi hermano viaja en tren.",
    "El perro bebe agua fría.",
    "Las casas son grandes.",
    "Ayer haiga llovido mucho en el pueblo.",
    "Ella canta muy bien.",
    "Los gatos duermen en el sofá.",
];

/// Reading pack with three unlabelled texts.
pub fn sample_pack() -> String {
    format!(
        "ID: manzanas\nTopic: comida\nText: {APPLES}\n\n\
         ID: biblioteca\nTopic: estudio\nText: La niña lee un libro nuevo. El perro bebe agua fría.\n\n\
         ID: tren\nTopic: viajes\nText: Mi hermano viaja en tren. Los gatos duermen en el sofá.\n"
    )
}

pub fn round_robin() -> EngineConfig {
    EngineConfig {
        selection: SelectionStrategy::RoundRobin,
        ..Default::default()
    }
}

/// Round robin with a short accuracy window so tiers move quickly.
pub fn fast_adapting() -> EngineConfig {
    EngineConfig {
        hysteresis_window: 3,
        accuracy_window: 3,
        ..round_robin()
    }
}
