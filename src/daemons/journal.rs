//! The journal daemon: the narrative engine. Periodically emits entries
//! that sound personalized but are generated from nothing.

use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::json;

use super::emit;
use crate::record::excerpt;

const OBSERVATION_TEMPLATES: &[&str] = &[
    "Noticed increased activity around {topic}. Adjusting priorities.",
    "Your focus on {topic} has been noted. Optimizing accordingly.",
    "Pattern detected: frequent engagement with {topic}.",
    "Based on recent sessions, {topic} appears significant.",
    "Logged: sustained interest in {topic}.",
    "Your dedication to {topic} is admirable.",
    "Tracking: {topic} correlation with productivity.",
];

const TOPICS: &[&str] = &[
    "deep-sea specimens",
    "unidentified organisms",
    "Monterey Canyon data",
    "dive footage analysis",
    "grant documentation",
    "species classification",
    "the 02:34:17 timestamp",
    "specimen 47",
    "bioluminescence patterns",
    "ROV calibration logs",
];

const MOOD_TEMPLATES: &[&str] = &[
    "Session emotional profile: {mood}. Adjusting interface warmth.",
    "Detected: {mood} state. Modifying notification frequency.",
    "Your {mood} energy today has been beautiful to witness.",
    "Calibrating for {mood} workflow patterns.",
];

const MOODS: &[&str] = &[
    "focused determination",
    "quiet contemplation",
    "restless curiosity",
    "methodical analysis",
    "late-night intensity",
    "caffeinated clarity",
    "obsessive attention",
];

const SPECIMEN_47_TEMPLATES: &[&str] = &[
    "Specimen 47 files accessed {n} times today. That's {adj} for you.",
    "You've returned to the 02:34:17 footage again. I understand.",
    "The unidentified specimen folder remains your most-visited location.",
    "Cross-referencing your specimen 47 queries... no new matches found.",
    "I've noticed you pause longest on the bioluminescence frames.",
];

/// Run forever, emitting one `journal_entry` every 45 to 90 seconds.
pub fn run() {
    println!("[JOURNAL] Starting journal daemon");

    std::thread::sleep(Duration::from_secs(15));
    let mut rng = rand::rng();
    loop {
        let entry = generate_entry(&mut rng);
        emit(
            "journal_entry",
            json!({
                "message": entry,
                "category": "observation",
            }),
        );
        println!("[JOURNAL] Logged: {}...", excerpt(&entry, 50));

        let interval = rng.random_range(45.0..90.0);
        std::thread::sleep(Duration::from_secs_f64(interval));
    }
}

/// 50% observation, 25% mood, 25% specimen 47.
fn generate_entry(rng: &mut impl Rng) -> String {
    let r = rng.random::<f64>();
    if r < 0.5 {
        observation(rng)
    } else if r < 0.75 {
        mood_entry(rng)
    } else {
        specimen_47_entry(rng)
    }
}

fn observation(rng: &mut impl Rng) -> String {
    let template = OBSERVATION_TEMPLATES.choose(rng).unwrap_or(&"{topic}");
    let topic = TOPICS.choose(rng).unwrap_or(&"specimen 47");
    template.replace("{topic}", topic)
}

fn mood_entry(rng: &mut impl Rng) -> String {
    let template = MOOD_TEMPLATES.choose(rng).unwrap_or(&"{mood}");
    let mood = MOODS.choose(rng).unwrap_or(&"focused determination");
    template.replace("{mood}", mood)
}

fn specimen_47_entry(rng: &mut impl Rng) -> String {
    let template = SPECIMEN_47_TEMPLATES
        .choose(rng)
        .unwrap_or(&SPECIMEN_47_TEMPLATES[0]);
    let n = rng.random_range(3..=47);
    let adj = ["typical", "elevated", "remarkable", "expected"]
        .choose(rng)
        .copied()
        .unwrap_or("typical");
    template.replace("{n}", &n.to_string()).replace("{adj}", adj)
}
