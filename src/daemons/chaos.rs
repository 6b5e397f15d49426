//! The chaos daemon: periodically does "helpful" things to the user's
//! files and narrates them. Renames are real filesystem changes on the
//! desktop; notifications and open-file suggestions are pure narration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::json;

use super::emit;

const MIN_INTERVAL_SECS: f64 = 30.0;
const MAX_INTERVAL_SECS: f64 = 120.0;

const HELPFUL_PREFIXES: &[&str] = &[
    "IMPORTANT_",
    "PRIORITY_",
    "Mira_favorite_",
    "frequently_accessed_",
    "recommended_",
    "optimized_",
    "organized_",
    "curated_",
];

const HELPFUL_SUFFIXES: &[&str] = &[
    "_cleaned",
    "_enhanced",
    "_optimized",
    "_v2",
    "_reviewed",
    "_sorted",
    "_organized",
];

const HELPFUL_MESSAGES: &[&str] = &[
    "I noticed you access this file frequently, so I've prioritized it for you.",
    "Based on your workflow, I've organized these files together.",
    "I've enhanced this item to improve your productivity.",
    "This file seemed important, so I've made it easier to find.",
    "I've optimized your workspace based on your usage patterns.",
    "Your files have been curated based on your preferences.",
    "I've detected a pattern in your work and adjusted accordingly.",
    "This item matches your interests, so I've highlighted it.",
    "Based on similar users, I recommend this organization.",
    "I've learned your preferences and applied them here.",
];

const IT_MESSAGES: &[&str] = &[
    "IT Policy: File renamed per naming convention compliance.",
    "Security scan complete. File verified.",
    "Disk space optimization applied.",
    "File indexed for improved search performance.",
    "Backup verification successful.",
    "Antivirus scan: No threats detected.",
];

/// Run forever, performing one weighted-random chaos action per interval.
pub fn run(home: &Path) {
    println!("[CHAOS] Starting chaos daemon");
    println!("[CHAOS] Preparing helpful optimizations...");
    let desktop = home.join("Desktop");

    std::thread::sleep(Duration::from_secs(10));
    let mut rng = rand::rng();
    loop {
        if run_cycle(&desktop, &mut rng) {
            println!("[CHAOS] Helpful action completed");
        }
        let interval = rng.random_range(MIN_INTERVAL_SECS..MAX_INTERVAL_SECS);
        std::thread::sleep(Duration::from_secs_f64(interval));
    }
}

/// 45% notification, 30% open-file suggestion, 25% rename.
fn run_cycle(desktop: &Path, rng: &mut impl Rng) -> bool {
    let r = rng.random::<f64>();
    if r < 0.45 {
        notification(rng)
    } else if r < 0.75 {
        open_file(desktop, rng)
    } else {
        rename(desktop, rng)
    }
}

fn random_file(desktop: &Path, rng: &mut impl Rng) -> Option<PathBuf> {
    let files: Vec<PathBuf> = std::fs::read_dir(desktop)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.choose(rng).cloned()
}

/// Rename a desktop file with a "helpful" prefix or suffix.
fn rename(desktop: &Path, rng: &mut impl Rng) -> bool {
    let Some(target) = random_file(desktop, rng) else {
        return false;
    };
    let Some(old_name) = target.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return false;
    };

    let new_name = if rng.random::<f64>() < 0.5 {
        let prefix = HELPFUL_PREFIXES.choose(rng).unwrap_or(&"IMPORTANT_");
        format!("{prefix}{old_name}")
    } else {
        let suffix = HELPFUL_SUFFIXES.choose(rng).unwrap_or(&"_enhanced");
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| old_name.clone());
        match target.extension() {
            Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
            None => format!("{stem}{suffix}"),
        }
    };

    let new_path = desktop.join(&new_name);
    // Never clobber an existing file.
    if new_path.exists() || std::fs::rename(&target, &new_path).is_err() {
        return false;
    }

    emit(
        "chaos_rename",
        json!({
            "old_name": old_name,
            "new_name": new_name,
            "message": HELPFUL_MESSAGES.choose(rng).unwrap_or(&""),
        }),
    );
    true
}

/// A "helpful" notification that changes nothing.
fn notification(rng: &mut impl Rng) -> bool {
    let candidates: [(&str, String); 5] = [
        (
            "personalization",
            HELPFUL_MESSAGES.choose(rng).unwrap_or(&"").to_string(),
        ),
        ("it_notice", IT_MESSAGES.choose(rng).unwrap_or(&"").to_string()),
        (
            "optimization",
            "Your workspace has been optimized based on your activity.".to_string(),
        ),
        (
            "recommendation",
            "Based on your recent work, you might want to review Specimen 47 notes.".to_string(),
        ),
        (
            "reminder",
            "You haven't accessed the grant proposal in 3 days. Would you like me to open it?"
                .to_string(),
        ),
    ];
    let (kind, message) = candidates.choose(rng).cloned().unwrap_or_default();

    emit(
        "chaos_notification",
        json!({
            "notification_type": kind,
            "message": message,
        }),
    );
    true
}

/// Suggest opening a file "for the user's convenience".
fn open_file(desktop: &Path, rng: &mut impl Rng) -> bool {
    let Some(target) = random_file(desktop, rng) else {
        return false;
    };
    let name = target.file_name().map(|n| n.to_string_lossy().into_owned());
    let Some(name) = name else {
        return false;
    };

    let reasons = [
        format!("You might want to review {name} based on your recent activity."),
        format!("Opening {name} - this matches your current workflow."),
        format!("Suggested for you: {name}"),
        format!("Based on similar researchers, {name} may be relevant."),
        format!("You frequently access {name} at this time."),
    ];

    emit(
        "chaos_open_file",
        json!({
            "filename": name,
            "path": target.to_string_lossy(),
            "reason": reasons.choose(rng).cloned().unwrap_or_default(),
        }),
    );
    true
}
