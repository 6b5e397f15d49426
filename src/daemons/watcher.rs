//! The file watcher daemon: the grounded-in-reality producer. Watches the
//! user's Desktop and Documents with OS file notifications and reports
//! actual changes as records.

use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher};
use serde_json::{json, Value};

use super::emit;

/// Watch the user's directories until the process is killed.
pub fn run(home: &Path) -> Result<()> {
    println!("[WATCHER] Starting file watcher daemon");

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("create filesystem watcher")?;

    for dir in [home.join("Desktop"), home.join("Documents")] {
        if dir.exists() {
            watcher
                .watch(&dir, RecursiveMode::Recursive)
                .with_context(|| format!("watch {}", dir.display()))?;
            println!("[WATCHER] Watching: {}", dir.display());
        }
    }

    for event in rx {
        match event {
            Ok(event) => {
                if let Some((kind, fields)) = map_event(&event) {
                    emit(kind, fields);
                }
            }
            Err(e) => println!("[WATCHER] Error: {e}"),
        }
    }
    Ok(())
}

/// Translate a raw notification into a record kind and payload.
///
/// Rename events with both paths become one `file_renamed`; one-sided
/// renames degrade to delete/create so viewers still see a change.
fn map_event(event: &notify::Event) -> Option<(&'static str, Value)> {
    let path = event.paths.first()?;
    match &event.kind {
        EventKind::Create(kind) => Some((
            "file_created",
            path_payload(path, matches!(kind, CreateKind::Folder)),
        )),
        EventKind::Remove(kind) => Some((
            "file_deleted",
            path_payload(path, matches!(kind, RemoveKind::Folder)),
        )),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let new_path = event.paths.get(1)?;
            Some((
                "file_renamed",
                json!({
                    "old_path": path.to_string_lossy(),
                    "new_path": new_path.to_string_lossy(),
                    "is_directory": new_path.is_dir(),
                }),
            ))
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            Some(("file_deleted", path_payload(path, false)))
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            Some(("file_created", path_payload(path, path.is_dir())))
        }
        EventKind::Modify(_) => Some(("file_modified", path_payload(path, path.is_dir()))),
        _ => None,
    }
}

fn path_payload(path: &Path, is_directory: bool) -> Value {
    json!({
        "path": path.to_string_lossy(),
        "is_directory": is_directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::DataChange;
    use notify::Event;
    use std::path::PathBuf;

    #[test]
    fn test_map_create_file() {
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/home/mira/Desktop/notes.txt"));
        let (kind, fields) = map_event(&event).unwrap();
        assert_eq!(kind, "file_created");
        assert_eq!(fields["path"], "/home/mira/Desktop/notes.txt");
        assert_eq!(fields["is_directory"], false);
    }

    #[test]
    fn test_map_remove_folder() {
        let event = Event::new(EventKind::Remove(RemoveKind::Folder))
            .add_path(PathBuf::from("/home/mira/Desktop/specimens"));
        let (kind, fields) = map_event(&event).unwrap();
        assert_eq!(kind, "file_deleted");
        assert_eq!(fields["is_directory"], true);
    }

    #[test]
    fn test_map_rename_carries_both_paths() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/d/a.txt"))
            .add_path(PathBuf::from("/d/IMPORTANT_a.txt"));
        let (kind, fields) = map_event(&event).unwrap();
        assert_eq!(kind, "file_renamed");
        assert_eq!(fields["old_path"], "/d/a.txt");
        assert_eq!(fields["new_path"], "/d/IMPORTANT_a.txt");
    }

    #[test]
    fn test_map_data_change_is_modified() {
        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/d/a.txt"));
        let (kind, _) = map_event(&event).unwrap();
        assert_eq!(kind, "file_modified");
    }

    #[test]
    fn test_map_access_events_are_dropped() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/d/a.txt"));
        assert!(map_event(&event).is_none());
    }

    #[test]
    fn test_map_event_without_paths_is_dropped() {
        let event = Event::new(EventKind::Create(CreateKind::File));
        assert!(map_event(&event).is_none());
    }
}
