//! An [`Editor`] backed by a file on disk.
//!
//! Changes are whatever an external editor writes to the file. The parent
//! directory is watched, not the file itself, so atomic-rename saves
//! (vim, most IDEs) are still seen.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::{ChangeListener, Editor};

type Listeners = Arc<Mutex<Vec<ChangeListener>>>;

/// Watches a single Markdown file and reports content changes.
pub struct FileEditor {
    path: PathBuf,
    listeners: Listeners,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
}

impl FileEditor {
    /// Start watching `path`. The file must exist.
    pub fn open(path: impl AsRef<Path>) -> notify::Result<Self> {
        let path = fs::canonicalize(path.as_ref())?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let listeners: Listeners = Arc::new(Mutex::new(Vec::new()));

        let target = path.clone();
        let callback_listeners = Arc::clone(&listeners);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if is_content_change(&event, &target) => {
                    crate::debug!("watch"; "{:?} {}", event.kind, target.display());
                    for listener in callback_listeners.lock().iter() {
                        listener();
                    }
                }
                Ok(_) => {}
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            path,
            listeners,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file content.
    pub fn content(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

impl Editor for FileEditor {
    fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.lock().push(listener);
    }
}

/// Data writes, creates and renames that touch `target`.
///
/// Metadata-only changes (mtime/atime/chmod) are noise and would trigger
/// saves without edits.
fn is_content_change(event: &notify::Event, target: &Path) -> bool {
    let relevant = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(modify) => !matches!(modify, notify::event::ModifyKind::Metadata(_)),
        _ => false,
    };
    relevant && event.paths.iter().any(|p| p == target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event {
            kind,
            paths: vec![PathBuf::from(path)],
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_content_change_filter() {
        let target = Path::new("/notes/post.md");

        assert!(is_content_change(
            &event(EventKind::Modify(ModifyKind::Data(DataChange::Any)), "/notes/post.md"),
            target
        ));
        assert!(is_content_change(
            &event(EventKind::Create(CreateKind::File), "/notes/post.md"),
            target
        ));
        assert!(!is_content_change(
            &event(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
                "/notes/post.md"
            ),
            target
        ));
        assert!(!is_content_change(
            &event(EventKind::Remove(RemoveKind::File), "/notes/post.md"),
            target
        ));
        assert!(!is_content_change(
            &event(EventKind::Modify(ModifyKind::Data(DataChange::Any)), "/notes/other.md"),
            target
        ));
    }

    #[test]
    fn test_open_and_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("post.md");
        fs::write(&file, "# Title\n").unwrap();

        let editor = FileEditor::open(&file).unwrap();
        assert_eq!(editor.content().unwrap(), "# Title\n");
        assert!(editor.path().ends_with("post.md"));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(FileEditor::open(dir.path().join("nope.md")).is_err());
    }
}
