//! Debounced auto-save.
//!
//! ```text
//! Editor::on_change → listener → Debouncer::schedule → (quiet for `delay`) → save()
//! ```
//!
//! Any type that can report content changes implements [`Editor`]. The
//! [`Debouncer`] returned by [`enable_auto_save`] is the only place the
//! pending save lives, so whoever wires the editor owns it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

mod debouncer;
mod file_editor;


pub use debouncer::Debouncer;
pub use file_editor::FileEditor;

/// Delay between the last change and the save.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(3000);

/// Callback invoked on every content change.
pub type ChangeListener = Box<dyn Fn() + Send + Sync + 'static>;

/// Change-notification capability of an editor.
pub trait Editor {
    /// Register a listener called after each content change.
    fn on_change(&mut self, listener: ChangeListener);
}

/// Wire `save` to run after `editor` has been quiet for `delay`
/// (default [`DEFAULT_AUTOSAVE_DELAY`]).
///
/// Bursts of changes collapse into one trailing save. The returned
/// controller can cancel a pending save; dropping every reference to it
/// (including the one held by the editor's listener) cancels it as well.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn enable_auto_save<E, F, Fut>(
    editor: &mut E,
    save: F,
    delay: Option<Duration>,
) -> Arc<Debouncer<F>>
where
    E: Editor + ?Sized,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let debouncer = Arc::new(Debouncer::new(
        delay.unwrap_or(DEFAULT_AUTOSAVE_DELAY),
        save,
    ));

    let listener = Arc::clone(&debouncer);
    editor.on_change(Box::new(move || listener.schedule()));

    debouncer
}
