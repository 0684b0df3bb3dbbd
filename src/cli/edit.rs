//! `mdcms edit`: auto-save a local Markdown file to the CMS.
//!
//! ```text
//! FileEditor (notify) → Debouncer → EditSession::save → FilesApi (POST/PUT) → Notifier
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mdcms_admin::alert::{Notifier, TerminalAlerts};
use mdcms_admin::api::{ApiError, FilesApi, MarkdownUpdate, NewMarkdown};
use mdcms_admin::autosave::{FileEditor, enable_auto_save};
use mdcms_admin::form::MarkdownForm;
use mdcms_admin::{debug, generate_slug, log};
use tokio::sync::Mutex;

use super::{EditArgs, Session};

/// State shared by every save of one `edit` run.
struct EditSession {
    path: PathBuf,
    title: Option<String>,
    slug: Option<String>,
    folder_id: Option<i64>,
    /// CMS id, known once the first save created the file. Held for the
    /// whole of a save so saves never overlap.
    id: Mutex<Option<i64>>,
    files: FilesApi,
    notifier: Notifier,
}

pub async fn run(session: &Session, args: &EditArgs) -> Result<()> {
    let mut editor = FileEditor::open(&args.file)
        .with_context(|| format!("Failed to watch {}", args.file.display()))?;

    let delay = args
        .delay
        .map(Duration::from_millis)
        .unwrap_or_else(|| session.config.editor.autosave_delay());

    let notifier = Notifier::new(Arc::new(TerminalAlerts))
        .with_dismiss_after(session.config.alert.dismiss_after());

    let edit = Arc::new(EditSession {
        path: editor.path().to_path_buf(),
        title: args.title.clone(),
        slug: args.slug.clone(),
        folder_id: args.folder,
        id: Mutex::new(args.id),
        files: session.files(),
        notifier,
    });

    let saver = Arc::clone(&edit);
    let autosave = enable_auto_save(
        &mut editor,
        move || {
            let edit = Arc::clone(&saver);
            async move { edit.save().await }
        },
        Some(delay),
    );

    log!(
        "autosave";
        "watching {} (saves {}ms after the last change, Ctrl+C to stop)",
        edit.path.display(),
        delay.as_millis()
    );

    tokio::signal::ctrl_c().await?;
    if autosave.cancel() {
        log!("autosave"; "pending save discarded");
    }
    Ok(())
}

impl EditSession {
    async fn save(&self) {
        // A save that started earlier may still be waiting on the server.
        let mut id = self.id.lock().await;

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                self.notifier
                    .danger(format!("cannot read {}: {}", self.path.display(), e));
                return;
            }
        };

        let form = build_form(&self.path, &content, self.title.as_deref(), self.slug.as_deref());
        let payload = match NewMarkdown::from_form(&form) {
            Ok(payload) => payload.in_folder(self.folder_id),
            Err(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                self.notifier.danger(format!("not saved: {}", messages.join("; ")));
                return;
            }
        };

        let result = match *id {
            Some(existing) => {
                self.files
                    .update(existing, &MarkdownUpdate::from(payload))
                    .await
            }
            None => self.files.create(&payload).await,
        };

        match result {
            Ok(file) => {
                *id = Some(file.id);
                debug!("autosave"; "saved id={} updated_at={}", file.id, file.updated_at);
                self.notifier.success(format!("saved {}", file.full_path()));
            }
            Err(ApiError::Unauthorized) => {
                self.notifier
                    .danger("session expired, run `mdcms login <username>` and edit again");
            }
            Err(e) => {
                let detail = e.detail().unwrap_or_else(|| e.to_string());
                self.notifier.danger(format!("save failed: {detail}"));
            }
        }
    }
}

/// Form for `content`, filling title and slug when not given explicitly.
fn build_form(path: &Path, content: &str, title: Option<&str>, slug: Option<&str>) -> MarkdownForm {
    let title = title
        .map(str::to_owned)
        .unwrap_or_else(|| derive_title(path, content));
    let slug = slug
        .map(str::to_owned)
        .unwrap_or_else(|| generate_slug(&title));
    MarkdownForm {
        title: Some(title),
        slug: Some(slug),
        content: Some(content.to_owned()),
    }
}

/// First level-one heading, else the file stem.
fn derive_title(path: &Path, content: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| heading.trim().to_owned())
        .filter(|heading| !heading.is_empty())
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::thread;

    use mdcms_admin::alert::{AlertKind, AlertStack};
    use mdcms_admin::api::{ACCESS_TOKEN_KEY, ApiClient, LogNavigator, MemoryStorage};
    use mdcms_admin::autosave::Debouncer;
    use mdcms_admin::form::validate_markdown_form;
    use tempfile::TempDir;
    use tiny_http::{Response, Server};
    use url::Url;

    const FILE_JSON: &str = r#"{"id":5,"title":"Post","content":"body","slug":"post",
        "folder_id":null,"status":"active","created_at":"a","updated_at":"b"}"#;

    /// Requests seen by the test server as `METHOD url body`.
    type Seen = Arc<parking_lot::Mutex<Vec<String>>>;

    /// Answer every request with `(status, body)` after `latency`.
    fn serve(status: u16, body: &'static str, latency: Duration) -> (Url, Seen) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let seen = Seen::default();
        let log = Arc::clone(&seen);

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut received = String::new();
                request.as_reader().read_to_string(&mut received).unwrap();
                thread::sleep(latency);
                log.lock()
                    .push(format!("{} {} {}", request.method(), request.url(), received));
                let _ = request.respond(Response::from_string(body).with_status_code(status));
            }
        });

        (Url::parse(&format!("http://{addr}")).unwrap(), seen)
    }

    fn edit_session(
        base: Url,
        path: PathBuf,
        folder_id: Option<i64>,
    ) -> (Arc<EditSession>, Arc<AlertStack>) {
        let storage = Arc::new(MemoryStorage::with_item(ACCESS_TOKEN_KEY, "tok"));
        let navigator = Arc::new(LogNavigator::new(base.clone()));
        let client = Arc::new(ApiClient::new(base, storage, navigator));
        let alerts = Arc::new(AlertStack::new());

        let edit = Arc::new(EditSession {
            path,
            title: None,
            slug: None,
            folder_id,
            id: Mutex::new(None),
            files: FilesApi::new(client),
            notifier: Notifier::new(alerts.clone()),
        });
        (edit, alerts)
    }

    fn markdown_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("post.md");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn requests(seen: &Seen) -> Vec<String> {
        seen.lock()
            .iter()
            .map(|line| line.split(' ').take(2).collect::<Vec<_>>().join(" "))
            .collect()
    }

    #[tokio::test]
    async fn test_first_save_creates_then_updates() {
        let dir = TempDir::new().unwrap();
        let path = markdown_file(&dir, "# Post\nbody");
        let (base, seen) = serve(200, FILE_JSON, Duration::ZERO);
        let (edit, alerts) = edit_session(base, path, Some(3));

        edit.save().await;
        edit.save().await;

        assert_eq!(
            requests(&seen),
            ["POST /api/admin/files", "PUT /api/admin/files/5"]
        );
        assert!(seen.lock()[0].contains(r#""folder_id":3"#));
        assert_eq!(*edit.id.lock().await, Some(5));

        let shown = alerts.snapshot();
        assert_eq!(shown.len(), 2);
        assert!(shown.iter().all(|alert| alert.kind == AlertKind::Success));
        assert_eq!(shown[0].message, "saved post");
    }

    #[tokio::test]
    async fn test_overlapping_saves_create_once() {
        let dir = TempDir::new().unwrap();
        let path = markdown_file(&dir, "# Post\nbody");
        let (base, seen) = serve(200, FILE_JSON, Duration::from_millis(300));
        let (edit, _alerts) = edit_session(base, path, None);

        let saver = Arc::clone(&edit);
        let debouncer = Debouncer::new(Duration::from_millis(50), move || {
            let edit = Arc::clone(&saver);
            async move { edit.save().await }
        });

        debouncer.schedule();
        // First save is now waiting on the slow server.
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule();

        for _ in 0..60 {
            if seen.lock().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(
            requests(&seen),
            ["POST /api/admin/files", "PUT /api/admin/files/5"]
        );
    }

    #[tokio::test]
    async fn test_concurrent_saves_run_in_order() {
        let dir = TempDir::new().unwrap();
        let path = markdown_file(&dir, "# Post\nbody");
        let (base, seen) = serve(200, FILE_JSON, Duration::from_millis(100));
        let (edit, _alerts) = edit_session(base, path, None);

        tokio::join!(edit.save(), edit.save(), edit.save());

        assert_eq!(
            requests(&seen),
            [
                "POST /api/admin/files",
                "PUT /api/admin/files/5",
                "PUT /api/admin/files/5"
            ]
        );
    }

    #[tokio::test]
    async fn test_unauthorized_save_notifies() {
        let dir = TempDir::new().unwrap();
        let path = markdown_file(&dir, "# Post\nbody");
        let (base, _seen) = serve(401, r#"{"detail":"Not authenticated"}"#, Duration::ZERO);
        let (edit, alerts) = edit_session(base, path, None);

        edit.save().await;

        let shown = alerts.snapshot();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].kind, AlertKind::Danger);
        assert!(shown[0].message.starts_with("session expired"));
        assert_eq!(*edit.id.lock().await, None);
    }

    #[tokio::test]
    async fn test_server_error_detail_is_shown() {
        let dir = TempDir::new().unwrap();
        let path = markdown_file(&dir, "# Post\nbody");
        let detail = r#"{"detail":"File with this slug already exists in this folder"}"#;
        let (base, _seen) = serve(400, detail, Duration::ZERO);
        let (edit, alerts) = edit_session(base, path, None);

        edit.save().await;

        assert_eq!(
            alerts.snapshot()[0].message,
            "save failed: File with this slug already exists in this folder"
        );
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_sent() {
        let dir = TempDir::new().unwrap();
        let path = markdown_file(&dir, "   ");
        let (base, seen) = serve(200, FILE_JSON, Duration::ZERO);
        let (edit, alerts) = edit_session(base, path, None);

        edit.save().await;

        assert!(seen.lock().is_empty());
        let shown = alerts.snapshot();
        assert_eq!(shown[0].kind, AlertKind::Danger);
        assert_eq!(shown[0].message, "not saved: Content is required");
    }

    #[test]
    fn test_title_from_heading() {
        let path = Path::new("/notes/draft.md");
        assert_eq!(derive_title(path, "intro\n# Hello There \nbody"), "Hello There");
        assert_eq!(derive_title(path, "## Sub\nbody"), "draft");
        assert_eq!(derive_title(path, "#   \nbody"), "draft");
    }

    #[test]
    fn test_form_defaults() {
        let form = build_form(Path::new("post.md"), "# My First Post!\ntext", None, None);
        assert_eq!(form.title.as_deref(), Some("My First Post!"));
        assert_eq!(form.slug.as_deref(), Some("my-first-post"));
        assert!(validate_markdown_form(&form).is_empty());
    }

    #[test]
    fn test_form_explicit_values_win() {
        let form = build_form(Path::new("post.md"), "# Heading", Some("Title"), Some("Bad Slug"));
        assert_eq!(form.title.as_deref(), Some("Title"));
        assert_eq!(form.slug.as_deref(), Some("Bad Slug"));
        assert_eq!(validate_markdown_form(&form).len(), 1);
    }
}
