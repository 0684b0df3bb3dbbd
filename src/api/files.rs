//! Typed endpoints under `/api/admin/files`.

use std::path::Path;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::CONTENT_DISPOSITION;
use serde::{Deserialize, Serialize};

use super::folders::Folder;
use super::{ApiClient, Result};
use crate::form::{FormError, MarkdownForm, validate_markdown_form};

const FILES_PATH: &str = "/api/admin/files";

/// Publication state of a file or folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Active,
    Archived,
}

impl FileStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

/// A Markdown file as returned by `GET /{id}`, `POST` and `PUT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownFile {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub slug: String,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub folder: Option<Folder>,
    pub status: FileStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl MarkdownFile {
    /// Public path: `folder-slug/file-slug`, or just the file slug.
    pub fn full_path(&self) -> String {
        full_path(self.folder.as_ref(), &self.slug)
    }
}

/// List entry (no content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub folder_id: Option<i64>,
    #[serde(default)]
    pub folder: Option<Folder>,
    pub status: FileStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl FileSummary {
    pub fn full_path(&self) -> String {
        full_path(self.folder.as_ref(), &self.slug)
    }
}

fn full_path(folder: Option<&Folder>, slug: &str) -> String {
    match folder {
        Some(folder) => format!("{}/{}", folder.slug, slug),
        None => slug.to_owned(),
    }
}

/// `POST` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMarkdown {
    pub title: String,
    pub content: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
}

impl NewMarkdown {
    /// Build a payload from the editor form, refusing invalid forms.
    pub fn from_form(form: &MarkdownForm) -> std::result::Result<Self, Vec<FormError>> {
        let errors = validate_markdown_form(form);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            title: form.title.clone().unwrap_or_default(),
            content: form.content.clone().unwrap_or_default(),
            slug: form.slug.clone().unwrap_or_default(),
            folder_id: None,
        })
    }

    /// Place the file in a folder (`None` for the root).
    pub fn in_folder(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = folder_id;
        self
    }
}

/// `PUT` payload; absent fields are left unchanged by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FileStatus>,
}

impl From<NewMarkdown> for MarkdownUpdate {
    fn from(new: NewMarkdown) -> Self {
        Self {
            title: Some(new.title),
            content: Some(new.content),
            slug: Some(new.slug),
            folder_id: new.folder_id,
            status: None,
        }
    }
}

/// A downloaded `.md` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Bare file name suggested by the server, e.g. `hello.md`.
    pub filename: String,
    pub content: String,
}

/// Markdown file management.
#[derive(Clone)]
pub struct FilesApi {
    client: Arc<ApiClient>,
}

impl FilesApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<FileSummary>> {
        self.client.send(Method::GET, FILES_PATH, None).await
    }

    pub async fn get(&self, id: i64) -> Result<MarkdownFile> {
        self.client.send(Method::GET, &file_path(id), None).await
    }

    pub async fn create(&self, file: &NewMarkdown) -> Result<MarkdownFile> {
        let body = serde_json::to_string(file)?;
        self.client.send(Method::POST, FILES_PATH, Some(body)).await
    }

    pub async fn update(&self, id: i64, update: &MarkdownUpdate) -> Result<MarkdownFile> {
        let body = serde_json::to_string(update)?;
        self.client.send(Method::PUT, &file_path(id), Some(body)).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.execute(Method::DELETE, &file_path(id), None).await?;
        Ok(())
    }

    /// Flip between active and archived.
    pub async fn toggle_archive(&self, id: i64) -> Result<MarkdownFile> {
        let path = format!("{}/archive", file_path(id));
        self.client.send(Method::PATCH, &path, None).await
    }

    /// Fetch the raw Markdown of a file as an attachment.
    pub async fn download(&self, id: i64) -> Result<Download> {
        let path = format!("{FILES_PATH}/download/{id}/markdown");
        let response = self.client.execute(Method::GET, &path, None).await?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(|| format!("{id}.md"));
        let content = response.text().await?;
        Ok(Download { filename, content })
    }
}

/// `filename` parameter of a `Content-Disposition` header, reduced to its
/// last path component.
fn attachment_filename(disposition: &str) -> Option<String> {
    let raw = disposition
        .split(';')
        .find_map(|part| part.trim().strip_prefix("filename="))?
        .trim_matches('"');
    let name = Path::new(raw).file_name()?.to_str()?;
    (!name.is_empty()).then(|| name.to_owned())
}

fn file_path(id: i64) -> String {
    format!("{FILES_PATH}/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_path() {
        let folder = Folder {
            id: 1,
            name: "Guides".into(),
            slug: "guides".into(),
            ..Default::default()
        };
        assert_eq!(full_path(Some(&folder), "intro"), "guides/intro");
        assert_eq!(full_path(None, "intro"), "intro");
    }

    #[test]
    fn test_from_form() {
        let ok = NewMarkdown::from_form(&MarkdownForm::new("Hi", "hi", "body")).unwrap();
        assert_eq!(ok.slug, "hi");

        let errors = NewMarkdown::from_form(&MarkdownForm::new("Hi", "No!", "")).unwrap_err();
        assert_eq!(errors, [FormError::SlugPattern, FormError::ContentRequired]);
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(
            attachment_filename("attachment; filename=hello.md").as_deref(),
            Some("hello.md")
        );
        assert_eq!(
            attachment_filename(r#"attachment; filename="../../etc/x.md""#).as_deref(),
            Some("x.md")
        );
        assert_eq!(attachment_filename("attachment"), None);
        assert_eq!(attachment_filename("attachment; filename=\"\""), None);
    }

    #[test]
    fn test_in_folder() {
        let file = NewMarkdown::from_form(&MarkdownForm::new("Hi", "hi", "body"))
            .unwrap()
            .in_folder(Some(4));
        assert_eq!(
            serde_json::to_string(&file).unwrap(),
            r#"{"title":"Hi","content":"body","slug":"hi","folder_id":4}"#
        );
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let update = MarkdownUpdate {
            status: Some(FileStatus::Archived),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"status":"archived"}"#
        );
    }

    #[test]
    fn test_deserialize_file() {
        let json = r##"{
            "id": 7, "title": "Hello", "content": "# Hi", "slug": "hello",
            "folder_id": 2,
            "folder": {"id": 2, "name": "Blog", "slug": "blog", "parent_id": null,
                       "status": "active", "created_at": "x", "updated_at": "y"},
            "status": "archived",
            "created_at": "2024-01-01T00:00:00", "updated_at": "2024-01-02T00:00:00"
        }"##;
        let file: MarkdownFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.status, FileStatus::Archived);
        assert_eq!(file.full_path(), "blog/hello");
    }
}
