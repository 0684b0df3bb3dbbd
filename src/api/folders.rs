//! Typed endpoints under `/api/admin/folders`.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::files::FileStatus;
use super::{ApiClient, Result};
use crate::slug::generate_slug;

const FOLDERS_PATH: &str = "/api/admin/folders";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub status: FileStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// `POST` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFolder {
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

impl NewFolder {
    /// Root folder with a slug generated from `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: generate_slug(&name),
            name,
            parent_id: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_parent(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// `PUT` payload; absent fields are left unchanged by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FileStatus>,
}

/// Folder management.
#[derive(Clone)]
pub struct FoldersApi {
    client: Arc<ApiClient>,
}

impl FoldersApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Every folder; archived ones only when asked for.
    pub async fn list(&self, include_archived: bool) -> Result<Vec<Folder>> {
        let path = with_archived(&format!("{FOLDERS_PATH}/"), include_archived);
        self.client.send(Method::GET, &path, None).await
    }

    /// Folders without a parent.
    pub async fn roots(&self, include_archived: bool) -> Result<Vec<Folder>> {
        let path = with_archived(&format!("{FOLDERS_PATH}/root"), include_archived);
        self.client.send(Method::GET, &path, None).await
    }

    pub async fn get(&self, id: i64) -> Result<Folder> {
        self.client.send(Method::GET, &folder_path(id), None).await
    }

    pub async fn create(&self, folder: &NewFolder) -> Result<Folder> {
        let body = serde_json::to_string(folder)?;
        let path = format!("{FOLDERS_PATH}/");
        self.client.send(Method::POST, &path, Some(body)).await
    }

    pub async fn update(&self, id: i64, update: &FolderUpdate) -> Result<Folder> {
        let body = serde_json::to_string(update)?;
        self.client.send(Method::PUT, &folder_path(id), Some(body)).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.execute(Method::DELETE, &folder_path(id), None).await?;
        Ok(())
    }

    /// Flip a folder and everything inside it between active and archived.
    pub async fn toggle_archive(&self, id: i64) -> Result<Folder> {
        let path = format!("{}/archive", folder_path(id));
        self.client.send(Method::PATCH, &path, None).await
    }
}

fn folder_path(id: i64) -> String {
    format!("{FOLDERS_PATH}/{id}")
}

fn with_archived(path: &str, include_archived: bool) -> String {
    if include_archived {
        format!("{path}?include_archived=true")
    } else {
        path.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_folder_slug() {
        let folder = NewFolder::new("Release Notes");
        assert_eq!(folder.slug, "release-notes");
        assert_eq!(
            serde_json::to_string(&folder).unwrap(),
            r#"{"name":"Release Notes","slug":"release-notes"}"#
        );

        let nested = NewFolder::new("Drafts").with_slug("wip").with_parent(Some(2));
        assert_eq!(
            serde_json::to_string(&nested).unwrap(),
            r#"{"name":"Drafts","slug":"wip","parent_id":2}"#
        );
    }

    #[test]
    fn test_with_archived() {
        assert_eq!(with_archived("/f/", false), "/f/");
        assert_eq!(with_archived("/f/", true), "/f/?include_archived=true");
    }
}
