//! Command-line interface module.

mod args;
pub mod edit;

pub use args::{
    Cli, Commands, EditArgs, FilesCommand, FoldersCommand, RequestArgs, ValidateArgs,
};

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use mdcms_admin::api::{
    ApiClient, Download, FileStorage, FilesApi, FoldersApi, LogNavigator, NewFolder,
    RequestOptions,
};
use mdcms_admin::config::AdminConfig;
use mdcms_admin::form::{MarkdownForm, validate_markdown_form};
use mdcms_admin::{generate_slug, log};
use owo_colors::OwoColorize;
use reqwest::Method;

/// Config plus the api client built from it.
pub struct Session {
    pub config: AdminConfig,
    pub client: Arc<ApiClient>,
}

impl Session {
    pub fn new(config: AdminConfig) -> Self {
        let storage = Arc::new(FileStorage::new(&config.api.token_file));
        let navigator = Arc::new(LogNavigator::new(config.api.base_url.clone()));
        let client = Arc::new(ApiClient::from_config(&config.api, storage, navigator));
        Self { config, client }
    }

    pub fn files(&self) -> FilesApi {
        FilesApi::new(Arc::clone(&self.client))
    }

    pub fn folders(&self) -> FoldersApi {
        FoldersApi::new(Arc::clone(&self.client))
    }
}

pub fn slug(text: &[String]) {
    println!("{}", generate_slug(&text.join(" ")));
}

pub fn validate(args: &ValidateArgs) -> Result<()> {
    let content = match &args.file {
        Some(path) => Some(
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => args.content.clone(),
    };
    let form = MarkdownForm {
        title: args.title.clone(),
        slug: args.slug.clone(),
        content,
    };

    let errors = validate_markdown_form(&form);
    if args.json {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        println!("{}", serde_json::to_string(&messages)?);
    } else if errors.is_empty() {
        println!("{}", "form is valid".green());
    } else {
        for error in &errors {
            println!("{} {}: {}", "✗".red(), error.field().cyan(), error);
        }
    }

    if !errors.is_empty() {
        bail!("{} validation error(s)", errors.len());
    }
    Ok(())
}

pub async fn login(session: &Session, username: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(password) => password.to_owned(),
        None => read_password()?,
    };
    session.client.login(username, &password).await?;
    Ok(())
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

pub fn logout(session: &Session) {
    session.client.logout();
    log!("auth"; "signed out");
}

pub async fn request(session: &Session, args: &RequestArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("invalid method `{}`", args.method))?;

    let mut options = RequestOptions::new().method(method);
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| anyhow!("header must look like `Name: value`, got `{header}`"))?;
        options = options.try_header(name, value)?;
    }
    if let Some(data) = &args.data {
        options = options.body(data.clone());
    }

    let Some(response) = session.client.request(&args.url, options).await? else {
        bail!("not signed in, run `mdcms login <username>`");
    };

    let status = response.status();
    log!("api"; "{}", status);
    let body = response.text().await?;
    println!("{body}");

    if !status.is_success() {
        bail!("request failed with {status}");
    }
    Ok(())
}

pub async fn files(session: &Session, command: &FilesCommand) -> Result<()> {
    let files = session.files();
    match command {
        FilesCommand::List => {
            for file in files.list().await? {
                println!(
                    "{:>5}  {:<8}  {}  {}",
                    file.id,
                    file.status.label(),
                    file.full_path().cyan(),
                    file.title
                );
            }
        }
        FilesCommand::Archive { id } => {
            let file = files.toggle_archive(*id).await?;
            log!("files"; "{} is now {}", file.full_path(), file.status.label());
        }
        FilesCommand::Delete { id } => {
            files.delete(*id).await?;
            log!("files"; "deleted {}", id);
        }
        FilesCommand::Download { id, output } => {
            let download = files.download(*id).await?;
            let path = write_download(&download, output.as_deref())?;
            log!("files"; "wrote {}", path.display());
        }
    }
    Ok(())
}

/// Write `download` to `output`, or under its own name in the current directory.
fn write_download(download: &Download, output: Option<&Path>) -> Result<PathBuf> {
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&download.filename));
    fs::write(&path, &download.content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub async fn folders(session: &Session, command: &FoldersCommand) -> Result<()> {
    let folders = session.folders();
    match command {
        FoldersCommand::List { archived, root } => {
            let listed = if *root {
                folders.roots(*archived).await?
            } else {
                folders.list(*archived).await?
            };
            for folder in listed {
                let parent = folder.parent_id.map(|id| id.to_string()).unwrap_or_default();
                println!(
                    "{:>5}  {:<8}  {:>6}  {}  {}",
                    folder.id,
                    folder.status.label(),
                    parent,
                    folder.slug.cyan(),
                    folder.name
                );
            }
        }
        FoldersCommand::Create { name, slug, parent } => {
            let mut new = NewFolder::new(name.as_str()).with_parent(*parent);
            if let Some(slug) = slug {
                new = new.with_slug(slug.as_str());
            }
            let folder = folders.create(&new).await?;
            log!("folders"; "created {} (id {})", folder.slug, folder.id);
        }
        FoldersCommand::Archive { id } => {
            let folder = folders.toggle_archive(*id).await?;
            log!("folders"; "{} is now {}", folder.slug, folder.status.label());
        }
        FoldersCommand::Delete { id } => {
            folders.delete(*id).await?;
            log!("folders"; "deleted {}", id);
        }
    }
    Ok(())
}
