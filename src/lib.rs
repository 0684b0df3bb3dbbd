//! Admin-side toolkit for a Markdown CMS.
//!
//! | Module     | Purpose                                                     |
//! |------------|-------------------------------------------------------------|
//! | `slug`     | URL slug generation and the server's slug pattern           |
//! | `form`     | Validation of the editor form                               |
//! | `autosave` | Debounced auto-save wired to an editor's change events      |
//! | `api`      | Bearer-token api client, session storage, files endpoints   |
//! | `alert`    | Dismissible notifications with timed removal                |
//! | `config`   | `mdcms.toml`                                                |

pub mod logger;

pub mod alert;
pub mod api;
pub mod autosave;
pub mod config;
pub mod form;
pub mod slug;
mod utils;

pub use alert::show_notification;
pub use api::ApiClient;
pub use autosave::enable_auto_save;
pub use form::validate_markdown_form;
pub use slug::generate_slug;
