pub mod auth;
pub mod config;
pub mod document;
pub mod models;
pub mod normalize;
pub mod notify;
pub mod report;
pub mod spreadsheet;
pub mod store;

// Re-export commonly used types
pub use auth::{CredentialVerifier, SessionStore, StaticCredentials};
pub use config::{config_path, AppConfig, SmtpConfig};
pub use document::{render_form, render_report};
pub use models::{
    alert_reasons, dispositions, FormRecord, ReportRow, ALERT_DESCRIPTIONS, DISPOSITION_LABELS,
};
pub use normalize::{format_date, normalize_contract, parse_date, DATE_FORMATS};
pub use notify::{compose_body, notify_all, split_recipients, Mailer, SmtpMailer};
pub use report::collect;
pub use spreadsheet::upsert_response;
pub use store::{FormStore, StoreError};
