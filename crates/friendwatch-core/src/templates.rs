//! Notification text rendering via `minijinja`.
//!
//! Four templates are built in: `gained`, `lost`, `summary`, and `details`.
//! Operators can replace any of them by dropping `<name>.j2` into a
//! templates directory; missing files fall back to the built-in text.
//!
//! Output uses Telegram's HTML subset, so account labels are escaped
//! before they reach a template.

use std::path::{Path, PathBuf};

use friendwatch_types::{Account, ChangeEvent, ChangeKind, Snapshot};
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::info;

const GAINED: &str = "🎮 <b>New Friend Alert!</b>\n\n\
{{ account }}: {{ previous }} → {{ current }} (+{{ change }})";

const LOST: &str = "❌ <b>Friend Removed</b>\n\n\
{{ account }}: {{ previous }} → {{ current }} (-{{ change }})";

const SUMMARY: &str = "📊 <b>Initial Setup Complete</b>\n\n\
✅ Monitoring {{ monitored }} accounts\n\
{% if unavailable > 0 %}🔒 {{ unavailable }} accounts are private or unreachable\n{% endif %}\
\n<i>Bot will now notify on friend changes only.</i>";

const DETAILS: &str = "📋 <b>Account Details</b>\n\n\
{% for row in rows %}• {{ row.account }}: {{ row.count }} friends\n{% endfor %}";

const TEMPLATE_NAMES: [(&str, &str); 4] = [
    ("gained", GAINED),
    ("lost", LOST),
    ("summary", SUMMARY),
    ("details", DETAILS),
];

/// Default prefix turned into a profile link by appending the account id.
pub const DEFAULT_PROFILE_PREFIX: &str = "steamcommunity.com/profiles/";

/// Default upper bound on roster size for the first-run detail listing.
pub const DEFAULT_DETAIL_LISTING_LIMIT: usize = 50;

/// Errors from loading or rendering message templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// An override file exists but could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        /// Template file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

#[derive(Serialize)]
struct DetailRow {
    account: String,
    count: u64,
}

/// Renders every notification the monitor sends.
pub struct MessageFormatter {
    env: Environment<'static>,
    profile_prefix: String,
    detail_limit: usize,
}

impl MessageFormatter {
    /// Build a formatter using only the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Template`] if a built-in template fails to
    /// compile.
    pub fn new(
        profile_prefix: impl Into<String>,
        detail_limit: usize,
    ) -> Result<Self, TemplateError> {
        Self::with_overrides(None, profile_prefix, detail_limit)
    }

    /// Build a formatter, taking `<name>.j2` from `templates_dir` where
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Io`] if an override exists but cannot be
    /// read, or [`TemplateError::Template`] if any template fails to
    /// compile.
    pub fn with_overrides(
        templates_dir: Option<&Path>,
        profile_prefix: impl Into<String>,
        detail_limit: usize,
    ) -> Result<Self, TemplateError> {
        let mut env = Environment::new();

        for (name, builtin) in TEMPLATE_NAMES {
            let source = match templates_dir {
                Some(dir) => load_override(dir, name)?,
                None => None,
            };
            match source {
                Some(source) => {
                    info!(template = name, "using template override");
                    env.add_template_owned(name, source)?;
                }
                None => env.add_template(name, builtin)?,
            }
        }

        Ok(Self {
            env,
            profile_prefix: profile_prefix.into(),
            detail_limit,
        })
    }

    /// How an account appears in messages: `label (link)` or just the link.
    pub fn account_display(&self, account: &Account) -> String {
        let link = format!("{}{}", self.profile_prefix, account.id);
        match &account.label {
            Some(label) => format!("{} ({link})", escape_html(label)),
            None => link,
        }
    }

    /// Render the notification for a single change event.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Template`] if rendering fails.
    pub fn change(&self, event: &ChangeEvent) -> Result<String, TemplateError> {
        let name = match event.kind() {
            ChangeKind::Gained => "gained",
            ChangeKind::Lost => "lost",
        };
        let text = self.env.get_template(name)?.render(context! {
            account => self.account_display(&event.account),
            previous => event.previous,
            current => event.current,
            change => event.magnitude(),
            delta => event.delta,
        })?;
        Ok(text)
    }

    /// Render the first-run summary.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Template`] if rendering fails.
    pub fn summary(&self, monitored: usize, unavailable: usize) -> Result<String, TemplateError> {
        let text = self.env.get_template("summary")?.render(context! {
            monitored => monitored,
            unavailable => unavailable,
        })?;
        Ok(text)
    }

    /// Render the per-account listing sent after the first-run summary.
    ///
    /// Returns `None` when no account was observed or when more accounts
    /// were observed than the listing limit allows.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Template`] if rendering fails.
    pub fn details(
        &self,
        accounts: &[Account],
        current: &Snapshot,
    ) -> Result<Option<String>, TemplateError> {
        let rows: Vec<DetailRow> = accounts
            .iter()
            .filter_map(|account| {
                current.get(&account.id).map(|count| DetailRow {
                    account: self.account_display(account),
                    count,
                })
            })
            .collect();

        if rows.is_empty() || rows.len() > self.detail_limit {
            return Ok(None);
        }

        let text = self
            .env
            .get_template("details")?
            .render(context! { rows => rows })?;
        Ok(Some(text.trim_end().to_owned()))
    }
}

/// Read `<dir>/<name>.j2` if it exists.
fn load_override(dir: &Path, name: &str) -> Result<Option<String>, TemplateError> {
    let path = dir.join(format!("{name}.j2"));
    match std::fs::read_to_string(&path) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(TemplateError::Io { path, source }),
    }
}

/// Escape the characters Telegram's HTML parse mode treats as markup.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
