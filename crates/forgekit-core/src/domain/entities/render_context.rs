//! The variables templates are rendered against.
//!
//! ## Built-in Variables
//!
//! | Variable | Example | Source |
//! |----------|---------|--------|
//! | `project_name` | "sample-api" | Config |
//! | `project_name_snake` | "sample_api" | Computed |
//! | `project_name_pascal` | "SampleApi" | Computed |
//! | `orm` / `database` / `package_manager` | "prisma" | Config |
//! | `docker` / `testing` | true | Config |
//! | `is_sql` | true | Computed from `database` |
//! | `run_cmd` / `exec_cmd` / `install_cmd` | "npm run" | Computed from `package_manager` |
//! | `year` | 2026 | System clock |
//! | `generator_version` | "0.1.0" | Crate version |

use chrono::Datelike;
use serde::Serialize;

use crate::domain::digest::sha256_hex;
use crate::domain::entities::ProjectConfig;

/// Serializable view of a [`ProjectConfig`] handed to the template engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderContext {
    pub project_name: String,
    pub project_name_snake: String,
    pub project_name_pascal: String,
    pub orm: String,
    pub database: String,
    pub package_manager: String,
    pub docker: bool,
    pub testing: bool,
    pub is_sql: bool,
    pub run_cmd: String,
    pub exec_cmd: String,
    pub install_cmd: String,
    pub year: i32,
    pub generator_version: String,
}

impl RenderContext {
    /// Derive every variable from the configuration record.
    pub fn from_config(config: &ProjectConfig) -> Self {
        let name = config.project_name();
        let pm = config.package_manager();

        Self {
            project_name: name.to_string(),
            project_name_snake: to_snake_case(name),
            project_name_pascal: to_pascal_case(name),
            orm: config.orm().as_str().to_string(),
            database: config.database().as_str().to_string(),
            package_manager: pm.as_str().to_string(),
            docker: config.docker(),
            testing: config.testing(),
            is_sql: config.database().is_sql(),
            run_cmd: pm.run_cmd().to_string(),
            exec_cmd: pm.exec_cmd().to_string(),
            install_cmd: pm.install_cmd().to_string(),
            year: chrono::Utc::now().year(),
            generator_version: crate::VERSION.to_string(),
        }
    }

    /// Pin the year (tests and reproducible builds).
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    /// Override the reported generator version.
    pub fn with_generator_version(mut self, version: impl Into<String>) -> Self {
        self.generator_version = version.into();
        self
    }

    /// SHA-256 hex over every variable. Two contexts with the same
    /// fingerprint render any template identically.
    pub fn fingerprint(&self) -> String {
        match serde_json::to_vec(self) {
            Ok(json) => sha256_hex(json),
            Err(_) => sha256_hex(format!("{self:?}")),
        }
    }
}

// ============================================================================
// String Case Conversion Helpers
// ============================================================================

/// Convert a string to snake_case.
///
/// | Input | Output |
/// |-------|--------|
/// | "sample-api" | "sample_api" |
/// | "HTTPRequest" | "http_request" |
pub fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

/// Convert a string to PascalCase.
///
/// | Input | Output |
/// |-------|--------|
/// | "sample-api" | "SampleApi" |
/// | "api2-gateway" | "Api2Gateway" |
pub fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Split a string into lowercase words.
///
/// Separators (`_`, `-`, whitespace) always split. A lower-to-upper
/// transition splits (`myApp`), as does the end of an acronym
/// (`HTTPServer` splits before `S`).
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        current.push(c);

        if let Some(&next) = chars.peek() {
            let camel = c.is_lowercase() && next.is_uppercase();
            let acronym_end = c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(char::is_lowercase);
            if camel || acronym_end {
                words.push(current.to_lowercase());
                current.clear();
            }
        }
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}
