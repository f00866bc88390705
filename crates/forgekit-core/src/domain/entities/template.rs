//! Template identity and file-naming conventions.
//!
//! A template tree is addressed by [`TemplateId`]: a forward-slash logical
//! path relative to the tree root (`base/src/index.ts.tera`). File names
//! carry two pieces of metadata that [`TemplateFileName`] decodes:
//!
//! - the reserved [`TEMPLATE_SUFFIX`] (`.tera`): the file is rendered and
//!   written with the suffix stripped; anything else is copied verbatim;
//! - an optional variant tag, a dot-separated segment `<axis>-<value>`
//!   (`database.db-postgresql.ts.tera`). A tagged file is emitted, with the
//!   tag removed, only when the configuration selects that value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{entities::ProjectConfig, error::DomainError};

/// Reserved suffix marking a file as a template source.
pub const TEMPLATE_SUFFIX: &str = ".tera";

// ============================================================================
// Template Identity
// ============================================================================

/// Logical path of one entry in a template tree.
///
/// ## Constraints
///
/// - Non-empty, forward-slash separated
/// - No empty, `.` or `..` segments
/// - No leading slash, no backslashes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let invalid = |reason: &str| DomainError::InvalidTemplateId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        if id.is_empty() {
            return Err(invalid("identity cannot be empty"));
        }
        if id.starts_with('/') {
            return Err(invalid("identity must be relative"));
        }
        if id.contains('\\') {
            return Err(invalid("use '/' as the separator"));
        }
        if id
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..")
        {
            return Err(invalid("empty, '.' or '..' segment"));
        }

        Ok(Self(id))
    }

    /// Append one or more `/`-separated segments.
    pub fn join(&self, segment: &str) -> Result<Self, DomainError> {
        Self::new(format!("{}/{}", self.0, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The enclosing directory, or `None` for a top-level entry.
    pub fn parent(&self) -> Option<TemplateId> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| TemplateId(parent.to_string()))
    }

    /// Whether `self` is `other` or lies beneath it.
    pub fn starts_with(&self, other: &TemplateId) -> bool {
        self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0[other.0.len()..].starts_with('/'))
    }

    /// Path segments, for mapping onto a native filesystem.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TemplateId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TemplateId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TemplateId> for String {
    fn from(id: TemplateId) -> Self {
        id.0
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Tree entries
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateEntryKind {
    File,
    Directory,
}

/// One direct child returned by a template source listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateEntry {
    pub id: TemplateId,
    pub kind: TemplateEntryKind,
}

impl TemplateEntry {
    pub fn file(id: TemplateId) -> Self {
        Self {
            id,
            kind: TemplateEntryKind::File,
        }
    }

    pub fn directory(id: TemplateId) -> Self {
        Self {
            id,
            kind: TemplateEntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == TemplateEntryKind::Directory
    }
}

// ============================================================================
// Variant tags
// ============================================================================

/// The configuration field a variant tag is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantAxis {
    /// `db-<database>`
    Database,
    /// `orm-<orm>`
    Orm,
    /// `pm-<package manager>`
    PackageManager,
}

impl VariantAxis {
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Database => "db",
            Self::Orm => "orm",
            Self::PackageManager => "pm",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "db" => Some(Self::Database),
            "orm" => Some(Self::Orm),
            "pm" => Some(Self::PackageManager),
            _ => None,
        }
    }

    /// The configuration's value on this axis.
    pub fn selected_value(&self, config: &ProjectConfig) -> &'static str {
        match self {
            Self::Database => config.database().as_str(),
            Self::Orm => config.orm().as_str(),
            Self::PackageManager => config.package_manager().as_str(),
        }
    }
}

/// A parsed `<axis>-<value>` name segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantTag {
    pub axis: VariantAxis,
    pub value: String,
}

impl VariantTag {
    /// Parse one name segment. Unknown axes are not tags.
    pub fn parse(segment: &str) -> Option<Self> {
        let (axis, value) = segment.split_once('-')?;
        let axis = VariantAxis::from_tag(axis)?;
        if value.is_empty() {
            return None;
        }
        Some(Self {
            axis,
            value: value.to_string(),
        })
    }

    pub fn matches(&self, config: &ProjectConfig) -> bool {
        self.axis.selected_value(config) == self.value
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.axis.tag(), self.value)
    }
}

// ============================================================================
// File names
// ============================================================================

/// Decoded form of a template file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFileName {
    output: String,
    variant: Option<VariantTag>,
    rendered: bool,
}

impl TemplateFileName {
    /// Decode a bare file name (no directory part).
    ///
    /// The first segment after the stem that parses as a [`VariantTag`] is
    /// the tag; for dotfiles the stem is the part after the leading dot.
    pub fn parse(file_name: &str) -> Self {
        let (base, rendered) = match file_name.strip_suffix(TEMPLATE_SUFFIX) {
            Some(stripped) if !stripped.is_empty() => (stripped, true),
            _ => (file_name, false),
        };

        let segments: Vec<&str> = base.split('.').collect();
        let first_candidate = if base.starts_with('.') { 2 } else { 1 };

        let tagged = segments
            .iter()
            .enumerate()
            .skip(first_candidate)
            .find_map(|(i, seg)| VariantTag::parse(seg).map(|tag| (i, tag)));

        match tagged {
            Some((index, tag)) => {
                let output = segments
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, seg)| *seg)
                    .collect::<Vec<_>>()
                    .join(".");
                Self {
                    output,
                    variant: Some(tag),
                    rendered,
                }
            }
            None => Self {
                output: base.to_string(),
                variant: None,
                rendered,
            },
        }
    }

    /// Name written into the project.
    pub fn output_name(&self) -> &str {
        &self.output
    }

    pub fn variant(&self) -> Option<&VariantTag> {
        self.variant.as_ref()
    }

    /// Whether the file goes through the template engine.
    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Untagged files are always selected.
    pub fn is_selected_by(&self, config: &ProjectConfig) -> bool {
        self.variant
            .as_ref()
            .is_none_or(|tag| tag.matches(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Database, Orm, PackageManager};

    fn config(db: Database) -> ProjectConfig {
        ProjectConfig::builder()
            .name("sample-api")
            .orm(Orm::Prisma)
            .database(db)
            .package_manager(PackageManager::Pnpm)
            .build()
            .unwrap()
    }

    // ── TemplateId ────────────────────────────────────────────────────────────

    #[test]
    fn template_id_accepts_relative_paths() {
        let id = TemplateId::new("base/src/index.ts.tera").unwrap();
        assert_eq!(id.file_name(), "index.ts.tera");
        assert_eq!(id.parent().unwrap().as_str(), "base/src");
        assert_eq!(id.segments().count(), 3);
    }

    #[test]
    fn template_id_rejects_escapes() {
        for bad in ["", "/etc/passwd", "base/../secret", "base//x", "a\\b", "./a"] {
            assert!(TemplateId::new(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn starts_with_respects_segment_boundaries() {
        let docker = TemplateId::new("base/docker").unwrap();
        assert!(TemplateId::new("base/docker/Dockerfile").unwrap().starts_with(&docker));
        assert!(docker.starts_with(&docker));
        assert!(!TemplateId::new("base/dockerfile").unwrap().starts_with(&docker));
    }

    #[test]
    fn join_validates() {
        let base = TemplateId::new("base").unwrap();
        assert_eq!(base.join("src/app.ts").unwrap().as_str(), "base/src/app.ts");
        assert!(base.join("../x").is_err());
    }

    // ── File names ────────────────────────────────────────────────────────────

    #[test]
    fn plain_template_strips_suffix() {
        let n = TemplateFileName::parse("package.json.tera");
        assert_eq!(n.output_name(), "package.json");
        assert!(n.is_rendered());
        assert!(n.variant().is_none());
    }

    #[test]
    fn non_template_is_copied_verbatim() {
        let n = TemplateFileName::parse("logo.png");
        assert_eq!(n.output_name(), "logo.png");
        assert!(!n.is_rendered());
    }

    #[test]
    fn bare_suffix_is_not_a_template() {
        let n = TemplateFileName::parse(".tera");
        assert_eq!(n.output_name(), ".tera");
        assert!(!n.is_rendered());
    }

    #[test]
    fn variant_tag_is_removed_from_output() {
        let n = TemplateFileName::parse("database.db-postgresql.ts.tera");
        assert_eq!(n.output_name(), "database.ts");
        assert_eq!(
            n.variant(),
            Some(&VariantTag {
                axis: VariantAxis::Database,
                value: "postgresql".into()
            })
        );
    }

    #[test]
    fn dotfile_with_variant() {
        let n = TemplateFileName::parse(".env.db-sqlite.tera");
        assert_eq!(n.output_name(), ".env");
        assert_eq!(n.variant().unwrap().to_string(), "db-sqlite");
    }

    #[test]
    fn unknown_axis_is_not_a_tag() {
        let n = TemplateFileName::parse("docker-compose.yml");
        assert!(n.variant().is_none());
        let n = TemplateFileName::parse("app.env-local.ts");
        assert!(n.variant().is_none());
        assert_eq!(n.output_name(), "app.env-local.ts");
    }

    #[test]
    fn selection_follows_config() {
        let pg = config(Database::Postgresql);
        let my = config(Database::Mysql);
        let n = TemplateFileName::parse("database.db-postgresql.ts.tera");
        assert!(n.is_selected_by(&pg));
        assert!(!n.is_selected_by(&my));

        let pm = TemplateFileName::parse(".npmrc.pm-pnpm");
        assert!(pm.is_selected_by(&pg));
        assert_eq!(pm.output_name(), ".npmrc");

        assert!(TemplateFileName::parse("index.ts.tera").is_selected_by(&my));
    }
}
