//! The `ProjectConfig` record and its typestate builder.
//!
//! A `ProjectConfig` is the fully-validated description of the project the
//! user wants to generate. It is created once per generation request and
//! never mutated; every field is checked at `build()` time so an invalid
//! record cannot reach the assembler.
//!
//! # Typestate builder
//!
//! The builder uses two marker types (`NoName` / `HasName`) to enforce at
//! *compile time* that a project name is supplied before `build()` is
//! callable. Runtime validation still runs inside `build()` for the name
//! pattern and the ORM/database pairing.
//!
//! # Domain purity
//!
//! This module must not import `tracing`.

use std::fmt;

use serde::Serialize;

use crate::domain::{
    capabilities,
    digest::sha256_hex,
    error::DomainError,
    validation::DomainValidator,
    value_objects::{Database, Orm, PackageManager},
};

// ── Record ────────────────────────────────────────────────────────────────────

/// A fully-validated generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectConfig {
    project_name: String,
    orm: Orm,
    database: Database,
    package_manager: PackageManager,
    docker: bool,
    testing: bool,
}

impl ProjectConfig {
    /// Start building a new `ProjectConfig`.
    pub fn builder() -> ProjectConfigBuilder<NoName> {
        ProjectConfigBuilder::new()
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }
    pub const fn orm(&self) -> Orm {
        self.orm
    }
    pub const fn database(&self) -> Database {
        self.database
    }
    pub const fn package_manager(&self) -> PackageManager {
        self.package_manager
    }
    pub const fn docker(&self) -> bool {
        self.docker
    }
    pub const fn testing(&self) -> bool {
        self.testing
    }

    /// Re-check every field.
    ///
    /// Called by the builder and again by the generator before any
    /// filesystem effect.
    pub fn validate(&self) -> Result<(), DomainError> {
        DomainValidator::validate_project_name(&self.project_name)?;

        if let Err(reason) = capabilities::validate_orm_database(self.orm, self.database) {
            return Err(DomainError::IncompatibleSelection {
                orm: self.orm.to_string(),
                database: self.database.to_string(),
                reason,
            });
        }

        Ok(())
    }

    /// Stable `key=value` listing of every field, one per line, in fixed
    /// order. This is the input to [`Self::config_hash`].
    pub fn canonical(&self) -> String {
        format!(
            "project_name={}\norm={}\ndatabase={}\npackage_manager={}\ndocker={}\ntesting={}\n",
            self.project_name,
            self.orm,
            self.database,
            self.package_manager,
            self.docker,
            self.testing,
        )
    }

    /// SHA-256 hex of the canonical form.
    pub fn config_hash(&self) -> String {
        sha256_hex(self.canonical())
    }
}

impl fmt::Display for ProjectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} + {}, {})",
            self.project_name, self.orm, self.database, self.package_manager
        )?;
        if self.docker {
            f.write_str(" +docker")?;
        }
        if self.testing {
            f.write_str(" +testing")?;
        }
        Ok(())
    }
}

// ── Typestate markers ─────────────────────────────────────────────────────────

/// Marker: the project name has not yet been set.
pub struct NoName;
/// Marker: the project name has been set.
pub struct HasName(String);

// ── Builder ───────────────────────────────────────────────────────────────────

/// Typestate builder for [`ProjectConfig`].
///
/// Unset selections fall back to the enum defaults (`prisma`, `postgresql`,
/// `npm`); unset toggles are `false`. When only the ORM is chosen, the
/// database falls back to that ORM's registered default.
pub struct ProjectConfigBuilder<N> {
    name: N,
    orm: Option<Orm>,
    database: Option<Database>,
    package_manager: Option<PackageManager>,
    docker: bool,
    testing: bool,
}

impl ProjectConfigBuilder<NoName> {
    pub fn new() -> Self {
        Self {
            name: NoName,
            orm: None,
            database: None,
            package_manager: None,
            docker: false,
            testing: false,
        }
    }

    /// Set the project name. This transitions the builder to `HasName`.
    pub fn name(self, name: impl Into<String>) -> ProjectConfigBuilder<HasName> {
        ProjectConfigBuilder {
            name: HasName(name.into()),
            orm: self.orm,
            database: self.database,
            package_manager: self.package_manager,
            docker: self.docker,
            testing: self.testing,
        }
    }

    /// Always fails: a project name is required.
    ///
    /// Exists so that callers assembling a config from optional input get a
    /// domain error instead of a type error when the name is missing.
    pub fn build(self) -> Result<ProjectConfig, DomainError> {
        Err(DomainError::MissingRequiredField {
            field: "project_name",
        })
    }
}

impl Default for ProjectConfigBuilder<NoName> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> ProjectConfigBuilder<N> {
    pub fn orm(mut self, orm: Orm) -> Self {
        self.orm = Some(orm);
        self
    }

    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn package_manager(mut self, package_manager: PackageManager) -> Self {
        self.package_manager = Some(package_manager);
        self
    }

    pub fn docker(mut self, enabled: bool) -> Self {
        self.docker = enabled;
        self
    }

    pub fn testing(mut self, enabled: bool) -> Self {
        self.testing = enabled;
        self
    }
}

impl ProjectConfigBuilder<HasName> {
    /// Build and validate the `ProjectConfig`.
    pub fn build(self) -> Result<ProjectConfig, DomainError> {
        let orm = self.orm.unwrap_or_default();
        let database = self
            .database
            .unwrap_or_else(|| capabilities::default_database(orm));

        let config = ProjectConfig {
            project_name: self.name.0,
            orm,
            database,
            package_manager: self.package_manager.unwrap_or_default(),
            docker: self.docker,
            testing: self.testing,
        };

        config.validate()?;
        Ok(config)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
