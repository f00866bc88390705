//! Domain value objects: Orm, Database, PackageManager.
//!
//! # Design
//!
//! These are pure value types. They are `Copy`, compare by value and carry
//! no identity. ORM/database compatibility lives in `capabilities.rs`; this
//! file only defines the types, their string forms and their parsers.
//!
//! # Adding New Variants
//!
//! 1. Add the enum variant and its `ALL` entry here
//! 2. Add the `as_str` arm and the `FromStr` arm here
//! 3. Add a capability entry in `capabilities.rs` (ORMs only)

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Orm ──────────────────────────────────────────────────────────────────────

/// The ORM the generated project is wired against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orm {
    #[default]
    Prisma,
    Drizzle,
    TypeOrm,
}

impl Orm {
    pub const ALL: [Orm; 3] = [Self::Prisma, Self::Drizzle, Self::TypeOrm];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prisma => "prisma",
            Self::Drizzle => "drizzle",
            Self::TypeOrm => "typeorm",
        }
    }

    /// Human-facing product name.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Prisma => "Prisma",
            Self::Drizzle => "Drizzle",
            Self::TypeOrm => "TypeORM",
        }
    }

    /// Whether the ORM needs a client-generation step after install.
    pub const fn needs_client_generation(&self) -> bool {
        matches!(self, Self::Prisma)
    }
}

impl fmt::Display for Orm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orm {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prisma" => Ok(Self::Prisma),
            "drizzle" | "drizzle-orm" => Ok(Self::Drizzle),
            "typeorm" | "type-orm" => Ok(Self::TypeOrm),
            other => Err(DomainError::UnknownOrm {
                value: other.to_string(),
            }),
        }
    }
}

// ── Database ─────────────────────────────────────────────────────────────────

/// The database engine the generated project targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Postgresql,
    Mysql,
    Sqlite,
    Mongodb,
}

impl Database {
    pub const ALL: [Database; 4] = [Self::Postgresql, Self::Mysql, Self::Sqlite, Self::Mongodb];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Mongodb => "mongodb",
        }
    }

    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Postgresql => "PostgreSQL",
            Self::Mysql => "MySQL",
            Self::Sqlite => "SQLite",
            Self::Mongodb => "MongoDB",
        }
    }

    /// Relational engines. Templates branch on this for migrations.
    pub const fn is_sql(&self) -> bool {
        !matches!(self, Self::Mongodb)
    }

    /// Whether the engine runs as a separate service (and so gets a
    /// container in the compose file).
    pub const fn is_server(&self) -> bool {
        !matches!(self, Self::Sqlite)
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Database {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Self::Postgresql),
            "mysql" => Ok(Self::Mysql),
            "sqlite" => Ok(Self::Sqlite),
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            other => Err(DomainError::UnknownDatabase {
                value: other.to_string(),
            }),
        }
    }
}

// ── PackageManager ───────────────────────────────────────────────────────────

/// The Node package manager used for install and script execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
}

impl PackageManager {
    pub const ALL: [PackageManager; 3] = [Self::Npm, Self::Pnpm, Self::Yarn];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
        }
    }

    /// Executable name.
    pub const fn program(&self) -> &'static str {
        self.as_str()
    }

    pub const fn install_cmd(&self) -> &'static str {
        match self {
            Self::Npm => "npm install",
            Self::Pnpm => "pnpm install",
            Self::Yarn => "yarn install",
        }
    }

    /// Prefix for running a `package.json` script.
    pub const fn run_cmd(&self) -> &'static str {
        match self {
            Self::Npm => "npm run",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
        }
    }

    /// Prefix for running a locally installed binary.
    pub const fn exec_cmd(&self) -> &'static str {
        match self {
            Self::Npm => "npx",
            Self::Pnpm => "pnpm exec",
            Self::Yarn => "yarn",
        }
    }

    pub const fn lockfile(&self) -> &'static str {
        match self {
            Self::Npm => "package-lock.json",
            Self::Pnpm => "pnpm-lock.yaml",
            Self::Yarn => "yarn.lock",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "npm" => Ok(Self::Npm),
            "pnpm" => Ok(Self::Pnpm),
            "yarn" => Ok(Self::Yarn),
            other => Err(DomainError::UnknownPackageManager {
                value: other.to_string(),
            }),
        }
    }
}
