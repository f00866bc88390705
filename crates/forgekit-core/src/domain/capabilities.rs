//! ORM capability registry.
//!
//! Each ORM is described exactly once by its [`OrmDef`]. Compatibility checks
//! and the `list` command both read from [`ORM_REGISTRY`]; no `match` arms on
//! ORM/database pairs live anywhere else.
//!
//! # Adding a New ORM
//!
//! 1. Add a variant to `Orm` in `value_objects.rs`
//! 2. Add one [`OrmDef`] entry to [`ORM_REGISTRY`]
//! 3. Add `templates/orm/<name>/` and `templates/manifests/<name>.package.json.tera`

use crate::domain::value_objects::{Database, Orm};

// ── ORM definitions ──────────────────────────────────────────────────────────

/// Describes what one ORM can target.
#[derive(Debug, Clone, Copy)]
pub struct OrmDef {
    /// The ORM this definition describes.
    pub orm: Orm,

    /// Databases the ORM has a driver for.
    pub supported_databases: &'static [Database],

    /// The database chosen when the user names only the ORM.
    /// This MUST be a member of `supported_databases`.
    pub default_database: Database,

    /// One-line description shown by `forgekit list`.
    pub summary: &'static str,
}

/// Single source of truth for ORM capabilities.
pub static ORM_REGISTRY: &[OrmDef] = &[
    OrmDef {
        orm: Orm::Prisma,
        supported_databases: &[
            Database::Postgresql,
            Database::Mysql,
            Database::Sqlite,
            Database::Mongodb,
        ],
        default_database: Database::Postgresql,
        summary: "Schema-first ORM with a generated type-safe client",
    },
    OrmDef {
        orm: Orm::Drizzle,
        // drizzle-orm ships SQL dialects only.
        supported_databases: &[Database::Postgresql, Database::Mysql, Database::Sqlite],
        default_database: Database::Postgresql,
        summary: "Lightweight SQL-like query builder with TypeScript schemas",
    },
    OrmDef {
        orm: Orm::TypeOrm,
        supported_databases: &[
            Database::Postgresql,
            Database::Mysql,
            Database::Sqlite,
            Database::Mongodb,
        ],
        default_database: Database::Postgresql,
        summary: "Decorator-based entity ORM",
    },
];

// ── Registry lookup API ──────────────────────────────────────────────────────

/// Find the capability definition for a specific ORM.
///
/// Returns `None` only if the ORM is not registered, which is a programming
/// error. The `every_orm_is_registered` test catches it.
pub fn find_orm(orm: Orm) -> Option<&'static OrmDef> {
    ORM_REGISTRY.iter().find(|def| def.orm == orm)
}

/// Check whether an ORM supports a database.
pub fn orm_supports_database(orm: Orm, database: Database) -> bool {
    find_orm(orm)
        .map(|def| def.supported_databases.contains(&database))
        .unwrap_or(false)
}

/// Databases supported by an ORM, in registry order.
pub fn supported_databases(orm: Orm) -> &'static [Database] {
    find_orm(orm).map(|def| def.supported_databases).unwrap_or(&[])
}

/// The database to use when only the ORM was chosen.
pub fn default_database(orm: Orm) -> Database {
    find_orm(orm)
        .map(|def| def.default_database)
        .unwrap_or_default()
}

/// Validate an ORM/database pair, returning a human-readable reason on
/// failure.
pub fn validate_orm_database(orm: Orm, database: Database) -> Result<(), String> {
    if orm_supports_database(orm, database) {
        return Ok(());
    }
    let supported: Vec<&str> = supported_databases(orm)
        .iter()
        .map(Database::as_str)
        .collect();
    Err(format!(
        "{} supports {}",
        orm.display_name(),
        supported.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_orm_is_registered() {
        for orm in Orm::ALL {
            assert!(find_orm(orm).is_some(), "{orm} missing from registry");
        }
    }

    #[test]
    fn default_database_is_supported() {
        for def in ORM_REGISTRY {
            assert!(
                def.supported_databases.contains(&def.default_database),
                "{} default database is not in its supported list",
                def.orm
            );
        }
    }

    #[test]
    fn drizzle_rejects_mongodb() {
        let reason = validate_orm_database(Orm::Drizzle, Database::Mongodb).unwrap_err();
        assert!(reason.contains("postgresql"));
        assert!(!reason.contains("mongodb"));
    }

    #[test]
    fn prisma_accepts_every_database() {
        for db in Database::ALL {
            assert!(orm_supports_database(Orm::Prisma, db));
        }
    }
}
