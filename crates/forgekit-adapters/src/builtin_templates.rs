//! Built-in template tree and template-source resolution.
//!
//! The workspace `templates/` directory is compiled into the binary, so a
//! release build generates projects without any files on disk. A user tree
//! can replace it.
//!
//! # Template resolution order
//!
//! [`resolve_source`] picks the first of:
//!
//! 1. **An explicit directory**: `--templates DIR` or `templates.local_path`
//!    in the config file. It must exist.
//! 2. **`$FORGEKIT_TEMPLATES_DIR`**: environment override. Ignored with a
//!    warning when it does not point at a directory.
//! 3. **The embedded tree** ([`BUILTIN_FILES`]).
//!
//! # Environment variable
//!
//! ```env
//! FORGEKIT_TEMPLATES_DIR=./my-templates
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use forgekit_core::{
    application::{ApplicationError, ports::TemplateSource},
    error::ForgeResult,
};

use crate::template_source::{DirectoryTemplateSource, MemoryTemplateSource};

/// Environment variable naming a template directory.
pub const TEMPLATES_DIR_ENV: &str = "FORGEKIT_TEMPLATES_DIR";

macro_rules! embed {
    ($($path:literal),* $(,)?) => {
        &[$(
            (
                $path,
                include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../templates/", $path)),
            ),
        )*]
    };
}

/// Every built-in template as `(identity, content)`.
pub static BUILTIN_FILES: &[(&str, &str)] = embed![
    "base/.env.example.tera",
    "base/.gitignore",
    "base/docker/.dockerignore",
    "base/docker/Dockerfile.tera",
    "base/docker/docker-compose.yml.tera",
    "base/package.json.tera",
    "base/src/app.ts",
    "base/src/config/env.ts",
    "base/src/index.ts.tera",
    "base/src/routes/health.ts.tera",
    "base/tests/health.test.ts.tera",
    "base/tsconfig.json.tera",
    "ci/.github/workflows/ci.yml.tera",
    "docs/README.md.tera",
    "docs/docs/development.md.tera",
    "manifests/drizzle.package.json.tera",
    "manifests/prisma.package.json.tera",
    "manifests/typeorm.package.json.tera",
    "orm/drizzle/drizzle.config.ts.tera",
    "orm/drizzle/src/db/client.db-mysql.ts",
    "orm/drizzle/src/db/client.db-postgresql.ts",
    "orm/drizzle/src/db/client.db-sqlite.ts",
    "orm/drizzle/src/db/schema.db-mysql.ts",
    "orm/drizzle/src/db/schema.db-postgresql.ts",
    "orm/drizzle/src/db/schema.db-sqlite.ts",
    "orm/prisma/prisma/schema.prisma.tera",
    "orm/prisma/src/db/client.ts",
    "orm/typeorm/src/db/data-source.ts.tera",
    "orm/typeorm/src/entities/User.ts.tera",
];

/// Where templates were loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    Directory(PathBuf),
    Environment(PathBuf),
    Builtin,
}

impl std::fmt::Display for TemplateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(p) => write!(f, "{}", p.display()),
            Self::Environment(p) => write!(f, "{} (${TEMPLATES_DIR_ENV})", p.display()),
            Self::Builtin => f.write_str("built-in"),
        }
    }
}

/// Pick the template source using the resolution order in the module docs.
///
/// # Errors
///
/// `TemplateDirectoryNotFound` if `explicit` is given but is not a directory.
#[instrument]
pub fn resolve_source(
    explicit: Option<&Path>,
) -> ForgeResult<(Arc<dyn TemplateSource>, TemplateOrigin)> {
    let env_dir = std::env::var_os(TEMPLATES_DIR_ENV).map(PathBuf::from);
    resolve_with(explicit, env_dir.as_deref())
}

fn resolve_with(
    explicit: Option<&Path>,
    env_dir: Option<&Path>,
) -> ForgeResult<(Arc<dyn TemplateSource>, TemplateOrigin)> {
    if let Some(dir) = explicit {
        if !dir.is_dir() {
            return Err(ApplicationError::TemplateDirectoryNotFound {
                id: dir.display().to_string(),
            }
            .into());
        }
        info!(path = %dir.display(), "Using template directory");
        return Ok((
            Arc::new(DirectoryTemplateSource::new(dir)),
            TemplateOrigin::Directory(dir.to_path_buf()),
        ));
    }

    if let Some(dir) = env_dir {
        if dir.is_dir() {
            info!(path = %dir.display(), "Using template directory from ${TEMPLATES_DIR_ENV}");
            return Ok((
                Arc::new(DirectoryTemplateSource::new(dir)),
                TemplateOrigin::Environment(dir.to_path_buf()),
            ));
        }
        warn!(
            path = %dir.display(),
            "${TEMPLATES_DIR_ENV} is not a directory; using built-in templates"
        );
    }

    debug!(files = BUILTIN_FILES.len(), "Using built-in templates");
    Ok((
        Arc::new(MemoryTemplateSource::builtin()?),
        TemplateOrigin::Builtin,
    ))
}
