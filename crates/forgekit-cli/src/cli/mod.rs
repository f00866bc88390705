//! CLI argument definitions using the clap derive API.
//!
//! This module is the only place that knows about argument names, aliases,
//! help text, and value enums. No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "forgekit",
    bin_name = "forgekit",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} TypeScript server project generator",
    long_about = "forgekit generates Express + TypeScript API servers wired to \
                  Prisma, Drizzle or TypeORM, with optional Docker and test setup.",
    after_help = "EXAMPLES:\n\
        \x20 forgekit new orders-api\n\
        \x20 forgekit new orders-api --orm drizzle --database sqlite --pm pnpm\n\
        \x20 forgekit new ../svc --orm typeorm --docker --testing --skip-install\n\
        \x20 forgekit completions bash > ~/.local/share/bash-completion/completions/forgekit",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a new project.
    #[command(
        visible_alias = "n",
        about = "Generate a new project",
        after_help = "EXAMPLES:\n\
            \x20 forgekit new orders-api\n\
            \x20 forgekit new orders-api --orm drizzle --database mysql\n\
            \x20 forgekit new orders-api --docker --testing --build\n\
            \x20 forgekit new orders-api --dry-run"
    )]
    New(NewArgs),

    /// List supported ORMs, databases and package managers.
    #[command(
        visible_alias = "ls",
        about = "List supported stacks",
        after_help = "EXAMPLES:\n\
            \x20 forgekit list\n\
            \x20 forgekit list --format json"
    )]
    List(ListArgs),

    /// Inspect or prune the render cache.
    #[command(
        about = "Render cache management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 forgekit cache stats\n\
            \x20 forgekit cache cleanup --max-age-days 7\n\
            \x20 forgekit cache clear"
    )]
    Cache(CacheCommands),

    /// Write a default configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 forgekit init           # user config directory\n\
            \x20 forgekit init --local   # ./forgekit.toml\n\
            \x20 forgekit init --force   # overwrite"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 forgekit completions bash > ~/.local/share/bash-completion/completions/forgekit\n\
            \x20 forgekit completions zsh  > ~/.zfunc/_forgekit\n\
            \x20 forgekit completions fish > ~/.config/fish/completions/forgekit.fish"
    )]
    Completions(CompletionsArgs),

    /// Read the effective configuration.
    #[command(
        about = "Configuration inspection",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 forgekit config get defaults.orm\n\
            \x20 forgekit config list\n\
            \x20 forgekit config path"
    )]
    Config(ConfigCommands),
}

// ── new ───────────────────────────────────────────────────────────────────────

/// Arguments for `forgekit new`.
#[derive(Debug, Default, Args)]
pub struct NewArgs {
    /// Project name or path. A plain name creates `./name`; a path like
    /// `../foo` places the project one level up. The last component is the
    /// package name.
    #[arg(value_name = "NAME", help = "Project name or path")]
    pub name: String,

    #[arg(long = "orm", value_enum, help = "ORM [default: from config, else prisma]")]
    pub orm: Option<OrmArg>,

    #[arg(
        long = "database",
        visible_alias = "db",
        value_enum,
        help = "Database [default: the ORM's default]"
    )]
    pub database: Option<DatabaseArg>,

    #[arg(
        long = "pm",
        visible_alias = "package-manager",
        value_enum,
        help = "Package manager [default: from config, else npm]"
    )]
    pub package_manager: Option<PackageManagerArg>,

    #[arg(long = "docker", overrides_with = "no_docker", help = "Add Dockerfile and compose file")]
    pub docker: bool,

    #[arg(long = "no-docker", overrides_with = "docker", help = "Leave Docker files out")]
    pub no_docker: bool,

    #[arg(long = "testing", overrides_with = "no_testing", help = "Add vitest + supertest setup")]
    pub testing: bool,

    #[arg(long = "no-testing", overrides_with = "testing", help = "Leave test setup out")]
    pub no_testing: bool,

    /// Template directory to use instead of the built-in templates.
    #[arg(long = "templates", value_name = "DIR", help = "Template directory")]
    pub templates: Option<PathBuf>,

    #[arg(long = "no-cache", help = "Render without the render cache")]
    pub no_cache: bool,

    /// Generate into an existing non-empty directory. Existing files that a
    /// template also produces are overwritten.
    #[arg(long = "force", help = "Generate into a non-empty directory")]
    pub force: bool,

    #[arg(long = "dry-run", help = "Show the generation plan without writing")]
    pub dry_run: bool,

    #[arg(long = "skip-install", help = "Do not run the package manager afterwards")]
    pub skip_install: bool,

    #[arg(
        long = "build",
        conflicts_with = "skip_install",
        help = "Run the build script after installing"
    )]
    pub build: bool,

    #[arg(short = 'y', long = "yes", help = "Skip the confirmation prompt")]
    pub yes: bool,
}

impl NewArgs {
    /// `--docker` / `--no-docker`, or `None` to use the configured default.
    pub fn docker_flag(&self) -> Option<bool> {
        flag_pair(self.docker, self.no_docker)
    }

    /// `--testing` / `--no-testing`, or `None` to use the configured default.
    pub fn testing_flag(&self) -> Option<bool> {
        flag_pair(self.testing, self.no_testing)
    }
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `forgekit list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// JSON document.
    Json,
}

// ── cache ─────────────────────────────────────────────────────────────────────

/// Subcommands for `forgekit cache`.
#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Show entry counts, size and hit rate.
    Stats,
    /// Delete every cached render.
    Clear,
    /// Delete cached renders older than the age limit.
    Cleanup {
        /// Age limit in days [default: cache.max_age_days].
        #[arg(long = "max-age-days", value_name = "DAYS")]
        max_age_days: Option<u64>,
    },
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `forgekit init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write `forgekit.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `forgekit completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `forgekit config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `defaults.orm`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the configuration file.
    Path,
}

// ── value enums ───────────────────────────────────────────────────────────────

/// ORM choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OrmArg {
    Prisma,
    Drizzle,
    #[value(alias = "type-orm")]
    TypeOrm,
}

impl std::fmt::Display for OrmArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prisma => write!(f, "prisma"),
            Self::Drizzle => write!(f, "drizzle"),
            Self::TypeOrm => write!(f, "typeorm"),
        }
    }
}

/// Database choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum DatabaseArg {
    #[value(alias = "postgres", alias = "pg")]
    Postgresql,
    Mysql,
    Sqlite,
    #[value(alias = "mongo")]
    Mongodb,
}

impl std::fmt::Display for DatabaseArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgresql => write!(f, "postgresql"),
            Self::Mysql => write!(f, "mysql"),
            Self::Sqlite => write!(f, "sqlite"),
            Self::Mongodb => write!(f, "mongodb"),
        }
    }
}

/// Package manager choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum PackageManagerArg {
    Npm,
    Pnpm,
    Yarn,
}

impl std::fmt::Display for PackageManagerArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Npm => write!(f, "npm"),
            Self::Pnpm => write!(f, "pnpm"),
            Self::Yarn => write!(f, "yarn"),
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
