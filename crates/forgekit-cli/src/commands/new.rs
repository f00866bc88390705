//! Implementation of the `forgekit new` command.
//!
//! Responsibility: turn CLI arguments and configured defaults into a
//! `ProjectConfig`, wire the adapters into a `ProjectGenerator`, and run the
//! package manager afterwards. Generation itself lives in `forgekit-core`.

use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use forgekit_adapters::{LocalFilesystem, SystemCommandRunner, TeraEngine, resolve_source};
use forgekit_core::{
    application::{
        CommandRunner, ContentCache, Filesystem, GenerationReport, PlannedStep, ProjectGenerator,
        StepStatus,
    },
    domain::{Database, Orm, PackageManager, ProjectConfig, capabilities},
};

use crate::{
    cli::{DatabaseArg, NewArgs, OrmArg, PackageManagerArg},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Execute the `forgekit new` command.
///
/// 1. Resolve the project path and name
/// 2. Merge flags over configured defaults into a validated `ProjectConfig`
/// 3. Pick the template source and the render cache
/// 4. Dry run: print the plan and stop
/// 5. Confirm unless `--yes`, quiet, or stdin is not a terminal
/// 6. Generate
/// 7. Install dependencies unless `--skip-install`
#[instrument(skip_all, fields(project = %args.name))]
pub fn execute(args: NewArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    // 1. Resolve project path
    let (project_name, project_path) = resolve_project_path(&args.name)?;

    // 2. Build configuration
    let project = build_project_config(&args, &config, &project_name)?;
    debug!(config = %project, hash = %project.config_hash(), "Configuration resolved");

    // 3. Wire adapters
    let templates_dir = args.templates.as_deref().or(config.templates.local_path.as_deref());
    let (source, origin) = resolve_source(templates_dir)?;
    let fs: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());

    let cache = if args.no_cache || !config.cache.enabled {
        debug!("Render cache disabled");
        None
    } else {
        Some(Arc::new(ContentCache::new(
            Arc::clone(&source),
            Arc::clone(&fs),
            config.cache_dir(),
        )))
    };

    let generator = ProjectGenerator::new(source, fs, Arc::new(TeraEngine::new()), cache)
        .with_overwrite(args.force);

    // 4. Dry run
    if args.dry_run {
        let plan = generator.plan(&project_path, &project);
        return show_plan(&plan, &project, &project_path, &output);
    }

    // 5. Confirm
    if !args.yes && !output.is_quiet() && std::io::stdin().is_terminal() {
        show_configuration(&project, &project_path, &origin.to_string(), &output)?;
        if !confirm()? {
            return Err(CliError::Cancelled);
        }
    }

    // 6. Generate
    output.header(&format!("Creating '{project_name}'..."))?;
    info!(path = %project_path.display(), templates = %origin, "Generation started");

    let report = generator.generate(&project_path, &project)?;
    info!(files = report.files_written, "Generation completed");

    // 7. Post-generation
    if !args.skip_install {
        let runner = SystemCommandRunner::new();
        post_generate(&runner, &project, &report.project_root, args.build, &output)?;
    }

    if output.is_json() {
        output.json(&report)?;
        return Ok(());
    }

    show_report(&report, &output)?;
    output.success(&format!("Project '{project_name}' created!"))?;
    show_next_steps(&project, &project_path, args.skip_install, &output)?;

    Ok(())
}

// ── Path resolution ───────────────────────────────────────────────────────────

/// Split `NAME` into the package name (last component) and the project path.
pub fn resolve_project_path(name: &str) -> CliResult<(String, PathBuf)> {
    let path = Path::new(name);

    let project_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::InvalidProjectName {
            name: name.into(),
            reason: "cannot extract a project name from the path".into(),
        })?
        .to_string();

    Ok((project_name, path.to_path_buf()))
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Flags win over `[defaults]`; the database falls back to the ORM's default.
fn build_project_config(
    args: &NewArgs,
    config: &AppConfig,
    project_name: &str,
) -> CliResult<ProjectConfig> {
    let defaults = &config.defaults;

    let orm = match args.orm {
        Some(arg) => convert_orm(arg),
        None => defaults.orm.parse::<Orm>()?,
    };

    let database = match (args.database, &defaults.database) {
        (Some(arg), _) => convert_database(arg),
        (None, Some(configured)) => configured.parse::<Database>()?,
        (None, None) => capabilities::default_database(orm),
    };

    let package_manager = match args.package_manager {
        Some(arg) => convert_package_manager(arg),
        None => defaults.package_manager.parse::<PackageManager>()?,
    };

    let project = ProjectConfig::builder()
        .name(project_name)
        .orm(orm)
        .database(database)
        .package_manager(package_manager)
        .docker(args.docker_flag().unwrap_or(defaults.docker))
        .testing(args.testing_flag().unwrap_or(defaults.testing))
        .build()?;

    Ok(project)
}

fn convert_orm(arg: OrmArg) -> Orm {
    match arg {
        OrmArg::Prisma => Orm::Prisma,
        OrmArg::Drizzle => Orm::Drizzle,
        OrmArg::TypeOrm => Orm::TypeOrm,
    }
}

fn convert_database(arg: DatabaseArg) -> Database {
    match arg {
        DatabaseArg::Postgresql => Database::Postgresql,
        DatabaseArg::Mysql => Database::Mysql,
        DatabaseArg::Sqlite => Database::Sqlite,
        DatabaseArg::Mongodb => Database::Mongodb,
    }
}

fn convert_package_manager(arg: PackageManagerArg) -> PackageManager {
    match arg {
        PackageManagerArg::Npm => PackageManager::Npm,
        PackageManagerArg::Pnpm => PackageManager::Pnpm,
        PackageManagerArg::Yarn => PackageManager::Yarn,
    }
}

// ── Post-generation ───────────────────────────────────────────────────────────

/// Command lines run after a successful generation, in order.
fn post_generation_commands(project: &ProjectConfig, build: bool) -> Vec<String> {
    let pm = project.package_manager();
    let mut commands = vec![pm.install_cmd().to_string()];
    if project.orm().needs_client_generation() {
        commands.push(format!("{} prisma generate", pm.exec_cmd()));
    }
    if build {
        commands.push(format!("{} build", pm.run_cmd()));
    }
    commands
}

/// Install dependencies and run the follow-up commands in `root`.
///
/// Stops at the first failing command. The generated project is kept either
/// way.
fn post_generate(
    runner: &dyn CommandRunner,
    project: &ProjectConfig,
    root: &Path,
    build: bool,
    output: &OutputManager,
) -> CliResult<()> {
    for command in post_generation_commands(project, build) {
        let mut words = command.split_whitespace().map(str::to_string);
        let Some(program) = words.next() else {
            continue;
        };
        let args: Vec<String> = words.collect();

        let spinner = output.spinner(format!("Running {command}..."));
        let result = runner.run(&program, &args, root);
        spinner.finish_and_clear();

        let ran = result?;
        if !ran.success() {
            warn!(command = %command, status = ?ran.status, "Post-generation command failed");
            return Err(CliError::ExternalCommandFailed {
                command,
                status: ran.status,
                stderr: ran.stderr,
            });
        }
        output.success(&command)?;
    }
    Ok(())
}

// ── UI helpers ────────────────────────────────────────────────────────────────

fn show_configuration(
    project: &ProjectConfig,
    path: &Path,
    templates: &str,
    out: &OutputManager,
) -> CliResult<()> {
    out.header("Configuration")?;
    out.field("Project", project.project_name())?;
    out.field("ORM", project.orm().display_name())?;
    out.field("Database", project.database().display_name())?;
    out.field("Package manager", project.package_manager().as_str())?;
    out.field("Docker", yes_no(project.docker()))?;
    out.field("Testing", yes_no(project.testing()))?;
    out.field("Templates", templates)?;
    out.field("Location", &path.display().to_string())?;
    out.print("")?;
    Ok(())
}

fn show_plan(
    plan: &[PlannedStep],
    project: &ProjectConfig,
    path: &Path,
    out: &OutputManager,
) -> CliResult<()> {
    if out.is_json() {
        out.json(&serde_json::json!({
            "project": project.project_name(),
            "path": path,
            "config_hash": project.config_hash(),
            "steps": plan,
        }))?;
        return Ok(());
    }

    out.info(&format!(
        "Dry run: would create '{}' at {}",
        project.project_name(),
        path.display()
    ))?;
    for step in plan {
        let marker = if step.enabled { "+" } else { "-" };
        out.print(&format!(
            "  {marker} {:<15} {} -> {}",
            step.step.to_string(),
            step.sources.join(", "),
            step.target.display()
        ))?;
    }
    Ok(())
}

fn show_report(report: &GenerationReport, out: &OutputManager) -> CliResult<()> {
    for step in &report.steps {
        let line = format!(
            "{:<15} {} file(s), {} dir(s)",
            step.step.to_string(),
            step.files_written,
            step.dirs_created
        );
        match step.status {
            StepStatus::Completed => out.success(&line)?,
            StepStatus::Skipped => out.print(&format!("- {} skipped", step.step))?,
        }
    }
    debug!(
        variants_skipped = report.variants_skipped,
        manifest_merged = report.manifest_merged,
        "Report"
    );
    Ok(())
}

fn show_next_steps(
    project: &ProjectConfig,
    path: &Path,
    skipped_install: bool,
    out: &OutputManager,
) -> CliResult<()> {
    let pm = project.package_manager();
    out.print("")?;
    out.print("Next steps:")?;
    out.print(&format!("  cd {}", path.display()))?;
    if skipped_install {
        out.print(&format!("  {}", pm.install_cmd()))?;
        if project.orm().needs_client_generation() {
            out.print(&format!("  {} prisma generate", pm.exec_cmd()))?;
        }
    }
    out.print("  cp .env.example .env")?;
    out.print(&format!("  {} dev", pm.run_cmd()))?;
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn confirm() -> CliResult<bool> {
    use std::io::{self, Write};

    print!("Continue? [Y/n] ");
    io::stdout()
        .flush()
        .with_cli_context(|| "failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .with_cli_context(|| "failed to read confirmation input")?;

    let input = input.trim().to_ascii_lowercase();
    Ok(input.is_empty() || input == "y" || input == "yes")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{GlobalArgs, OutputFormat};
    use forgekit_core::application::CommandOutput;
    use forgekit_core::error::ForgeResult;
    use mockall::{Sequence, mock};

    mock! {
        Runner {}
        impl CommandRunner for Runner {
            fn run(&self, program: &str, args: &[String], cwd: &Path) -> ForgeResult<CommandOutput>;
        }
    }

    fn quiet_output() -> OutputManager {
        let args = GlobalArgs {
            quiet: true,
            no_color: true,
            output_format: OutputFormat::Plain,
            ..GlobalArgs::default()
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    fn exited(code: i32) -> ForgeResult<CommandOutput> {
        Ok(CommandOutput {
            status: Some(code),
            stdout: String::new(),
            stderr: if code == 0 { String::new() } else { "boom".into() },
        })
    }

    fn project(orm: Orm, pm: PackageManager) -> ProjectConfig {
        ProjectConfig::builder()
            .name("orders-api")
            .orm(orm)
            .package_manager(pm)
            .build()
            .unwrap()
    }

    fn new_args(name: &str) -> NewArgs {
        NewArgs {
            name: name.into(),
            ..NewArgs::default()
        }
    }

    // ── resolve_project_path ──────────────────────────────────────────────

    #[test]
    fn simple_name_resolves_to_cwd() {
        let (name, dir) = resolve_project_path("orders-api").unwrap();
        assert_eq!(name, "orders-api");
        assert_eq!(dir, PathBuf::from("orders-api"));
    }

    #[test]
    fn nested_path_keeps_full_path() {
        let sep = std::path::MAIN_SEPARATOR;
        let path = format!("..{sep}services{sep}orders-api");

        let (name, dir) = resolve_project_path(&path).unwrap();
        assert_eq!(name, "orders-api");
        assert_eq!(dir, PathBuf::from("..").join("services").join("orders-api"));
    }

    #[test]
    fn parent_dir_has_no_name() {
        assert!(matches!(
            resolve_project_path(".."),
            Err(CliError::InvalidProjectName { .. })
        ));
    }

    // ── build_project_config ──────────────────────────────────────────────

    #[test]
    fn defaults_apply_without_flags() {
        let project = build_project_config(&new_args("x"), &AppConfig::default(), "svc").unwrap();
        assert_eq!(project.orm(), Orm::Prisma);
        assert_eq!(project.database(), Database::Postgresql);
        assert_eq!(project.package_manager(), PackageManager::Npm);
        assert!(!project.docker());
    }

    #[test]
    fn flags_beat_configured_defaults() {
        let mut config = AppConfig::default();
        config.defaults.orm = "typeorm".into();
        config.defaults.docker = true;

        let args = NewArgs {
            orm: Some(OrmArg::Drizzle),
            database: Some(DatabaseArg::Sqlite),
            package_manager: Some(PackageManagerArg::Pnpm),
            no_docker: true,
            ..new_args("x")
        };
        let project = build_project_config(&args, &config, "svc").unwrap();
        assert_eq!(project.orm(), Orm::Drizzle);
        assert_eq!(project.database(), Database::Sqlite);
        assert_eq!(project.package_manager(), PackageManager::Pnpm);
        assert!(!project.docker());
    }

    #[test]
    fn configured_database_is_used() {
        let mut config = AppConfig::default();
        config.defaults.database = Some("mongodb".into());
        let project = build_project_config(&new_args("x"), &config, "svc").unwrap();
        assert_eq!(project.database(), Database::Mongodb);
    }

    #[test]
    fn bad_configured_orm_is_a_user_error() {
        let mut config = AppConfig::default();
        config.defaults.orm = "sequelize".into();
        let err = build_project_config(&new_args("x"), &config, "svc").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn incompatible_selection_is_rejected() {
        let args = NewArgs {
            orm: Some(OrmArg::Drizzle),
            database: Some(DatabaseArg::Mongodb),
            ..new_args("x")
        };
        let err = build_project_config(&args, &AppConfig::default(), "svc").unwrap_err();
        assert!(err.to_string().contains("drizzle"));
        assert_eq!(err.exit_code(), 2);
    }

    // ── post-generation ───────────────────────────────────────────────────

    #[test]
    fn command_lines_per_package_manager() {
        assert_eq!(
            post_generation_commands(&project(Orm::Prisma, PackageManager::Npm), true),
            ["npm install", "npx prisma generate", "npm run build"]
        );
        assert_eq!(
            post_generation_commands(&project(Orm::Prisma, PackageManager::Pnpm), false),
            ["pnpm install", "pnpm exec prisma generate"]
        );
        assert_eq!(
            post_generation_commands(&project(Orm::Drizzle, PackageManager::Yarn), true),
            ["yarn install", "yarn build"]
        );
    }

    #[test]
    fn runs_install_then_client_generation_in_project_root() {
        let mut runner = MockRunner::new();
        let mut seq = Sequence::new();
        runner
            .expect_run()
            .withf(|program, args, cwd| {
                program == "npm" && args.join(" ") == "install" && cwd == Path::new("/work/app")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| exited(0));
        runner
            .expect_run()
            .withf(|program, args, _| program == "npx" && args.join(" ") == "prisma generate")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| exited(0));

        post_generate(
            &runner,
            &project(Orm::Prisma, PackageManager::Npm),
            Path::new("/work/app"),
            false,
            &quiet_output(),
        )
        .unwrap();
    }

    #[test]
    fn non_zero_exit_stops_and_reports() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|program, _, _| program == "pnpm")
            .times(1)
            .returning(|_, _, _| exited(1));

        let err = post_generate(
            &runner,
            &project(Orm::Drizzle, PackageManager::Pnpm),
            Path::new("/work/app"),
            true,
            &quiet_output(),
        )
        .unwrap_err();

        let CliError::ExternalCommandFailed { command, status, stderr } = err else {
            panic!("expected ExternalCommandFailed");
        };
        assert_eq!(command, "pnpm install");
        assert_eq!(status, Some(1));
        assert_eq!(stderr, "boom");
    }

    #[test]
    fn build_runs_last() {
        let mut runner = MockRunner::new();
        let mut seq = Sequence::new();
        runner
            .expect_run()
            .withf(|_, args, _| args.join(" ") == "install")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| exited(0));
        runner
            .expect_run()
            .withf(|program, args, _| program == "yarn" && args.join(" ") == "build")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| exited(0));

        post_generate(
            &runner,
            &project(Orm::TypeOrm, PackageManager::Yarn),
            Path::new("."),
            true,
            &quiet_output(),
        )
        .unwrap();
    }
}
