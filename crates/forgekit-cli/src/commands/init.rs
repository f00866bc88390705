//! `forgekit init`: write a default configuration file.

use std::path::{Path, PathBuf};

use crate::{
    cli::InitArgs,
    config::{AppConfig, LOCAL_CONFIG_FILE},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Write the effective configuration as TOML to the user config file, or to
/// `./forgekit.toml` with `--local`.
pub fn execute(args: InitArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let path = target_path(args.local)?;

    if !write_config(&config, &path, args.force)? {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display(),
        ))?;
        return Ok(());
    }

    output.success(&format!("Configuration created at {}", path.display()))?;
    Ok(())
}

fn target_path(local: bool) -> CliResult<PathBuf> {
    if local {
        return Ok(PathBuf::from(LOCAL_CONFIG_FILE));
    }
    AppConfig::config_path().ok_or_else(|| CliError::ConfigError {
        message: "no configuration directory on this platform; use --local".into(),
        source: None,
    })
}

/// Returns `false` when the file exists and `force` is off.
fn write_config(config: &AppConfig, path: &Path, force: bool) -> CliResult<bool> {
    if path.exists() && !force {
        return Ok(false);
    }

    let toml = config
        .to_toml()
        .with_cli_context(|| "Failed to serialise configuration")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_cli_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }

    std::fs::write(path, toml)
        .with_cli_context(|| format!("Failed to write config to '{}'", path.display()))?;

    Ok(true)
}
