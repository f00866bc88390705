//! `forgekit cache`: inspect and prune the render cache.

use std::sync::Arc;

use tracing::info;

use forgekit_adapters::{LocalFilesystem, MemoryTemplateSource};
use forgekit_core::application::{CacheStats, ContentCache};

use crate::{
    cli::CacheCommands,
    config::{AppConfig, days},
    error::CliResult,
    output::OutputManager,
};

pub fn execute(cmd: CacheCommands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let cache = open_cache(&config);

    match cmd {
        CacheCommands::Stats => {
            let stats = cache.stats();
            if output.is_json() {
                output.json(&serde_json::json!({
                    "dir": cache.dir(),
                    "stats": stats,
                }))?;
            } else {
                show_stats(&stats, &cache, &output)?;
            }
        }

        CacheCommands::Clear => {
            let removed = cache.clear()?;
            info!(removed, "Cache cleared");
            report(&output, removed, "Removed")?;
        }

        CacheCommands::Cleanup { max_age_days } => {
            let max_age = max_age_days.map_or_else(|| config.cache.max_age(), days);
            let removed = cache.cleanup(max_age);
            info!(removed, max_age_secs = max_age.as_secs(), "Cache cleaned up");
            report(&output, removed, "Removed stale")?;
        }
    }

    Ok(())
}

/// Maintenance needs only the disk tier, so no template source is consulted.
fn open_cache(config: &AppConfig) -> ContentCache {
    ContentCache::new(
        Arc::new(MemoryTemplateSource::new()),
        Arc::new(LocalFilesystem::new()),
        config.cache_dir(),
    )
}

fn report(output: &OutputManager, count: usize, verb: &str) -> CliResult<()> {
    if output.is_json() {
        output.json(&serde_json::json!({ "removed": count }))?;
    } else {
        output.success(&format!("{verb} {count} cache entr{}", plural(count)))?;
    }
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "y" } else { "ies" }
}

fn show_stats(stats: &CacheStats, cache: &ContentCache, output: &OutputManager) -> CliResult<()> {
    output.header("Render cache")?;
    output.field("Location", &cache.dir().display().to_string())?;
    output.field("Entries", &stats.disk_entries.to_string())?;
    output.field("Size", &format_bytes(stats.total_bytes))?;
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn entry_plural() {
        assert_eq!(format!("1 cache entr{}", plural(1)), "1 cache entry");
        assert_eq!(format!("3 cache entr{}", plural(3)), "3 cache entries");
    }

    #[test]
    fn empty_cache_dir_reports_zero() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.cache.dir = Some(tmp.path().join("renders"));

        let cache = open_cache(&config);
        assert_eq!(cache.stats().disk_entries, 0);
        assert_eq!(cache.clear().unwrap(), 0);
        assert_eq!(cache.cleanup(days(1)), 0);
    }
}
