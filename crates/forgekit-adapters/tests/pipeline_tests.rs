//! End-to-end generation over the real adapters: built-in templates, the
//! Tera engine, and the in-memory filesystem.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use forgekit_adapters::{
    DirectoryTemplateSource, FsOp, LocalFilesystem, MemoryFilesystem, MemoryTemplateSource,
    TeraEngine,
};
use forgekit_core::application::{
    ApplicationError, ContentCache, GenerationStep, ProjectGenerator, RollbackOutcome, StepStatus,
    TemplateRenderer,
    ports::{Filesystem, TemplateSource},
};
use forgekit_core::domain::{
    Database, Orm, PackageManager, ProjectConfig, RenderContext, TemplateEntry, TemplateId,
    sha256_hex,
};
use forgekit_core::error::{ForgeError, ForgeResult};
use serde_json::Value;

const CACHE_DIR: &str = "/cache";

struct Harness {
    fs: MemoryFilesystem,
    source: MemoryTemplateSource,
    cache: Arc<ContentCache>,
    generator: ProjectGenerator,
}

impl Harness {
    fn builtin() -> Self {
        Self::with_source(MemoryTemplateSource::builtin().unwrap())
    }

    fn with_source(source: MemoryTemplateSource) -> Self {
        let fs = MemoryFilesystem::new();
        let cache = Arc::new(ContentCache::new(
            Arc::new(source.clone()),
            Arc::new(fs.clone()),
            CACHE_DIR,
        ));
        let generator = ProjectGenerator::new(
            Arc::new(source.clone()),
            Arc::new(fs.clone()),
            Arc::new(TeraEngine),
            Some(Arc::clone(&cache)),
        );
        Self {
            fs,
            source,
            cache,
            generator,
        }
    }

    fn project_files(&self, root: &str) -> Vec<String> {
        self.fs
            .files_under(root)
            .into_iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn manifest(&self, root: &str) -> Value {
        let text = self
            .fs
            .file_string(Path::new(root).join("package.json"))
            .expect("package.json written");
        serde_json::from_str(&text).unwrap()
    }
}

fn config(name: &str) -> ProjectConfig {
    ProjectConfig::builder().name(name).build().unwrap()
}

// ── Merged manifest ──────────────────────────────────────────────────────

#[test]
fn prisma_project_gets_merged_manifest() {
    let h = Harness::builtin();
    let report = h
        .generator
        .generate(Path::new("/work/sample-api"), &config("sample-api"))
        .unwrap();

    assert!(report.manifest_merged);
    let manifest = h.manifest("/work/sample-api");

    // Base keys survive.
    assert_eq!(manifest["name"], "sample-api");
    assert_eq!(manifest["dependencies"]["express"], "^4.19.2");
    assert_eq!(manifest["scripts"]["dev"], "tsx watch src/index.ts");
    // Additions land inside the existing sections.
    assert_eq!(manifest["dependencies"]["@prisma/client"], "^5.14.0");
    assert_eq!(manifest["devDependencies"]["prisma"], "^5.14.0");
    assert_eq!(manifest["scripts"]["db:migrate"], "prisma migrate dev");

    // Base key order is kept, new top-level keys are appended.
    let keys: Vec<&str> = manifest
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys.first(), Some(&"name"));
    assert_eq!(keys.last(), Some(&"prisma"));

    let raw = h.fs.file_string("/work/sample-api/package.json").unwrap();
    assert!(raw.ends_with("}\n"));
}

#[test]
fn default_project_layout() {
    let h = Harness::builtin();
    h.generator
        .generate(Path::new("/work/sample-api"), &config("sample-api"))
        .unwrap();

    let files = h.project_files("/work/sample-api");
    for expected in [
        ".env.example",
        ".gitignore",
        ".github/workflows/ci.yml",
        "README.md",
        "docs/development.md",
        "package.json",
        "prisma/schema.prisma",
        "src/app.ts",
        "src/db/client.ts",
        "src/index.ts",
        "tsconfig.json",
    ] {
        assert!(files.iter().any(|f| f == expected), "{expected} missing: {files:?}");
    }

    // Gated subtrees stay out unless enabled; no template suffix leaks.
    assert!(!files.iter().any(|f| f.starts_with("docker") || f == "Dockerfile"));
    assert!(!files.iter().any(|f| f.starts_with("tests/")));
    assert!(!files.iter().any(|f| f.ends_with(".tera")));

    let readme = h.fs.file_string("/work/sample-api/README.md").unwrap();
    assert!(readme.contains("sample-api"));
}

#[test]
fn docker_and_testing_steps_follow_toggles() {
    let h = Harness::builtin();
    let config = ProjectConfig::builder()
        .name("svc")
        .package_manager(PackageManager::Pnpm)
        .docker(true)
        .testing(true)
        .build()
        .unwrap();

    let report = h.generator.generate(Path::new("/svc"), &config).unwrap();

    let files = h.project_files("/svc");
    assert!(files.iter().any(|f| f == "Dockerfile"));
    assert!(files.iter().any(|f| f == "docker-compose.yml"));
    assert!(files.iter().any(|f| f == "tests/health.test.ts"));

    let manifest = h.manifest("/svc");
    assert_eq!(manifest["scripts"]["test"], "vitest run");

    let statuses: Vec<_> = report.steps.iter().map(|s| (s.step, s.status)).collect();
    assert!(statuses.contains(&(GenerationStep::Docker, StepStatus::Completed)));
    assert!(statuses.contains(&(GenerationStep::Testing, StepStatus::Completed)));
}

// ── Variants ─────────────────────────────────────────────────────────────

#[test]
fn only_the_selected_database_variant_is_emitted() {
    let h = Harness::builtin();
    let config = ProjectConfig::builder()
        .name("lite")
        .orm(Orm::Drizzle)
        .database(Database::Sqlite)
        .build()
        .unwrap();

    let report = h.generator.generate(Path::new("/lite"), &config).unwrap();

    let db_files: Vec<String> = h
        .project_files("/lite")
        .into_iter()
        .filter(|f| f.starts_with("src/db/"))
        .collect();
    assert_eq!(db_files, ["src/db/client.ts", "src/db/schema.ts"]);

    let schema = h.fs.file_string("/lite/src/db/schema.ts").unwrap();
    assert!(schema.contains("sqliteTable"));
    assert!(!schema.contains("pgTable"));
    assert!(report.variants_skipped >= 4);

    let manifest = h.manifest("/lite");
    assert_eq!(manifest["dependencies"]["better-sqlite3"], "^9.6.0");
    assert!(manifest["dependencies"].get("pg").is_none());
}

// ── Failure and rollback ─────────────────────────────────────────────────

#[test]
fn orm_directory_vanishing_rolls_back_everything() {
    let source = MemoryTemplateSource::from_files([
        ("base/package.json.tera", r#"{ "name": "{{ project_name }}" }"#),
        ("base/src/index.ts.tera", "// {{ project_name }}"),
        ("ci/.github/workflows/ci.yml.tera", "name: CI"),
        ("docs/README.md.tera", "# {{ project_name }}"),
    ])
    .unwrap();
    source.insert_vanishing_dir("orm/prisma").unwrap();
    let h = Harness::with_source(source);

    let err = h
        .generator
        .generate(Path::new("/work/sample-api"), &config("sample-api"))
        .unwrap_err();

    let ForgeError::GenerationFailed(failure) = &err else {
        panic!("expected GenerationFailed, got {err:?}");
    };
    assert_eq!(failure.step, GenerationStep::CopyOrm);
    assert!(matches!(
        err.root_cause(),
        ForgeError::Application(ApplicationError::TemplateDirectoryNotFound { .. })
    ));
    assert!(failure.rollback.is_complete());

    // The target and the parent created for it are gone.
    assert!(!h.fs.exists(Path::new("/work/sample-api")));
    assert!(!h.fs.exists(Path::new("/work")));
    assert!(h.project_files("/work").is_empty());
}

#[test]
fn rollback_keeps_going_past_undeletable_paths() {
    let h = Harness::builtin();
    h.fs.fail_on("/app/docs/development.md", FsOp::Write);
    h.fs.fail_on("/app/src/app.ts", FsOp::RemoveFile);

    let err = h
        .generator
        .generate(Path::new("/app"), &config("app"))
        .unwrap_err();

    let ForgeError::GenerationFailed(failure) = &err else {
        panic!("expected GenerationFailed, got {err:?}");
    };
    assert_eq!(failure.step, GenerationStep::Docs);
    assert!(matches!(
        failure.error,
        ForgeError::Application(ApplicationError::FilesystemError { .. })
    ));

    let RollbackOutcome::PartiallyRolledBack {
        removed, remaining, ..
    } = &failure.rollback
    else {
        panic!("expected partial rollback, got {:?}", failure.rollback);
    };
    assert!(*removed > 0);
    assert!(remaining.contains(&PathBuf::from("/app/src/app.ts")));
    assert!(remaining.contains(&PathBuf::from("/app/src")));
    assert!(remaining.contains(&PathBuf::from("/app")));

    // Everything else is gone.
    assert_eq!(h.project_files("/app"), ["src/app.ts"]);
    assert!(failure.rollback.clone().into_result().is_err());
}

#[test]
fn invalid_configuration_touches_nothing() {
    let h = Harness::builtin();
    let config = ProjectConfig::builder()
        .name("svc")
        .orm(Orm::Drizzle)
        .database(Database::Mongodb)
        .build();
    assert!(config.is_err());
    assert!(h.fs.files().is_empty());
    assert!(h.fs.dirs().is_empty());
}

#[test]
fn non_empty_target_requires_overwrite() {
    let h = Harness::builtin();
    h.fs.create_dir_all(Path::new("/taken")).unwrap();
    h.fs.write_file(Path::new("/taken/notes.txt"), b"mine").unwrap();

    let err = h
        .generator
        .generate(Path::new("/taken"), &config("taken"))
        .unwrap_err();
    assert!(matches!(
        err,
        ForgeError::Application(ApplicationError::ProjectExists { .. })
    ));
    assert_eq!(h.project_files("/taken"), ["notes.txt"]);

    let fs: Arc<dyn Filesystem> = Arc::new(h.fs.clone());
    let source: Arc<dyn TemplateSource> = Arc::new(h.source.clone());
    let forced = ProjectGenerator::new(source, fs, Arc::new(TeraEngine), None).with_overwrite(true);
    forced
        .generate(Path::new("/taken"), &config("taken"))
        .unwrap();

    assert_eq!(h.fs.file_string("/taken/notes.txt").unwrap(), "mine");
    assert!(h.fs.exists(Path::new("/taken/package.json")));
}

#[test]
fn empty_existing_target_is_removed_when_rollback_empties_it() {
    let h = Harness::builtin();
    h.fs.create_dir_all(Path::new("/empty")).unwrap();
    h.fs.fail_on("/empty/README.md", FsOp::Write);

    let err = h
        .generator
        .generate(Path::new("/empty"), &config("empty"))
        .unwrap_err();
    assert!(matches!(err, ForgeError::GenerationFailed(_)));

    assert!(!h.fs.exists(Path::new("/empty")));
}

// ── Cache ────────────────────────────────────────────────────────────────

#[test]
fn second_generation_is_served_from_cache() {
    let h = Harness::builtin();
    let config = config("cached-api");

    h.generator
        .generate(Path::new("/a/cached-api"), &config)
        .unwrap();
    let first = h.cache.stats();
    assert!(first.disk_entries > 0);
    assert_eq!(first.disk_entries, first.memory_entries);

    h.generator
        .generate(Path::new("/b/cached-api"), &config)
        .unwrap();
    let second = h.cache.stats();

    assert_eq!(second.misses, first.misses, "no new misses");
    assert!(second.hits > first.hits);
    assert_eq!(second.disk_entries, first.disk_entries, "no new entries");

    // Identical output either way.
    let a = h.fs.file_string("/a/cached-api/src/index.ts").unwrap();
    let b = h.fs.file_string("/b/cached-api/src/index.ts").unwrap();
    assert_eq!(a, b);
    assert_eq!(h.manifest("/a/cached-api"), h.manifest("/b/cached-api"));
}

#[test]
fn editing_a_template_invalidates_its_entry() {
    let h = Harness::builtin();
    let config = config("edit-api");

    h.generator.generate(Path::new("/one"), &config).unwrap();
    let before = h.cache.stats();

    h.source
        .insert("docs/README.md.tera", "# {{ project_name_pascal }} (edited)")
        .unwrap();
    h.generator.generate(Path::new("/two"), &config).unwrap();
    let after = h.cache.stats();

    assert_eq!(after.misses, before.misses + 1);
    assert_eq!(after.disk_entries, before.disk_entries, "stale entry overwritten");
    assert_eq!(
        h.fs.file_string("/two/README.md").unwrap(),
        "# EditApi (edited)"
    );
}

#[test]
fn cache_fresh_instance_reads_disk_tier() {
    let h = Harness::builtin();
    let config = config("disk-api");
    h.generator.generate(Path::new("/first"), &config).unwrap();

    // A new cache over the same directory starts with an empty memory tier.
    let reopened = Arc::new(ContentCache::new(
        Arc::new(h.source.clone()),
        Arc::new(h.fs.clone()),
        CACHE_DIR,
    ));
    let generator = ProjectGenerator::new(
        Arc::new(h.source.clone()),
        Arc::new(h.fs.clone()),
        Arc::new(TeraEngine),
        Some(Arc::clone(&reopened)),
    );
    generator.generate(Path::new("/second"), &config).unwrap();

    let stats = reopened.stats();
    assert_eq!(stats.misses, 0);
    assert!(stats.hits > 0);
}

#[test]
fn cache_cleanup_and_clear() {
    let h = Harness::builtin();
    h.generator
        .generate(Path::new("/p"), &config("p"))
        .unwrap();

    let entries: Vec<PathBuf> = h.fs.files_under(CACHE_DIR);
    assert!(entries.len() >= 2);
    let old = SystemTime::now() - Duration::from_secs(60 * 60 * 24 * 30);
    assert!(h.fs.set_modified(&entries[0], old));

    let removed = h.cache.cleanup(Duration::from_secs(60 * 60 * 24 * 7));
    assert_eq!(removed, 1);
    let stats = h.cache.stats();
    assert_eq!(stats.disk_entries, entries.len() - 1);
    assert_eq!(stats.memory_entries, entries.len(), "memory tier untouched");

    let cleared = h.cache.clear().unwrap();
    assert_eq!(cleared, entries.len() - 1);
    let stats = h.cache.stats();
    assert_eq!(stats.disk_entries, 0);
    assert_eq!(stats.memory_entries, 0);
    assert_eq!(stats.total_bytes, 0);
}

#[test]
fn corrupt_disk_entries_are_discarded() {
    let h = Harness::builtin();
    let config = config("corrupt");
    h.generator.generate(Path::new("/c1"), &config).unwrap();

    for entry in h.fs.files_under(CACHE_DIR) {
        h.fs.write_file(&entry, b"{ not json").unwrap();
    }

    let reopened = Arc::new(ContentCache::new(
        Arc::new(h.source.clone()),
        Arc::new(h.fs.clone()),
        CACHE_DIR,
    ));
    let generator = ProjectGenerator::new(
        Arc::new(h.source.clone()),
        Arc::new(h.fs.clone()),
        Arc::new(TeraEngine),
        Some(Arc::clone(&reopened)),
    );
    generator.generate(Path::new("/c2"), &config).unwrap();

    // Re-rendered and rewritten as valid entries.
    for entry in h.fs.files_under(CACHE_DIR) {
        let text = h.fs.file_string(&entry).unwrap();
        assert!(serde_json::from_str::<Value>(&text).is_ok());
    }
    assert_eq!(
        h.fs.file_string("/c1/src/index.ts"),
        h.fs.file_string("/c2/src/index.ts")
    );
}

#[test]
fn entry_from_another_year_or_version_is_a_miss() {
    let h = Harness::builtin();
    let config = config("dated-api");
    let id = TemplateId::new("docs/README.md.tera").unwrap();
    let template_hash = sha256_hex(h.source.read(&id).unwrap());

    let current = RenderContext::from_config(&config);
    let stale = [
        current.clone().with_year(current.year - 1),
        current.clone().with_generator_version("0.0.9"),
    ];
    for context in &stale {
        h.cache
            .put(&id, context, &template_hash, "Generated by forgekit 0.0.9, 2020.");
    }

    let renderer = TemplateRenderer::new(
        Arc::new(h.source.clone()),
        Arc::new(TeraEngine),
        Some(Arc::clone(&h.cache)),
    );
    let out = renderer.render(&id, &config).unwrap();

    assert!(!out.contains("0.0.9, 2020"));
    assert!(out.contains(&format!(
        "Generated by forgekit {}, {}.",
        current.generator_version, current.year
    )));
    assert_eq!(h.cache.stats().hits, 0);
}

/// Swaps the template for a new version right after its second read, which
/// is the renderer's own read on a first, uncached render.
struct ShiftingSource {
    inner: MemoryTemplateSource,
    reads: AtomicUsize,
}

impl TemplateSource for ShiftingSource {
    fn exists(&self, id: &TemplateId) -> bool {
        self.inner.exists(id)
    }

    fn is_dir(&self, id: &TemplateId) -> bool {
        self.inner.is_dir(id)
    }

    fn read(&self, id: &TemplateId) -> ForgeResult<Vec<u8>> {
        let bytes = self.inner.read(id)?;
        if self.reads.fetch_add(1, Ordering::SeqCst) == 1 {
            self.inner.insert(id.as_str(), "v2 {{ project_name }}")?;
        }
        Ok(bytes)
    }

    fn list(&self, id: &TemplateId) -> ForgeResult<Vec<TemplateEntry>> {
        self.inner.list(id)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

#[test]
fn template_changed_mid_render_is_not_cached_under_new_hash() {
    let inner = MemoryTemplateSource::new();
    inner.insert("base/greeting.txt.tera", "v1 {{ project_name }}").unwrap();
    let source: Arc<dyn TemplateSource> = Arc::new(ShiftingSource {
        inner,
        reads: AtomicUsize::new(0),
    });

    let fs = MemoryFilesystem::new();
    let cache = Arc::new(ContentCache::new(
        Arc::clone(&source),
        Arc::new(fs),
        CACHE_DIR,
    ));
    let renderer = TemplateRenderer::new(source, Arc::new(TeraEngine), Some(cache));
    let id = TemplateId::new("base/greeting.txt.tera").unwrap();
    let config = config("app");

    assert_eq!(renderer.render(&id, &config).unwrap(), "v1 app");
    assert_eq!(renderer.render(&id, &config).unwrap(), "v2 app");
    assert_eq!(renderer.render(&id, &config).unwrap(), "v2 app");
}

// ── On disk ──────────────────────────────────────────────────────────────

#[test]
fn generates_onto_local_disk_from_template_directory() {
    let templates = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
    let out = tempfile::TempDir::new().unwrap();
    let root = out.path().join("disk-api");

    let generator = ProjectGenerator::new(
        Arc::new(DirectoryTemplateSource::new(&templates)),
        Arc::new(LocalFilesystem::new()),
        Arc::new(TeraEngine),
        None,
    );
    let config = ProjectConfig::builder()
        .name("disk-api")
        .orm(Orm::TypeOrm)
        .database(Database::Mysql)
        .build()
        .unwrap();

    let report = generator.generate(&root, &config).unwrap();

    assert!(report.files_written > 5);
    assert!(root.join("src/entities/User.ts").is_file());
    assert!(root.join(".github/workflows/ci.yml").is_file());
    let manifest: Value =
        serde_json::from_str(&std::fs::read_to_string(root.join("package.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["name"], "disk-api");
    assert!(manifest["dependencies"].get("typeorm").is_some());
}
