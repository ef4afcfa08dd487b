use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use pkgdeck_core::PackageIdentity;
use pkgdeck_installer::PrefixLayout;
use pkgdeck_registry::SearchQuery;

use super::*;
use crate::flows::{ReportStatus, SearchRow};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_dir(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let seq = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("pkgdeck-cli-{label}-{nanos}-{seq}"))
}

fn publish(root: &Path, id: &str, version: &str) {
    let dir = root.join("index").join(id);
    fs::create_dir_all(&dir).expect("must create package dir");
    fs::write(
        dir.join(format!("{version}.toml")),
        format!(
            "id = \"{id}\"\nversion = \"{version}\"\ndescription = \"{id} package\"\nlicense = \"MIT\"\n"
        ),
    )
    .expect("must write manifest");
}

struct Fixture {
    registry: PathBuf,
    layout: PrefixLayout,
}

impl Fixture {
    fn new() -> Self {
        let registry = test_dir("registry");
        publish(&registry, "demo", "1.0.0");
        publish(&registry, "demo", "1.2.0");
        publish(&registry, "demo", "2.0.0-beta");
        publish(&registry, "tool", "0.3.0");
        Self {
            registry,
            layout: PrefixLayout::new(test_dir("prefix")),
        }
    }

    fn executor(&self) -> Executor {
        open_executor(&self.layout, self.registry.clone()).expect("must open executor")
    }

    fn installed(&self, executor: &Executor) -> Vec<String> {
        executor
            .installed()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.registry);
        let _ = fs::remove_dir_all(self.layout.prefix());
    }
}

#[test]
fn cli_parses_search_with_global_flags() {
    let cli = Cli::try_parse_from([
        "pkgdeck",
        "search",
        "demo",
        "--all-versions",
        "--count",
        "5",
        "--plain",
        "-vv",
    ])
    .expect("command must parse");
    assert!(cli.plain);
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Commands::Search {
            term,
            all_versions,
            count,
            skip,
            json,
            ..
        } => {
            assert_eq!(term, "demo");
            assert!(all_versions);
            assert_eq!(count, Some(5));
            assert_eq!(skip, 0);
            assert!(!json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_search_term_defaults_to_empty() {
    let cli = Cli::try_parse_from(["pkgdeck", "search"]).expect("command must parse");
    match cli.command {
        Commands::Search { term, .. } => assert!(term.is_empty()),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn config_defaults_when_file_is_missing() {
    let path = test_dir("config").join("config.toml");
    let config = Config::load(&path).expect("missing config must load defaults");
    assert_eq!(config, Config::default());
    assert_eq!(config.page_size, 20);
    assert!(!config.include_prerelease);
}

#[test]
fn config_reads_partial_file() {
    let config = Config::from_toml_str("include_prerelease = true\n").expect("must parse");
    assert!(config.include_prerelease);
    assert_eq!(config.page_size, 20);
    assert_eq!(config.registry_root, None);
}

#[test]
fn config_rejects_zero_page_size() {
    let err = Config::from_toml_str("page_size = 0\n").expect_err("zero page size must fail");
    assert!(err.to_string().contains("page_size"));
}

#[test]
fn config_load_reports_parse_errors_with_path() {
    let dir = test_dir("config");
    fs::create_dir_all(&dir).expect("must create dir");
    let path = dir.join("config.toml");
    fs::write(&path, "page_size = \"many\"\n").expect("must write config");

    let err = Config::load(&path).expect_err("invalid config must fail");
    assert!(err.to_string().contains("failed parsing config"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn registry_flag_takes_precedence_over_config() {
    let config = Config::from_toml_str("registry_root = \"/srv/from-config\"\n").expect("must parse");
    assert_eq!(
        config
            .registry_root(Some(Path::new("/srv/from-flag")))
            .expect("flag must resolve"),
        PathBuf::from("/srv/from-flag")
    );
    assert_eq!(
        config.registry_root(None).expect("config must resolve"),
        PathBuf::from("/srv/from-config")
    );

    let err = Config::default()
        .registry_root(None)
        .expect_err("no registry must fail");
    assert!(err.to_string().contains("--registry-root"));
}

#[test]
fn explicit_prefix_flag_wins() {
    let prefix = crate::config::resolve_prefix(Some(Path::new("/opt/pkgdeck")))
        .expect("flag must resolve");
    assert_eq!(prefix, PathBuf::from("/opt/pkgdeck"));
}

#[test]
fn status_lines_only_carry_badges_in_rich_mode() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, ReportStatus::Changed, "installed demo@1.0.0"),
        "installed demo@1.0.0"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, ReportStatus::Changed, "installed demo@1.0.0"),
        "[OK] installed demo@1.0.0"
    );
    assert_eq!(
        render_status_line(
            OutputStyle::Rich,
            ReportStatus::Unchanged,
            "demo@1.0.0 is already installed"
        ),
        "[INFO] demo@1.0.0 is already installed"
    );
}

#[test]
fn search_lists_latest_versions_with_offered_actions() {
    let fixture = Fixture::new();
    let executor = fixture.executor();

    let rows = run_search(&executor, &SearchQuery::new("", 20)).expect("search must succeed");
    assert_eq!(
        format_search_lines(&rows, OutputStyle::Plain),
        vec![
            "demo 1.2.0 (not installed) -> install\n    demo package".to_string(),
            "tool 0.3.0 (not installed) -> install\n    tool package".to_string(),
        ]
    );
}

#[test]
fn empty_results_render_placeholder_lines() {
    assert_eq!(
        format_search_lines(&[], OutputStyle::Plain),
        vec!["no packages found"]
    );
    assert_eq!(
        format_installed_lines(&InstalledSet::new()),
        vec!["no packages installed"]
    );
}

#[test]
fn info_lists_every_version_of_one_package() {
    let fixture = Fixture::new();
    let executor = fixture.executor();
    install_package(&executor, &PackageIdentity::new("demo", "1.0.0")).expect("must install");

    let rows: Vec<SearchRow> = run_info(&executor, "demo", true).expect("info must succeed");
    let summary: Vec<(String, Option<&'static str>)> = rows
        .iter()
        .map(|row| {
            (
                row.manifest.identity().to_string(),
                row.entry.action.map(|action| action.label()),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("demo@2.0.0-beta".to_string(), Some("update")),
            ("demo@1.2.0".to_string(), Some("update")),
            ("demo@1.0.0".to_string(), Some("uninstall")),
        ]
    );

    let stable = run_info(&executor, "demo", false).expect("info must succeed");
    assert_eq!(stable.len(), 2);
    assert!(run_info(&executor, "dem", true)
        .expect("info must succeed")
        .is_empty());
}

#[test]
fn resolve_target_prefers_explicit_version_then_latest_stable() {
    let fixture = Fixture::new();
    let executor = fixture.executor();

    let explicit = resolve_target(executor.index(), "demo", Some("1.0.0".to_string()), false)
        .expect("explicit version must resolve");
    assert_eq!(explicit.to_string(), "demo@1.0.0");

    let latest =
        resolve_target(executor.index(), "demo", None, false).expect("latest must resolve");
    assert_eq!(latest.to_string(), "demo@1.2.0");

    let prerelease =
        resolve_target(executor.index(), "demo", None, true).expect("latest must resolve");
    assert_eq!(prerelease.to_string(), "demo@2.0.0-beta");

    let err = resolve_target(executor.index(), "missing", None, false)
        .expect_err("unknown package must fail");
    assert!(err.to_string().contains("was not found"));
}

#[test]
fn install_then_reinstall_reports_no_change() {
    let fixture = Fixture::new();
    let executor = fixture.executor();
    let target = PackageIdentity::new("demo", "1.2.0");

    let report = install_package(&executor, &target).expect("install must succeed");
    assert_eq!(report.status, ReportStatus::Changed);
    assert_eq!(report.message, "installed demo@1.2.0");
    assert_eq!(fixture.installed(&executor), vec!["demo@1.2.0"]);

    let again = install_package(&executor, &target).expect("reinstall must not fail");
    assert_eq!(again.status, ReportStatus::Unchanged);
    assert_eq!(again.message, "demo@1.2.0 is already installed");
}

#[test]
fn install_rejects_incomparable_candidate_over_installed_version() {
    let fixture = Fixture::new();
    publish(&fixture.registry, "demo", "1.x.0");
    let executor = fixture.executor();
    install_package(&executor, &PackageIdentity::new("demo", "1.0.0")).expect("must install");

    let err = install_package(&executor, &PackageIdentity::new("demo", "1.x.0"))
        .expect_err("incomparable versions must not report success");
    let rendered = format!("{err:#}");
    assert!(rendered.contains("cannot install demo@1.x.0"), "{rendered}");
    assert!(rendered.contains("malformed version '1.x.0'"), "{rendered}");
    assert_eq!(fixture.installed(&executor), vec!["demo@1.0.0"]);
}

#[test]
fn install_over_other_version_points_at_update() {
    let fixture = Fixture::new();
    let executor = fixture.executor();
    install_package(&executor, &PackageIdentity::new("demo", "1.0.0")).expect("must install");

    let err = install_package(&executor, &PackageIdentity::new("demo", "1.2.0"))
        .expect_err("installing a second version must fail");
    assert!(err.to_string().contains("pkgdeck update demo@1.2.0"));
    assert_eq!(fixture.installed(&executor), vec!["demo@1.0.0"]);
}

#[test]
fn update_moves_to_latest_and_downgrade_needs_explicit_version() {
    let fixture = Fixture::new();
    let executor = fixture.executor();
    install_package(&executor, &PackageIdentity::new("demo", "1.0.0")).expect("must install");

    let latest = resolve_target(executor.index(), "demo", None, false).expect("must resolve");
    let report = update_package(&executor, &latest, false).expect("update must succeed");
    assert_eq!(report.message, "updated demo 1.0.0 -> 1.2.0");
    assert_eq!(fixture.installed(&executor), vec!["demo@1.2.0"]);

    let up_to_date = update_package(&executor, &latest, false).expect("must not fail");
    assert_eq!(up_to_date.message, "demo@1.2.0 is up to date");

    let older = PackageIdentity::new("demo", "1.0.0");
    let skipped = update_package(&executor, &older, false).expect("must not fail");
    assert_eq!(skipped.status, ReportStatus::Unchanged);
    assert_eq!(fixture.installed(&executor), vec!["demo@1.2.0"]);

    let downgraded = update_package(&executor, &older, true).expect("downgrade must succeed");
    assert_eq!(downgraded.message, "downgraded demo 1.2.0 -> 1.0.0");
    assert_eq!(fixture.installed(&executor), vec!["demo@1.0.0"]);
}

#[test]
fn update_requires_an_installed_package() {
    let fixture = Fixture::new();
    let executor = fixture.executor();

    let err = update_package(&executor, &PackageIdentity::new("tool", "0.3.0"), false)
        .expect_err("update of missing package must fail");
    assert!(err.to_string().contains("not installed"));
}

#[test]
fn uninstall_removes_by_id() {
    let fixture = Fixture::new();
    let executor = fixture.executor();
    install_package(&executor, &PackageIdentity::new("tool", "0.3.0")).expect("must install");

    let report = uninstall_package(&executor, "tool").expect("uninstall must succeed");
    assert_eq!(report.message, "uninstalled tool@0.3.0");
    assert!(executor.installed().is_empty());

    let err = uninstall_package(&executor, "tool").expect_err("second uninstall must fail");
    assert!(err.to_string().contains("not installed"));
}

#[test]
fn installed_state_survives_reopening_the_prefix() {
    let fixture = Fixture::new();
    {
        let executor = fixture.executor();
        install_package(&executor, &PackageIdentity::new("demo", "1.0.0")).expect("must install");
        install_package(&executor, &PackageIdentity::new("tool", "0.3.0")).expect("must install");
    }

    let reopened = fixture.executor();
    assert_eq!(
        format_installed_lines(&reopened.installed()),
        vec!["demo 1.0.0", "tool 0.3.0"]
    );
}

#[test]
fn search_json_reports_installed_version_and_action() {
    let fixture = Fixture::new();
    let executor = fixture.executor();
    install_package(&executor, &PackageIdentity::new("demo", "1.0.0")).expect("must install");

    let rows = run_search(&executor, &SearchQuery::new("demo", 20)).expect("search must succeed");
    let rendered = render_search_json(&rows).expect("must render json");
    let value: serde_json::Value = serde_json::from_str(&rendered).expect("must be valid json");

    assert_eq!(value[0]["id"], "demo");
    assert_eq!(value[0]["version"], "1.2.0");
    assert_eq!(value[0]["installed_version"], "1.0.0");
    assert_eq!(value[0]["action"], "update");
    assert_eq!(value[0]["license"], "MIT");
    assert!(value[0]["incomparable"].is_null());
}
