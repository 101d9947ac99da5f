//! Validation runner: scan, check, optionally fix, and report

use crate::config::Config;
use crate::diagnostic::{Finding, FixAction};
use crate::fixer::{order_fixes, FixOutcome, Fixer};
use crate::model::ModelDescriptor;
use crate::rules::{check_model, RuleSettings};
use crate::scanner::{ModelScanner, ScanError};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A fix that was attempted, with its outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixRecord {
    pub rule_id: String,
    pub description: String,
    /// "old -> new" rendering of the change
    pub change: String,
    pub outcome: FixOutcome,
}

/// Results for one model package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    /// Package location (the new location if it was renamed)
    pub path: PathBuf,
    /// Findings from the last check of this package
    pub findings: Vec<Finding>,
    /// Fixes attempted, in application order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<FixRecord>,
}

impl ModelReport {
    fn new(path: PathBuf, findings: Vec<Finding>) -> Self {
        Self {
            path,
            findings,
            fixes: Vec::new(),
        }
    }

    pub fn is_passing(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn has_scan_error(&self) -> bool {
        self.findings.iter().any(Finding::is_scan_error)
    }
}

/// Result of validating one root folder
#[derive(Debug, Default, Serialize)]
pub struct Report {
    /// Root folder that was scanned
    pub root: PathBuf,
    /// Per-model results in discovery order
    pub models: Vec<ModelReport>,
    /// Fixes written to disk
    pub fixes_applied: usize,
    /// Fixes refused because the disk no longer matched
    pub fixes_failed: usize,
    /// Fixes not written (dry run or already in place)
    pub fixes_skipped: usize,
    /// Processing duration
    pub duration: Duration,
}

impl Report {
    pub fn models_scanned(&self) -> usize {
        self.models.len()
    }

    pub fn passing_models(&self) -> usize {
        self.models.iter().filter(|m| m.is_passing()).count()
    }

    pub fn total_findings(&self) -> usize {
        self.models.iter().map(|m| m.findings.len()).sum()
    }

    pub fn scan_errors(&self) -> usize {
        self.findings().filter(|f| f.is_scan_error()).count()
    }

    /// All findings in report order
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.models.iter().flat_map(|m| m.findings.iter())
    }

    /// Number of findings per rule id
    pub fn counts_by_rule(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for finding in self.findings() {
            *counts.entry(finding.rule_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// 0 when clean, 1 when there are rule findings, 2 when a package could not be scanned
    pub fn exit_code(&self) -> i32 {
        if self.scan_errors() > 0 {
            2
        } else if self.total_findings() > 0 {
            1
        } else {
            0
        }
    }
}

/// Runs the rule set over every package below a root
pub struct Engine {
    config: Config,
    scanner: ModelScanner,
    settings: RuleSettings,
    fixer: Fixer,
}

impl Engine {
    /// Create a new engine
    pub fn new(config: Config) -> Result<Self, ScanError> {
        let scanner = ModelScanner::new(&config)?;
        let settings = config.rule_settings();
        Ok(Self {
            config,
            scanner,
            settings,
            fixer: Fixer::new(false),
        })
    }

    /// Check fix preconditions without writing anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.fixer = Fixer::new(dry_run);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run all enabled rules on one descriptor
    pub fn check(&self, model: &ModelDescriptor) -> Vec<Finding> {
        check_model(model, &self.settings, |id| {
            self.config.is_rule_enabled(id.as_str())
        })
    }

    /// Validate every package below `root`
    ///
    /// Fails only when `root` itself cannot be read; per-package problems end
    /// up in the report as `scan-error` findings.
    pub fn run(&self, root: &Path, fix_enabled: bool) -> Result<Report, ScanError> {
        let start = Instant::now();
        let packages = self.scanner.discover(root)?;

        // Renames in one package could race with discovery of another
        let parallel = self.config.engine.parallel && !fix_enabled && packages.len() > 1;
        let models = self.process_batch(&packages, parallel, |path| {
            self.process_model(path, fix_enabled)
        });

        let mut report = Report {
            root: root.to_path_buf(),
            models,
            ..Report::default()
        };
        for record in report.models.iter().flat_map(|m| m.fixes.iter()) {
            match record.outcome {
                FixOutcome::Applied => report.fixes_applied += 1,
                FixOutcome::Skipped(_) => report.fixes_skipped += 1,
                FixOutcome::Failed(_) => report.fixes_failed += 1,
            }
        }
        report.duration = start.elapsed();

        info!(
            "{}: {} model(s), {} finding(s), {} fix(es) applied in {:?}",
            root.display(),
            report.models_scanned(),
            report.total_findings(),
            report.fixes_applied,
            report.duration
        );
        Ok(report)
    }

    /// Run `work` on every package, in discovery order
    ///
    /// A panic inside `work` is reported against that package and the rest of
    /// the batch carries on.
    fn process_batch<F>(&self, packages: &[PathBuf], parallel: bool, work: F) -> Vec<ModelReport>
    where
        F: Fn(&Path) -> ModelReport + Sync,
    {
        let isolated = |path: &PathBuf| isolate(path, || work(path.as_path()));
        if !parallel {
            return packages.iter().map(isolated).collect();
        }

        let threads = if self.config.engine.jobs > 0 {
            self.config.engine.jobs
        } else {
            num_cpus::get()
        };
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| packages.par_iter().map(isolated).collect()),
            Err(e) => {
                warn!("Cannot start worker pool, checking sequentially: {}", e);
                packages.iter().map(isolated).collect()
            }
        }
    }

    fn process_model(&self, path: &Path, fix_enabled: bool) -> ModelReport {
        let model = match self.scanner.scan_model(path) {
            Ok(model) => model,
            Err(e) => return scan_failure(path, &e),
        };

        let findings = self.check(&model);
        debug!("{}: {} finding(s)", model.root_path.display(), findings.len());
        if !fix_enabled || !findings.iter().any(Finding::is_fixable) {
            return ModelReport::new(model.root_path, findings);
        }

        let (fixes, new_root) = self.apply_fixes(&model, &findings);
        if !fixes.iter().any(|f| f.outcome.is_applied()) {
            let mut report = ModelReport::new(model.root_path, findings);
            report.fixes = fixes;
            return report;
        }

        // Re-scan so the report reflects what is on disk now
        let mut report = match self.scanner.scan_model(&new_root) {
            Ok(rescanned) => {
                let findings = self.check(&rescanned);
                ModelReport::new(rescanned.root_path, findings)
            }
            Err(e) => scan_failure(&new_root, &e),
        };
        report.fixes = fixes;
        report
    }

    /// Apply fixes in a safe order; returns the records and the package root
    /// after any rename
    fn apply_fixes(&self, model: &ModelDescriptor, findings: &[Finding]) -> (Vec<FixRecord>, PathBuf) {
        let proposed: Vec<_> = findings.iter().filter_map(|f| f.fix.as_ref()).collect();
        let mut root = model.root_path.clone();
        let mut records = Vec::with_capacity(proposed.len());

        for fix in order_fixes(model, &proposed) {
            let outcome = self.fixer.apply(model, fix);
            if outcome.is_applied() {
                if let FixAction::Rename { from, to } = &fix.action {
                    if from == &model.root_path {
                        root = to.clone();
                    }
                }
            }

            let rule_id = findings
                .iter()
                .find(|f| f.fix.as_ref() == Some(fix))
                .map(|f| f.rule_id.clone())
                .unwrap_or_default();
            records.push(FixRecord {
                rule_id,
                description: fix.description.clone(),
                change: fix.summary(),
                outcome,
            });
        }

        (records, root)
    }
}

/// Turn a panic in `work` into a `scan-error` report for `path`
fn isolate(path: &Path, work: impl FnOnce() -> ModelReport) -> ModelReport {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(report) => report,
        Err(payload) => {
            let message = format!("internal error: {}", panic_message(payload.as_ref()));
            warn!("{}: {}", path.display(), message);
            ModelReport::new(
                path.to_path_buf(),
                vec![Finding::scan_error(path, &message)],
            )
        }
    }
}

fn scan_failure(path: &Path, error: &ScanError) -> ModelReport {
    warn!("Skipping {}: {}", path.display(), error);
    ModelReport::new(
        path.to_path_buf(),
        vec![Finding::scan_error(path, &error.to_string())],
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic while checking model".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::SCAN_ERROR_RULE;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    const CONFIG: &str = "<model><name>M</name><author><name>Ann</name><email>ann@example.com</email></author><description>Test</description></model>";

    fn package(root: &Path, name: &str) -> PathBuf {
        let pkg = root.join(name);
        write(&pkg.join("model.config"), CONFIG);
        write(&pkg.join("model.sdf"), "<sdf version=\"1.6\"><model name=\"m\"><pose>0 0 0 0 0 0</pose></model></sdf>");
        write(&pkg.join("meshes/Body.dae"), "");
        pkg
    }

    #[test]
    fn test_report_exit_code() {
        let mut report = Report::default();
        assert_eq!(report.exit_code(), 0);

        report.models.push(ModelReport::new(
            PathBuf::from("a"),
            vec![Finding::new("MtlDiffuse", Path::new("a"), "x")],
        ));
        assert_eq!(report.exit_code(), 1);

        report.models.push(ModelReport::new(
            PathBuf::from("b"),
            vec![Finding::scan_error(Path::new("b"), "boom")],
        ));
        assert_eq!(report.exit_code(), 2);
        assert_eq!(report.scan_errors(), 1);
    }

    #[test]
    fn test_counts_by_rule() {
        let mut report = Report::default();
        report.models.push(ModelReport::new(
            PathBuf::from("a"),
            vec![
                Finding::new("MtlDiffuse", Path::new("a"), "x"),
                Finding::new("MtlDiffuse", Path::new("a"), "y"),
                Finding::new("FolderStructure", Path::new("a"), "z"),
            ],
        ));
        let counts = report.counts_by_rule();
        assert_eq!(counts.get("MtlDiffuse"), Some(&2));
        assert_eq!(counts.get("FolderStructure"), Some(&1));
    }

    #[test]
    fn test_run_clean_root() {
        let temp = TempDir::new().unwrap();
        package(temp.path(), "Table");
        package(temp.path(), "Chair");

        let engine = Engine::new(Config::default()).unwrap();
        let report = engine.run(temp.path(), false).unwrap();

        assert_eq!(report.models_scanned(), 2);
        assert_eq!(report.passing_models(), 2);
        assert_eq!(report.exit_code(), 0);
        // Discovery order is by path
        assert!(report.models[0].path.ends_with("Chair"));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let temp = TempDir::new().unwrap();
        for name in ["alpha", "Beta", "gamma_box", "Delta"] {
            let pkg = package(temp.path(), name);
            write(&pkg.join("meshes/notes.txt"), "");
        }

        let mut sequential = Config::default();
        sequential.engine.parallel = false;
        let mut parallel = Config::default();
        parallel.engine.jobs = 2;

        let a = Engine::new(sequential).unwrap().run(temp.path(), false).unwrap();
        let b = Engine::new(parallel).unwrap().run(temp.path(), false).unwrap();
        assert_eq!(a.models, b.models);
    }

    #[test]
    fn test_fix_renames_and_rechecks() {
        let temp = TempDir::new().unwrap();
        let pkg = package(temp.path(), "my_table");
        write(&pkg.join("meshes/Body.mtl"), "newmtl Body\nKd 0.5 0.5 0.5\n");

        let engine = Engine::new(Config::default()).unwrap();
        let report = engine.run(temp.path(), true).unwrap();

        assert_eq!(report.fixes_applied, 2);
        assert_eq!(report.models[0].path, temp.path().join("MyTable"));
        assert!(report.models[0].is_passing());
        assert!(temp.path().join("MyTable/meshes/Body.mtl").is_file());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_dry_run_keeps_findings() {
        let temp = TempDir::new().unwrap();
        package(temp.path(), "my_table");

        let engine = Engine::new(Config::default()).unwrap().with_dry_run(true);
        let report = engine.run(temp.path(), true).unwrap();

        assert_eq!(report.fixes_applied, 0);
        assert_eq!(report.fixes_skipped, 1);
        assert_eq!(report.total_findings(), 1);
        assert!(temp.path().join("my_table").is_dir());
    }

    #[test]
    fn test_disabled_rule_is_not_run() {
        let temp = TempDir::new().unwrap();
        package(temp.path(), "my_table");

        let mut config = Config::default();
        config.rules.disabled = vec!["namingconvention".to_string()];
        let report = Engine::new(config).unwrap().run(temp.path(), false).unwrap();
        assert_eq!(report.total_findings(), 0);
    }

    #[test]
    fn test_unreadable_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let engine = Engine::new(Config::default()).unwrap();
        assert!(engine.run(&temp.path().join("missing"), false).is_err());
    }

    #[test]
    fn test_scan_failure_does_not_stop_batch() {
        let temp = TempDir::new().unwrap();
        let good = package(temp.path(), "Table");
        let engine = Engine::new(Config::default()).unwrap();

        let packages = [temp.path().join("Vanished"), good];
        let reports = engine.process_batch(&packages, false, |p| engine.process_model(p, false));

        assert!(reports[0].has_scan_error());
        assert_eq!(reports[0].findings.len(), 1);
        assert!(reports[1].is_passing());
    }

    #[test]
    fn test_panic_in_one_model_does_not_stop_batch() {
        let temp = TempDir::new().unwrap();
        let packages = [
            package(temp.path(), "Broken"),
            package(temp.path(), "Table"),
            package(temp.path(), "my_chair"),
        ];
        let engine = Engine::new(Config::default()).unwrap();

        for parallel in [false, true] {
            let reports = engine.process_batch(&packages, parallel, |p| {
                if p.ends_with("Broken") {
                    panic!("descriptor for {} is inconsistent", p.display());
                }
                engine.process_model(p, false)
            });

            assert_eq!(reports.len(), 3);
            assert_eq!(reports[0].path, packages[0]);
            assert!(reports[0].has_scan_error());
            assert_eq!(reports[0].findings[0].rule_id, SCAN_ERROR_RULE);
            assert!(reports[0].findings[0]
                .message
                .starts_with("internal error: descriptor for"));
            assert!(reports[1].is_passing());
            assert_eq!(reports[2].findings[0].rule_id, "NamingConvention");
        }
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        assert_eq!(SCAN_ERROR_RULE, "scan-error");
    }
}
