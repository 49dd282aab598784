use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::AggregateConfig;
use crate::data::extract::select_density_fields;
use crate::data::filter::ALL_DATASETS;
use crate::data::loader::{ensure_parent, read_pin_file, write_table};
use crate::data::mesh::read_mesh;
use crate::data::model::{PinKey, PinStatsRow, PointValueRow};
use crate::data::table::build_tables;
use crate::error::{PipelineError, Result};
use crate::stats::{estimate_mode, Summary};

// ---------------------------------------------------------------------------
// Case discovery
// ---------------------------------------------------------------------------

/// One mesh file, its sidecar Pin file and the dataset it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSpec {
    pub mesh_path: PathBuf,
    pub pin_path: PathBuf,
    pub dataset: String,
}

/// Dataset id of a mesh: the first directory below `root`, or the file stem
/// when the mesh sits directly in `root`. `None` if `path` is not under `root`.
pub fn classify_dataset(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&std::ffi::OsStr> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    match parts.as_slice() {
        [] => None,
        [_file] => rel
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned()),
        [first, ..] => Some(first.to_string_lossy().into_owned()),
    }
}

/// Recursively find mesh files under `root`, in sorted path order.
pub fn discover_cases(root: &Path, mesh_extension: &str, pin_extension: &str) -> Result<Vec<CaseSpec>> {
    if !root.is_dir() {
        return Err(PipelineError::MissingInput(root.to_path_buf()));
    }

    let mut cases = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| PipelineError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(mesh_extension));
        if !matches {
            continue;
        }
        let Some(dataset) = classify_dataset(root, path) else {
            continue;
        };
        cases.push(CaseSpec {
            mesh_path: path.to_path_buf(),
            pin_path: path.with_extension(pin_extension),
            dataset,
        });
    }
    cases.sort_by(|a, b| a.mesh_path.cmp(&b.mesh_path));
    Ok(cases)
}

// ---------------------------------------------------------------------------
// Per-case processing
// ---------------------------------------------------------------------------

/// Read one case from disk and turn it into point rows.
pub fn process_case(case: &CaseSpec, mode_grid: usize) -> Result<Vec<PointValueRow>> {
    let pins = read_pin_file(&case.pin_path)?;
    let mesh = read_mesh(&case.mesh_path)?;
    let fields = select_density_fields(&mesh.point_data)?;
    let tables = build_tables(&case.dataset, &fields, &pins, mode_grid)?;
    log::debug!(
        "{}: {} fields, {} finite points",
        case.mesh_path.display(),
        fields.len(),
        tables.values.len()
    );
    Ok(tables.values)
}

#[derive(Debug)]
pub struct CaseResult {
    pub case: CaseSpec,
    pub rows: Vec<PointValueRow>,
}

#[derive(Debug)]
pub struct CaseFailure {
    pub case: CaseSpec,
    pub error: PipelineError,
}

/// Result of folding over all cases: every case lands in exactly one list.
#[derive(Debug, Default)]
pub struct CaseOutcome {
    pub successes: Vec<CaseResult>,
    pub failures: Vec<CaseFailure>,
}

/// Process every case independently; a failing case is logged and recorded,
/// never fatal.
pub fn run_cases<F>(cases: Vec<CaseSpec>, mut process: F) -> CaseOutcome
where
    F: FnMut(&CaseSpec) -> Result<Vec<PointValueRow>>,
{
    cases
        .into_iter()
        .fold(CaseOutcome::default(), |mut outcome, case| {
            match process(&case) {
                Ok(rows) => outcome.successes.push(CaseResult { case, rows }),
                Err(error) => {
                    log::warn!(
                        "Skipping {} ({}): {error}",
                        case.dataset,
                        case.mesh_path.display()
                    );
                    outcome.failures.push(CaseFailure { case, error });
                }
            }
            outcome
        })
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

fn stats_row(dataset: &str, pin: f64, values: &[f64], dataset_count: usize, mode_grid: usize) -> Option<PinStatsRow> {
    let summary = Summary::from_values(values)?;
    Some(PinStatsRow {
        dataset: dataset.to_string(),
        pin,
        mode: estimate_mode(values, mode_grid),
        std: summary.std,
        min: summary.min,
        q1: summary.q1,
        median: summary.median,
        q3: summary.q3,
        max: summary.max,
        valid_points: summary.count,
        dataset_count,
    })
}

/// Per-(dataset, pin) rows ordered by dataset then Pin, followed by the pooled
/// `ALL` rows ordered by Pin.
pub fn compute_stats(rows: &[PointValueRow], mode_grid: usize) -> Vec<PinStatsRow> {
    let mut per_dataset: BTreeMap<(String, PinKey), Vec<f64>> = BTreeMap::new();
    let mut pooled: BTreeMap<PinKey, (Vec<f64>, BTreeSet<&str>)> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.value.is_finite()) {
        per_dataset
            .entry((row.dataset.clone(), PinKey(row.pin)))
            .or_default()
            .push(row.value);
        let (values, sources) = pooled.entry(PinKey(row.pin)).or_default();
        values.push(row.value);
        sources.insert(row.dataset.as_str());
    }

    let dataset_rows = per_dataset
        .iter()
        .filter_map(|((dataset, pin), values)| stats_row(dataset, pin.0, values, 1, mode_grid));
    let pooled_rows = pooled.iter().filter_map(|(pin, (values, sources))| {
        stats_row(ALL_DATASETS, pin.0, values, sources.len(), mode_grid)
    });
    dataset_rows.chain(pooled_rows).collect()
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportEntry {
    pub dataset: String,
    pub mesh: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Machine-readable summary of a run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregateReport {
    pub processed: Vec<ReportEntry>,
    pub failures: Vec<ReportEntry>,
}

impl CaseOutcome {
    pub fn report(&self) -> AggregateReport {
        AggregateReport {
            processed: self
                .successes
                .iter()
                .map(|s| ReportEntry {
                    dataset: s.case.dataset.clone(),
                    mesh: s.case.mesh_path.display().to_string(),
                    rows: Some(s.rows.len()),
                    error: None,
                })
                .collect(),
            failures: self
                .failures
                .iter()
                .map(|f| ReportEntry {
                    dataset: f.case.dataset.clone(),
                    mesh: f.case.mesh_path.display().to_string(),
                    rows: None,
                    error: Some(f.error.to_string()),
                })
                .collect(),
        }
    }
}

/// Everything written by an aggregation run.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub values: Vec<PointValueRow>,
    pub stats: Vec<PinStatsRow>,
    /// Sorted, de-duplicated names of datasets with at least one good case.
    pub datasets: Vec<String>,
    pub report: AggregateReport,
}

/// Merge the successful cases. Fails when no case succeeded.
pub fn aggregate(outcome: CaseOutcome, mode_grid: usize) -> Result<Aggregation> {
    if outcome.successes.is_empty() {
        return Err(PipelineError::EmptyData(
            "No datasets were processed successfully".into(),
        ));
    }
    let report = outcome.report();

    let datasets: BTreeSet<String> = outcome
        .successes
        .iter()
        .map(|s| s.case.dataset.clone())
        .collect();
    let values: Vec<PointValueRow> = outcome
        .successes
        .into_iter()
        .flat_map(|s| s.rows)
        .collect();
    if values.is_empty() {
        return Err(PipelineError::EmptyData("aggregated value table is empty".into()));
    }
    let stats = compute_stats(&values, mode_grid);

    Ok(Aggregation {
        values,
        stats,
        datasets: datasets.into_iter().collect(),
        report,
    })
}

/// Output locations of an aggregation run.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub values: PathBuf,
    pub stats: PathBuf,
    pub index: PathBuf,
    pub report: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path, config: &AggregateConfig) -> Self {
        OutputPaths {
            values: dir.join(&config.values_file),
            stats: dir.join(&config.stats_file),
            index: dir.join(&config.index_file),
            report: dir.join(&config.report_file),
        }
    }
}

/// Write the value table, the statistics table, the dataset index and the
/// JSON report, replacing earlier outputs.
pub fn write_outputs(aggregation: &Aggregation, paths: &OutputPaths) -> Result<()> {
    write_table(&paths.values, &aggregation.values)?;
    write_table(&paths.stats, &aggregation.stats)?;

    ensure_parent(&paths.index)?;
    fs::write(&paths.index, aggregation.datasets.join("\n"))?;

    ensure_parent(&paths.report)?;
    let json = serde_json::to_string_pretty(&aggregation.report)
        .map_err(|e| PipelineError::parse("aggregate report", e))?;
    fs::write(&paths.report, json)?;
    Ok(())
}

/// Discover, process, merge and write. Returns the aggregation that was written.
pub fn run_aggregate(
    datasets_dir: &Path,
    output_dir: &Path,
    config: &AggregateConfig,
    mode_grid: usize,
) -> Result<Aggregation> {
    let cases = discover_cases(datasets_dir, &config.mesh_extension, &config.pin_extension)?;
    if cases.is_empty() {
        return Err(PipelineError::EmptyData(format!(
            "No .{} files found in {}",
            config.mesh_extension,
            datasets_dir.display()
        )));
    }
    log::info!("Found {} cases under {}", cases.len(), datasets_dir.display());

    let outcome = run_cases(cases, |case| process_case(case, mode_grid));
    log::info!(
        "{} cases processed, {} skipped",
        outcome.successes.len(),
        outcome.failures.len()
    );

    let aggregation = aggregate(outcome, mode_grid)?;
    let paths = OutputPaths::in_dir(output_dir, config);
    write_outputs(&aggregation, &paths)?;

    log::info!("Aggregated values -> {}", paths.values.display());
    log::info!("Aggregated statistics -> {}", paths.stats.display());
    log::info!("Dataset index -> {}", paths.index.display());
    Ok(aggregation)
}
