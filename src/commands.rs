use std::path::Path;

use anyhow::{bail, Context, Result};

use pin_density::aggregate::run_aggregate;
use pin_density::analysis::decay::{decay_rows, validate_alphas};
use pin_density::analysis::distribution::{curves_by_dataset, curves_by_pin};
use pin_density::analysis::gaps::coverage_from_file;
use pin_density::analysis::series::{stat_series, StatKind};
use pin_density::analysis::slice::{axial_slice, radial_slice, select_cases, SliceCase};
use pin_density::analysis::trend::{fit_power_law, read_radius_power};
use pin_density::config::AppConfig;
use pin_density::data::extract::select_density_fields;
use pin_density::data::filter::{normalize_dataset_name, positive_density_rows, PinRange};
use pin_density::data::loader::{read_pin_file, read_table, write_table};
use pin_density::data::mesh::read_mesh;
use pin_density::data::model::{StatsRecord, ValueRecord};
use pin_density::data::table::build_tables;

use crate::cli::{CaseArgs, Command, KdeArgs, PinRangeArgs, SliceCommand};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Aggregate {
            datasets_dir,
            output_dir,
        } => {
            let agg = run_aggregate(
                &datasets_dir,
                &output_dir,
                &config.aggregate,
                config.stats.mode_grid,
            )
            .with_context(|| format!("aggregating {}", datasets_dir.display()))?;
            log::info!(
                "{} value rows, {} statistics rows, {} datasets",
                agg.values.len(),
                agg.stats.len(),
                agg.datasets.len()
            );
            Ok(())
        }
        Command::Convert {
            pins,
            pins_file,
            vtu,
            values_output,
            stats_output,
        } => convert(pins, pins_file.as_deref(), &vtu, &values_output, &stats_output, config),
        Command::Gaps {
            stats,
            dataset,
            max_gap,
        } => gaps(&stats, &dataset, max_gap.unwrap_or(config.gaps.max_gap)),
        Command::Kde(args) => kde(args, config),
        Command::Series {
            stats,
            datasets,
            stat,
            range,
            output,
        } => series(&stats, &datasets, &stat, range, &output),
        Command::Slice(SliceCommand::Radial {
            cases,
            z,
            samples,
            output,
        }) => slice_radial(&cases, z, samples.unwrap_or(config.slice.radial_samples), &output, config),
        Command::Slice(SliceCommand::Axial {
            cases,
            radius,
            samples,
            output,
        }) => slice_axial(&cases, radius, samples.unwrap_or(config.slice.axial_samples), &output, config),
        Command::Decay {
            cases,
            alpha,
            z,
            samples,
            output,
        } => decay(&cases, &alpha, z, samples.unwrap_or(config.slice.decay_samples), &output, config),
        Command::Trend { csv, cutoff, json } => {
            trend(&csv, cutoff.unwrap_or(config.trend.radius_cutoff), json)
        }
    }
}

fn normalized(datasets: &[String]) -> Result<Vec<String>> {
    datasets
        .iter()
        .map(|d| normalize_dataset_name(d).context("Empty dataset identifier provided."))
        .collect()
}

fn pin_range(args: PinRangeArgs) -> PinRange {
    PinRange {
        min: args.pin_min,
        max: args.pin_max,
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn convert(
    pins: Vec<f64>,
    pins_file: Option<&Path>,
    vtu: &Path,
    values_output: &Path,
    stats_output: &Path,
    config: &AppConfig,
) -> Result<()> {
    let pins = match pins_file {
        Some(path) => read_pin_file(path)?,
        None if pins.is_empty() => bail!("no Pin values given"),
        None => pins,
    };

    let mesh = read_mesh(vtu)?;
    let fields = select_density_fields(&mesh.point_data)
        .with_context(|| format!("reading fields of {}", vtu.display()))?;
    let tables = build_tables("", &fields, &pins, config.stats.mode_grid)?;

    write_table(values_output, &tables.merged_values())?;
    write_table(stats_output, &tables.stats)?;

    println!("Saved per-point data with statistics to {}", values_output.display());
    println!("Saved per-pin summary statistics to {}", stats_output.display());
    Ok(())
}

fn gaps(stats: &Path, dataset: &str, max_gap: f64) -> Result<()> {
    let cov = coverage_from_file(stats, dataset, max_gap)?;
    if cov.pins.is_empty() {
        println!("Dataset '{dataset}' contains no Pin entries");
        return Ok(());
    }

    println!("Dataset: {}", cov.dataset);
    println!("Covered Pin count: {}", cov.pins.len());
    println!("Pin values (sorted):");
    println!(
        "{}",
        cov.pins
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    if cov.gaps.is_empty() {
        println!("\nNo Pin gaps wider than {max_gap} W.");
    } else {
        println!("\nGaps (spacing > {max_gap} W):");
        for gap in &cov.gaps {
            println!("  {gap}");
        }
    }
    Ok(())
}

fn kde(args: KdeArgs, config: &AppConfig) -> Result<()> {
    let rows: Vec<ValueRecord> =
        read_table(&args.csv, &["dataset", "pin", "field_name", "value"])?;
    let rows = positive_density_rows(rows);
    if rows.is_empty() {
        bail!("No positive electron-density values available.");
    }

    let grid = config.stats.curve_grid;
    let curves = match args.pin {
        Some(pin) => curves_by_dataset(&rows, &normalized(&args.datasets)?, pin, grid)?,
        None => curves_by_pin(&rows, &args.dataset, pin_range(args.range), grid)?,
    };
    write_table(&args.output, &curves)?;
    log::info!("Saved {} curve points to {}", curves.len(), args.output.display());
    Ok(())
}

fn series(stats: &Path, datasets: &[String], stat: &str, range: PinRangeArgs, output: &Path) -> Result<()> {
    let stat: StatKind = stat.parse()?;
    let datasets = normalized(datasets)?;

    let column = stat.to_string();
    let records: Vec<StatsRecord> = read_table(stats, &["dataset", "pin", column.as_str()])?;
    let points = stat_series(&records, &datasets, stat, pin_range(range))?;
    write_table(output, &points)?;
    log::info!("Saved {} {stat} points to {}", points.len(), output.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Mesh profiles
// ---------------------------------------------------------------------------

fn load_cases(args: &CaseArgs, config: &AppConfig) -> Result<Vec<SliceCase>> {
    select_cases(&args.data_dir, &args.cases, &config.slice.field)
        .with_context(|| format!("loading cases from {}", args.data_dir.display()))
}

/// Fixed height, or the height of the case's density peak.
fn slice_height(case: &SliceCase, fixed: Option<f64>) -> Option<f64> {
    match fixed {
        Some(z) => Some(z),
        None => {
            let z = case.peak_z()?;
            log::info!("  Case {}: z_peak = {z:.6}", case.index);
            Some(z)
        }
    }
}

fn slice_radial(args: &CaseArgs, z: Option<f64>, samples: usize, output: &Path, config: &AppConfig) -> Result<()> {
    let cases = load_cases(args, config)?;
    if z.is_none() {
        log::info!("Auto-selecting z at peak electron density for each case:");
    }

    let mut rows = Vec::new();
    for case in &cases {
        let sliced = slice_height(case, z).and_then(|z| radial_slice(case, z, samples));
        match sliced {
            Some(slice) => rows.extend(slice.rows()),
            None => log::warn!(
                "Case {} skipped (z outside domain or insufficient data)",
                case.index
            ),
        }
    }
    if rows.is_empty() {
        bail!("no cases produced radial data; check z range or selected cases");
    }
    write_table(output, &rows)?;
    log::info!("Saved radial slices to {}", output.display());
    Ok(())
}

fn slice_axial(args: &CaseArgs, radius: f64, samples: usize, output: &Path, config: &AppConfig) -> Result<()> {
    let cases = load_cases(args, config)?;
    log::info!("Sampling along r = {radius:.6}");

    let mut rows = Vec::new();
    for case in &cases {
        match axial_slice(case, radius, samples) {
            Some(slice) => {
                log::info!(
                    "  Case {}: peak at h = {:.3} (z = {:.3})",
                    case.index,
                    slice.h_peak,
                    slice.z_peak
                );
                rows.extend(slice.rows());
            }
            None => log::warn!(
                "Case {} skipped (radius outside domain or insufficient data)",
                case.index
            ),
        }
    }
    if rows.is_empty() {
        bail!("no cases produced axial data; check radius or selected cases");
    }
    write_table(output, &rows)?;
    log::info!("Saved axial slices to {}", output.display());
    Ok(())
}

fn decay(
    args: &CaseArgs,
    alphas: &[f64],
    z: Option<f64>,
    samples: usize,
    output: &Path,
    config: &AppConfig,
) -> Result<()> {
    let alphas = validate_alphas(alphas)?;
    let cases = load_cases(args, config)?;

    let mut rows = Vec::new();
    for case in &cases {
        let Some(slice) = slice_height(case, z).and_then(|z| radial_slice(case, z, samples)) else {
            log::warn!(
                "Case {} skipped (z outside domain or insufficient data)",
                case.index
            );
            continue;
        };
        log::info!("  Case {}: cavity r_max = {:.3}", case.index, case.cavity_radius());
        for row in decay_rows(&slice, &alphas) {
            log::info!("    alpha={:.2}: decay radius = {:.3}", row.alpha, row.decay_radius);
            rows.push(row);
        }
    }
    if rows.is_empty() {
        bail!("no decay radii computed; adjust alpha set or selected cases");
    }
    write_table(output, &rows)?;
    log::info!("Saved decay radii to {}", output.display());
    Ok(())
}

fn trend(csv: &Path, cutoff: f64, json: bool) -> Result<()> {
    let pairs = read_radius_power(csv)?;
    let report = fit_power_law(&pairs, cutoff);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    match report.fit {
        Some(fit) => {
            println!("Log-log linear fit (r < {cutoff}):");
            println!(
                "  log10(P) = {:.6} + {:.6} * log10(r)",
                fit.intercept, fit.slope
            );
            println!("  => P ≈ {:.6e} * r^{:.6}", fit.coeff, fit.slope);
            println!(
                "  r = {:.6}, R^2 = {:.6}, points = {}",
                fit.corr, fit.r_squared, fit.count
            );
        }
        None => println!("Not enough data below r = {cutoff} for a fit ({} points).", report.count),
    }
    Ok(())
}
