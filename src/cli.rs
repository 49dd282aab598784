use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, global = true, default_value = "pin-density.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Consolidate every dataset under a directory into CSV tables
    Aggregate {
        /// Directory containing dataset folders or standalone VTU files
        #[arg(long, default_value = "datasets")]
        datasets_dir: PathBuf,

        /// Directory where consolidated outputs are written
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,
    },

    /// Convert one VTU file and its Pin sequence into value and statistics tables
    Convert {
        /// Pin values (W) ordered to match the VTU field sequence
        #[arg(value_name = "PIN")]
        pins: Vec<f64>,

        /// Read the Pin values from a file instead
        #[arg(long, conflicts_with = "pins")]
        pins_file: Option<PathBuf>,

        /// Path to the VTU file
        #[arg(long, default_value = "plasma.vtu")]
        vtu: PathBuf,

        /// Per-point values with merged field statistics
        #[arg(long, default_value = "pin_electron_density_table.csv")]
        values_output: PathBuf,

        /// Per-field summary statistics
        #[arg(long, default_value = "pin_electron_density_stats.csv")]
        stats_output: PathBuf,
    },

    /// List covered Pin values of a dataset and highlight gaps
    Gaps {
        #[arg(long, default_value = "data/all_stats.csv")]
        stats: PathBuf,

        #[arg(long, default_value = "ALL")]
        dataset: String,

        /// Report gaps larger than this value (overrides config)
        #[arg(long)]
        max_gap: Option<f64>,
    },

    /// Export log-space KDE curves of electron density
    Kde(KdeArgs),

    /// Extract a per-Pin statistic series for several datasets
    Series {
        #[arg(long, default_value = "data/all_stats.csv")]
        stats: PathBuf,

        /// Datasets to compare (e.g. r2=32 r2=39)
        #[arg(long, num_args = 1.., required = true)]
        datasets: Vec<String>,

        /// mode, min or max
        #[arg(long, default_value = "mode")]
        stat: String,

        #[command(flatten)]
        range: PinRangeArgs,

        #[arg(long, default_value = "stat_series.csv")]
        output: PathBuf,
    },

    /// Sample density profiles from mesh cases
    #[command(subcommand)]
    Slice(SliceCommand),

    /// Radius where the radial density falls to alpha × peak, per case
    Decay {
        #[command(flatten)]
        cases: CaseArgs,

        /// Fractions of the peak density (0 < alpha < 1)
        #[arg(long, num_args = 1.., default_values_t = [0.5])]
        alpha: Vec<f64>,

        /// Fixed axial coordinate; per-case peak density height if omitted
        #[arg(long)]
        z: Option<f64>,

        /// Radial samples per case (overrides config)
        #[arg(long)]
        samples: Option<usize>,

        #[arg(long, default_value = "decay_radius.csv")]
        output: PathBuf,
    },

    /// Log-log power vs. radius fit below a radius cutoff
    Trend {
        /// CSV with radius in the first column and power in the second
        #[arg(long)]
        csv: PathBuf,

        /// Radius cutoff (overrides config)
        #[arg(long)]
        cutoff: Option<f64>,

        /// Print the fit as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct KdeArgs {
    /// Concatenated point values
    #[arg(long, default_value = "data/all_values.csv")]
    pub csv: PathBuf,

    /// Dataset whose Pins are plotted (ALL for every dataset)
    #[arg(long, default_value = "ALL")]
    pub dataset: String,

    #[command(flatten)]
    pub range: PinRangeArgs,

    /// Compare datasets at this single Pin instead
    #[arg(long, requires = "datasets")]
    pub pin: Option<f64>,

    /// Datasets compared at --pin
    #[arg(long, num_args = 1..)]
    pub datasets: Vec<String>,

    #[arg(long, default_value = "kde_curves.csv")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PinRangeArgs {
    /// Minimum Pin value (inclusive)
    #[arg(long)]
    pub pin_min: Option<f64>,

    /// Maximum Pin value (inclusive)
    #[arg(long)]
    pub pin_max: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct CaseArgs {
    /// Directory containing *(<n>).vtu case files
    #[arg(long, default_value = "cases")]
    pub data_dir: PathBuf,

    /// Subset of case numbers (e.g. 2 5 9); all if omitted
    #[arg(long, num_args = 1..)]
    pub cases: Vec<u32>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SliceCommand {
    /// Density vs. radius at a fixed height
    Radial {
        #[command(flatten)]
        cases: CaseArgs,

        /// Fixed axial coordinate; per-case peak density height if omitted
        #[arg(long)]
        z: Option<f64>,

        #[arg(long)]
        samples: Option<usize>,

        #[arg(long, default_value = "radial_slice.csv")]
        output: PathBuf,
    },

    /// Density vs. height along a fixed radius
    Axial {
        #[command(flatten)]
        cases: CaseArgs,

        #[arg(long, default_value_t = 0.0)]
        radius: f64,

        #[arg(long)]
        samples: Option<usize>,

        #[arg(long, default_value = "axis_slice.csv")]
        output: PathBuf,
    },
}
