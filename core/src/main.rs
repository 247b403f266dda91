//! SPHERCONV: converted-measurement Jacobians from the command line.
//!
//! The geometry (transmitter, receiver, receiver rotation, angle and range conventions) is taken
//! either from a configuration file (TOML/JSON/YAML) or from command-line flags, and is then used
//! to evaluate the Jacobian at a single measurement (`eval`) or at every row of a CSV file
//! (`batch`).
use clap::{ArgAction, Args, Parser, Subcommand};
use log::{error, info};
use spherconv::batch::{JacobianRecord, MeasurementRecord, compute_jacobians};
use spherconv::config::GeometryConfig;
use spherconv::linearize::spher_conv_jacobian;
use spherconv::{Geometry, SphericalMeasurement};
use std::error::Error;
use std::path::PathBuf;

const LONG_ABOUT: &str = "SPHERCONV: Jacobians of monostatic and bistatic spherical measurements.

Given a spherical measurement (range, azimuth, elevation) taken by a receiver whose transmitter may be elsewhere, this program computes the 3x3 Jacobian of the measurement with respect to the Cartesian target position. Rows are range, azimuth and elevation; columns are x, y and z.

The measurement geometry can be given either by:
  1. A configuration file (TOML/JSON/YAML) passed with --config
  2. The --system-type, --half-range/--full-range, --tx, --rx and --rotation flags

When no transmitter or receiver is given the sensor is monostatic at the origin and ranges are one-way. Angles are in radians. The rotation matrix takes the global axes to the receiver's local axes and is given as 9 values in column-major order.";

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about = "Jacobians of monostatic and bistatic spherical measurements.", long_about = LONG_ABOUT)]
struct Cli {
    /// Geometry configuration file (TOML/JSON/YAML). Overrides the geometry flags.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Geometry given on the command line
    #[command(flatten)]
    geometry: GeometryArgs,

    /// Command to execute
    #[command(subcommand)]
    command: Command,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: log::LevelFilter,

    /// Log file path (if not specified, logs to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Args, Clone, Debug, Default)]
struct GeometryArgs {
    /// Angle convention: 0 = azimuth in the x-y plane from x, 1 = azimuth in the z-x plane from z
    #[arg(long, global = true)]
    system_type: Option<i64>,

    /// Ranges are one-way, half the bistatic path (default when no site is given)
    #[arg(long, global = true, action = ArgAction::SetTrue, conflicts_with = "full_range")]
    half_range: bool,

    /// Ranges are the full transmitter-target-receiver path (default when a site is given)
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    full_range: bool,

    /// Transmitter location x,y,z
    #[arg(long, global = true, value_delimiter = ',', allow_hyphen_values = true)]
    tx: Option<Vec<f64>>,

    /// Receiver location x,y,z
    #[arg(long, global = true, value_delimiter = ',', allow_hyphen_values = true)]
    rx: Option<Vec<f64>>,

    /// Global-to-local rotation matrix, 9 comma-separated values in column-major order
    #[arg(long, global = true, value_delimiter = ',', allow_hyphen_values = true)]
    rotation: Option<Vec<f64>>,
}

impl GeometryArgs {
    /// Range convention chosen on the command line, if any.
    fn use_half_range(&self) -> Option<bool> {
        match (self.half_range, self.full_range) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Top-level commands
#[derive(Subcommand, Clone)]
enum Command {
    #[command(
        name = "eval",
        about = "Evaluate the Jacobian at a single measurement",
        long_about = "Evaluate the converted-measurement Jacobian at a single spherical measurement given as range,azimuth,elevation and print it to stdout."
    )]
    Eval(EvalArgs),
    #[command(
        name = "batch",
        about = "Evaluate the Jacobian for every row of a CSV file",
        long_about = "Read a CSV file with range,azimuth,elevation columns, evaluate the Jacobian for every row against the same geometry and write the measurements together with the Jacobian entries j00..j22 (row-major) to a new CSV file."
    )]
    Batch(BatchArgs),
    #[command(
        name = "config",
        about = "Write the resolved geometry to a configuration file"
    )]
    CreateConfig(CreateConfigArgs),
}

#[derive(Args, Clone, Debug)]
struct EvalArgs {
    /// Spherical measurement range,azimuth,elevation
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    point: Vec<f64>,
    /// Print the Jacobian as a JSON array of rows
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone, Debug)]
struct BatchArgs {
    /// Input CSV file path
    #[arg(short, long, value_parser)]
    input: PathBuf,
    /// Output CSV file path
    #[arg(short, long, value_parser)]
    output: PathBuf,
}

#[derive(Args, Clone, Debug)]
struct CreateConfigArgs {
    /// Output configuration file path (.toml, .json, .yaml or .yml)
    #[arg(short, long, value_parser)]
    output: PathBuf,
}

/// Route log records to stderr, or append them to `log_file` when one is given.
///
/// Records carry a local timestamp and the emitting module, e.g.
/// `2025-01-01 12:00:00.000 [WARN] spherconv::batch - ...`.
fn init_logger(level: log::LevelFilter, log_file: Option<&PathBuf>) -> Result<(), Box<dyn Error>> {
    use std::io::Write;

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(log_path) = log_file {
        if let Some(parent) = log_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let target = Box::new(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?,
        );
        builder.target(env_logger::Target::Pipe(target));
    }

    builder.try_init()?;
    Ok(())
}

/// Build the geometry from the configuration file if one is given, otherwise from the flags.
fn resolve_geometry(
    config: Option<&PathBuf>,
    args: &GeometryArgs,
) -> Result<Geometry, Box<dyn Error>> {
    let geometry = match config {
        Some(path) => {
            info!("Loading geometry from {}", path.display());
            GeometryConfig::from_file(path)?.geometry()?
        }
        None => Geometry::from_parts(
            args.system_type,
            args.use_half_range(),
            args.tx.as_deref(),
            args.rx.as_deref(),
            args.rotation.as_deref(),
        )?,
    };
    info!("Using {}", geometry);
    Ok(geometry)
}

fn format_jacobian(
    jacobian: &nalgebra::Matrix3<f64>,
    as_json: bool,
) -> Result<String, Box<dyn Error>> {
    let rows: Vec<[f64; 3]> = jacobian
        .row_iter()
        .map(|row| [row[0], row[1], row[2]])
        .collect();
    if as_json {
        return Ok(serde_json::to_string_pretty(&rows)?);
    }
    Ok(rows
        .iter()
        .map(|row| format!("{:>16.8e} {:>16.8e} {:>16.8e}", row[0], row[1], row[2]))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn run_eval(args: &EvalArgs, geometry: &Geometry) -> Result<(), Box<dyn Error>> {
    let measurement = SphericalMeasurement::try_from(args.point.as_slice())?;
    info!("Evaluating Jacobian at {}", measurement);
    let jacobian = spher_conv_jacobian(&measurement, geometry);
    println!("{}", format_jacobian(&jacobian, args.json)?);
    Ok(())
}

fn run_batch(args: &BatchArgs, geometry: &Geometry) -> Result<(), Box<dyn Error>> {
    info!("Reading measurements from {}", args.input.display());
    let records = MeasurementRecord::from_csv(&args.input)?;
    let results = compute_jacobians(&records, geometry);
    JacobianRecord::to_csv(&results, &args.output)?;
    info!(
        "Wrote {} Jacobians to {}",
        results.len(),
        args.output.display()
    );
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let geometry = resolve_geometry(cli.config.as_ref(), &cli.geometry)?;
    match &cli.command {
        Command::Eval(args) => run_eval(args, &geometry),
        Command::Batch(args) => run_batch(args, &geometry),
        Command::CreateConfig(args) => {
            GeometryConfig::from(&geometry).to_file(&args.output)?;
            info!("Wrote configuration to {}", args.output.display());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logger(cli.log_level, cli.log_file.as_ref()) {
        eprintln!("Failed to initialize logger: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
