//! TerraStat CLI - Spatial statistics for vector layers

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use terrastat_algorithms::autocorrelation::{
    global_morans_i, local_morans_i, LocalMoranParams, Quadrant,
};
use terrastat_algorithms::correlation::{correlation_matrix, CorrelationMethod};
use terrastat_algorithms::diversity::entropy_index;
use terrastat_algorithms::dummies::dummy_variables;
use terrastat_algorithms::quotient::location_quotient;
use terrastat_algorithms::weights::{build_weights, WeightsMethod};
use terrastat_core::io::{read_geojson, write_geojson};
use terrastat_core::{AttributeValue, FeatureCollection};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "terrastat")]
#[command(author, version, about = "Spatial statistics for vector layers", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a GeoJSON layer
    Info {
        /// Input GeoJSON file
        input: PathBuf,
    },
    /// Global Moran's I spatial autocorrelation
    Moran {
        /// Input GeoJSON file
        input: PathBuf,
        /// Numeric field to analyze
        #[arg(short, long)]
        field: String,
        /// Weights method: queen, rook, knn, distance
        #[arg(short, long, default_value = "queen")]
        method: String,
        /// Neighbor count (knn method only)
        #[arg(short, long, default_value = "1")]
        k: usize,
        /// Distance threshold (distance method only)
        #[arg(short, long)]
        threshold: Option<f64>,
    },
    /// Local Moran's I (LISA) with permutation significance
    LocalMoran {
        /// Input GeoJSON file
        input: PathBuf,
        /// Output GeoJSON file with LMI/LMP/LMQ fields appended
        output: PathBuf,
        /// Numeric field to analyze
        #[arg(short, long)]
        field: String,
        /// Weights method: queen, rook, knn, distance
        #[arg(short, long, default_value = "queen")]
        method: String,
        /// Neighbor count (knn method only)
        #[arg(short, long, default_value = "1")]
        k: usize,
        /// Distance threshold (distance method only)
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Conditional permutations for p-values
        #[arg(short, long, default_value = "999")]
        permutations: usize,
        /// RNG seed; a fixed seed reproduces identical p-values
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Correlation matrix between numeric fields
    Correlation {
        /// Input GeoJSON file
        input: PathBuf,
        /// Fields to correlate (two or more, comma separated)
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        fields: Vec<String>,
        /// Correlation method: pearson, kendall, spearman
        #[arg(short, long, default_value = "pearson")]
        method: String,
    },
    /// Entropy diversity index over a field series
    Entropy {
        /// Input GeoJSON file
        input: PathBuf,
        /// Output GeoJSON file with the entropy field appended
        output: PathBuf,
        /// Field series (two or more, comma separated)
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        fields: Vec<String>,
        /// Name for the entropy field
        #[arg(long, default_value = "Entropy")]
        field_name: String,
    },
    /// Location quotient
    Lq {
        /// Input GeoJSON file
        input: PathBuf,
        /// Output GeoJSON file with the LQ field appended
        output: PathBuf,
        /// Variable x field
        #[arg(short = 'x', long)]
        variable_x: String,
        /// Variable y field
        #[arg(short = 'y', long)]
        variable_y: String,
        /// Name for the LQ field
        #[arg(long, default_value = "LQ")]
        field_name: String,
    },
    /// Dummy variables from a categorical field
    Dummies {
        /// Input GeoJSON file
        input: PathBuf,
        /// Output GeoJSON file with one 0/1 field per category
        output: PathBuf,
        /// Categorical field to expand
        #[arg(short, long)]
        field: String,
        /// Prefix for the dummy fields
        #[arg(short, long, default_value = "Cat")]
        prefix: String,
    },
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let layer = read_layer(&input)?;
            println!("File: {}", input.display());
            println!("Features: {}", layer.len());
            match layer.geometry_kind() {
                Ok(kind) => println!("Geometry: {}", kind.name()),
                Err(e) => println!("Geometry: ({e})"),
            }
            println!("\nFields:");
            for name in layer.field_names() {
                println!("  {}", name);
            }
        }

        // ── Global Moran's I ─────────────────────────────────────────
        Commands::Moran {
            input,
            field,
            method,
            k,
            threshold,
        } => {
            let layer = read_layer(&input)?;
            let method = parse_weights_method(&method, k, threshold)?;
            let start = Instant::now();

            let weights = build_weights(&layer, method)?;
            report_isolates(&weights);
            let values = layer.numeric_column(&field)?;
            let result = global_morans_i(&values, &weights)?;

            println!("===== Moran's I =====");
            println!("Layer: {}", input.display());
            println!("Variable: {}", field);
            println!("Method: {}", describe_method(method));
            println!("Morans-I: {:.5}", result.i);
            println!("Expected Value: {:.5}", result.expected);
            println!("Z-score: {:.5}", result.z_score);
            println!("P-value: {:.5}", result.p_value);
            info!("Processing time: {:.2?}", start.elapsed());
        }

        // ── Local Moran's I ──────────────────────────────────────────
        Commands::LocalMoran {
            input,
            output,
            field,
            method,
            k,
            threshold,
            permutations,
            seed,
        } => {
            let mut layer = read_layer(&input)?;
            let method = parse_weights_method(&method, k, threshold)?;
            let start = Instant::now();

            let weights = build_weights(&layer, method)?;
            report_isolates(&weights);
            let values = layer.numeric_column(&field)?;

            let pb = spinner(&format!("Running {permutations} permutations..."));
            let params = LocalMoranParams { permutations, seed };
            let results = local_morans_i(&values, &weights, params)?;
            pb.finish_and_clear();

            let indices: Vec<f64> = results.iter().map(|r| r.i).collect();
            let p_values: Vec<f64> = results.iter().map(|r| r.p_value).collect();
            let quadrants: Vec<AttributeValue> = results
                .iter()
                .map(|r| match r.quadrant {
                    Some(q) => AttributeValue::Int(q.code()),
                    None => AttributeValue::Null,
                })
                .collect();

            layer.add_numeric_column("LMI", &indices)?;
            layer.add_numeric_column("LMP", &p_values)?;
            layer.add_column("LMQ", quadrants)?;

            write_layer(&layer, &output)?;
            info!("Variable: {} | Method: {}", field, describe_method(method));
            for q in [
                Quadrant::HighHigh,
                Quadrant::LowHigh,
                Quadrant::LowLow,
                Quadrant::HighLow,
            ] {
                let count = results.iter().filter(|r| r.quadrant == Some(q)).count();
                info!("{}: {} features", q.label(), count);
            }
            done("Local Moran's I", &output, start.elapsed());
        }

        // ── Correlation matrix ───────────────────────────────────────
        Commands::Correlation {
            input,
            fields,
            method,
        } => {
            let layer = read_layer(&input)?;
            let method = parse_correlation_method(&method)?;
            let columns: Vec<(String, Vec<f64>)> = fields
                .iter()
                .map(|f| Ok((f.clone(), layer.numeric_column(f)?)))
                .collect::<Result<_>>()?;

            let matrix = correlation_matrix(&columns, method)?;

            println!("===== Correlation Matrix =====");
            println!("Layer: {}", input.display());
            println!("Method: {}", matrix.method().label());
            println!();
            print!("{}", matrix);
        }

        // ── Entropy index ────────────────────────────────────────────
        Commands::Entropy {
            input,
            output,
            fields,
            field_name,
        } => {
            let mut layer = read_layer(&input)?;
            let start = Instant::now();
            let columns: Vec<Vec<f64>> = fields
                .iter()
                .map(|f| layer.numeric_column(f))
                .collect::<terrastat_core::Result<_>>()?;

            let index = entropy_index(&columns)?;
            layer.add_numeric_column(&field_name, &index)?;

            write_layer(&layer, &output)?;
            done("Entropy index", &output, start.elapsed());
        }

        // ── Location quotient ────────────────────────────────────────
        Commands::Lq {
            input,
            output,
            variable_x,
            variable_y,
            field_name,
        } => {
            let mut layer = read_layer(&input)?;
            let start = Instant::now();
            let x = layer.numeric_column(&variable_x)?;
            let y = layer.numeric_column(&variable_y)?;

            let lq = location_quotient(&x, &y)?;
            layer.add_numeric_column(&field_name, &lq)?;

            write_layer(&layer, &output)?;
            info!("Variables: {} / {}", variable_x, variable_y);
            done("Location quotient", &output, start.elapsed());
        }

        // ── Dummy variables ──────────────────────────────────────────
        Commands::Dummies {
            input,
            output,
            field,
            prefix,
        } => {
            let mut layer = read_layer(&input)?;
            let start = Instant::now();
            let categories = layer.string_column(&field)?;

            let encoding = dummy_variables(&categories, &prefix)?;
            encoding.apply_to(&mut layer)?;

            write_layer(&layer, &output)?;
            info!(
                "{} categories expanded from field '{}'",
                encoding.category_count(),
                field
            );
            done("Dummy variables", &output, start.elapsed());
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_layer(path: &PathBuf) -> Result<FeatureCollection> {
    let pb = spinner("Reading layer...");
    let layer = read_geojson(path).context("Failed to read input layer")?;
    pb.finish_and_clear();
    info!("Input: {} features", layer.len());
    Ok(layer)
}

fn write_layer(layer: &FeatureCollection, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geojson(path, layer).context("Failed to write output layer")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_weights_method(name: &str, k: usize, threshold: Option<f64>) -> Result<WeightsMethod> {
    match name.to_lowercase().as_str() {
        "queen" | "q" => Ok(WeightsMethod::Queen),
        "rook" | "r" => Ok(WeightsMethod::Rook),
        "knn" | "k" => Ok(WeightsMethod::Knn { k }),
        "distance" | "band" | "d" => match threshold {
            Some(threshold) => Ok(WeightsMethod::DistanceBand { threshold }),
            None => bail!("the distance method requires --threshold"),
        },
        other => bail!("unknown weights method: {other} (expected queen, rook, knn or distance)"),
    }
}

fn parse_correlation_method(name: &str) -> Result<CorrelationMethod> {
    match name.to_lowercase().as_str() {
        "pearson" => Ok(CorrelationMethod::Pearson),
        "kendall" => Ok(CorrelationMethod::Kendall),
        "spearman" => Ok(CorrelationMethod::Spearman),
        other => bail!("unknown correlation method: {other} (expected pearson, kendall or spearman)"),
    }
}

fn describe_method(method: WeightsMethod) -> String {
    match method {
        WeightsMethod::Queen => "Queen contiguity".to_string(),
        WeightsMethod::Rook => "Rook contiguity".to_string(),
        WeightsMethod::Knn { k } => format!("K Nearest Neighbors, KNN = {k}"),
        WeightsMethod::DistanceBand { threshold } => {
            format!("Distance Band, Fixed Distance = {threshold}")
        }
    }
}

fn report_isolates(weights: &terrastat_algorithms::weights::WeightsGraph) {
    let isolates = weights.isolates();
    if !isolates.is_empty() {
        warn!(
            "{} feature(s) have no neighbors and will carry flagged results",
            isolates.len()
        );
    }
}
