//! burnsev CLI - burn-severity mapping from pre/post-fire scenes

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use burnsev_analysis::pipeline::{assess_burn_severity, BurnAnalysisParams};
use burnsev_analysis::severity::SeverityClass;
use burnsev_analysis::zonal::{AggregationParams, DEFAULT_PIXEL_CEILING};
use burnsev_analysis::{indices, mask};
use burnsev_core::io::{read_geotiff, read_scene, write_geotiff};
use burnsev_core::{Raster, Scene};
use geo_types::{Coord, LineString, Polygon};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "burnsev")]
#[command(author, version, about = "Wildfire burn-severity mapping", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Compute a spectral index from a band-per-file scene directory
    Index {
        /// Index name: ndwi, ndvi or nbr
        name: String,
        /// Scene directory containing red.tif, green.tif, nir.tif, swir1.tif, swir2.tif
        scene: PathBuf,
        /// Output file
        output: PathBuf,
    },
    /// Derive a water mask from a scene's NDWI
    WaterMask {
        /// Scene directory
        scene: PathBuf,
        /// Output file
        output: PathBuf,
        /// NDWI threshold above which a pixel is water
        #[arg(short, long, default_value_t = mask::WATER_NDWI_THRESHOLD)]
        threshold: f64,
    },
    /// Run the full pre/post assessment and report per-class statistics
    Assess {
        /// Pre-fire scene directory
        #[arg(long)]
        pre: PathBuf,
        /// Post-fire scene directory
        #[arg(long)]
        post: PathBuf,
        /// AOI as "min_x,min_y,max_x,max_y" in the scene's CRS
        #[arg(long)]
        aoi: String,
        /// Output severity raster
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output dNBR raster
        #[arg(long)]
        dnbr_output: Option<PathBuf>,
        /// NDWI water threshold
        #[arg(long, default_value_t = mask::WATER_NDWI_THRESHOLD)]
        water_threshold: f64,
        /// Ground sample distance in meters
        #[arg(long, default_value_t = 30.0)]
        scale: f64,
        /// Maximum sampled pixels per aggregation
        #[arg(long, default_value_t = DEFAULT_PIXEL_CEILING)]
        pixel_ceiling: u64,
        /// Fail instead of coarsening when over the pixel ceiling
        #[arg(long)]
        no_best_effort: bool,
    },
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

fn load_scene(path: &PathBuf) -> Result<Scene> {
    let pb = spinner("Reading scene...");
    let scene = read_scene(path).context("Failed to read scene")?;
    pb.finish_and_clear();
    info!(
        "Scene {}: {} band(s)",
        path.display(),
        scene.band_count()
    );
    Ok(scene)
}

fn write_f64(raster: &Raster<f64>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn write_u8(raster: &Raster<u8>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// Parse "min_x,min_y,max_x,max_y" into a rectangular AOI polygon
fn parse_aoi(arg: &str) -> Result<Polygon<f64>> {
    let parts: Vec<f64> = arg
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid AOI: {}", arg))?;

    if parts.len() != 4 {
        return Err(anyhow!("AOI must have exactly 4 values, got {}", parts.len()));
    }
    let (min_x, min_y, max_x, max_y) = (parts[0], parts[1], parts[2], parts[3]);
    if min_x >= max_x || min_y >= max_y {
        return Err(anyhow!("AOI is empty: {}", arg));
    }

    Ok(Polygon::new(
        LineString::from(vec![
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: min_y },
            Coord { x: max_x, y: max_y },
            Coord { x: min_x, y: max_y },
            Coord { x: min_x, y: min_y },
        ]),
        vec![],
    ))
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let raster: Raster<f64> = read_geotiff(&input).context("Failed to read raster")?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            println!(
                "Valid cells: {} ({:.1}%)",
                raster.valid_count(),
                100.0 * raster.valid_count() as f64 / raster.len() as f64
            );
        }

        Commands::Index {
            name,
            scene,
            output,
        } => {
            let scene = load_scene(&scene)?;
            let start = Instant::now();
            let result = match name.to_lowercase().as_str() {
                "ndwi" => indices::ndwi(&scene),
                "ndvi" => indices::ndvi(&scene),
                "nbr" => indices::nbr(&scene),
                other => return Err(anyhow!("Unknown index: {}", other)),
            }
            .context("Failed to compute index")?;
            let elapsed = start.elapsed();
            write_f64(&result, &output)?;
            done(&name.to_uppercase(), &output, elapsed);
        }

        Commands::WaterMask {
            scene,
            output,
            threshold,
        } => {
            let scene = load_scene(&scene)?;
            let start = Instant::now();
            let ndwi = indices::ndwi(&scene).context("Failed to compute NDWI")?;
            let result =
                mask::water_mask(&ndwi, threshold).context("Failed to derive water mask")?;
            let elapsed = start.elapsed();
            write_u8(&result, &output)?;
            done("Water mask", &output, elapsed);
        }

        Commands::Assess {
            pre,
            post,
            aoi,
            output,
            dnbr_output,
            water_threshold,
            scale,
            pixel_ceiling,
            no_best_effort,
        } => {
            let pre = load_scene(&pre)?;
            let post = load_scene(&post)?;
            let aoi = parse_aoi(&aoi)?;

            let params = BurnAnalysisParams {
                water_threshold,
                aggregation: AggregationParams {
                    scale,
                    best_effort: !no_best_effort,
                    pixel_ceiling,
                },
            };

            let pb = spinner("Assessing burn severity...");
            let start = Instant::now();
            let result = assess_burn_severity(&pre, &post, &aoi, &params)
                .context("Assessment failed")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            println!("Burn severity over AOI:");
            for class in SeverityClass::ALL {
                let count = result.histogram.count(class.code());
                if count > 0 {
                    println!("  {:>2} {:<14} {:>12} px", class.code(), class.label(), count);
                }
            }

            if result.histogram.is_all_masked() {
                println!("  No valid pixels in the AOI (all masked)");
            } else {
                println!("  Valid pixels: {}", result.histogram.valid_pixels());
                println!("  Burned area:  {:.4} km²", result.burned_area.area_km2);
            }
            if result.histogram.coarsening() > 1 {
                println!(
                    "  Note: sampling coarsened {}x to stay within the pixel ceiling",
                    result.histogram.coarsening()
                );
            }
            println!("  Processing time: {:.2?}", elapsed);

            if let Some(path) = output {
                write_u8(&result.severity, &path)?;
                println!("Severity raster saved to: {}", path.display());
            }
            if let Some(path) = dnbr_output {
                write_f64(&result.dnbr, &path)?;
                println!("dNBR raster saved to: {}", path.display());
            }
        }
    }

    Ok(())
}
