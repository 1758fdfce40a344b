//! huctrend CLI - annual Landsat composites and sub-watershed tables

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use huctrend_algorithms::composite::{make_annual, AnnualParams, ArchiveSet, SeasonWindow};
use huctrend_algorithms::statistics::{zonal_means, ZonalParams};
use huctrend_core::io::write_band_geotiff_to_buffer;
use huctrend_core::Image;
use huctrend_export::{
    plan_requests, write_stats_csv, BatchRunner, BoundarySource, Catalog, DryRunSink,
    ExportSink, LocalCsvSink, WatershedRecord, YearRange,
};
use huctrend_parallel::ProcessingMode;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "huctrend")]
#[command(author, version, about = "Annual Landsat composites summarized by watershed", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Watershed catalog JSON (defaults to the built-in Colorado River catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the watersheds of the catalog
    Catalog {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the export names of a watershed without computing anything
    DryRun {
        /// Watershed index or name (all watersheds when omitted)
        watershed: Option<String>,
        #[command(flatten)]
        years: YearArgs,
        /// Bucket or directory name of the exports
        #[arg(short, long, default_value = "huc-trends")]
        destination: String,
    },
    /// Build one annual composite and write its bands as GeoTIFFs
    Composite {
        /// Watershed index or name
        watershed: String,
        /// Composite year
        year: i32,
        #[command(flatten)]
        inputs: Inputs,
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Zonal means of one annual composite over the sub-watersheds
    Stats {
        /// Watershed index or name
        watershed: String,
        /// Composite year
        year: i32,
        #[command(flatten)]
        inputs: Inputs,
        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Composite, reduce and export every year of one or all watersheds
    Export {
        /// Watershed index or name (all watersheds when omitted)
        watershed: Option<String>,
        #[command(flatten)]
        inputs: Inputs,
        #[command(flatten)]
        years: YearArgs,
        /// Root directory the CSV files are written under
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Bucket or directory name of the exports
        #[arg(short, long, default_value = "huc-trends")]
        destination: String,
        /// Worker threads for the year loop (1 = sequential, default: all cores)
        #[arg(short, long)]
        threads: Option<usize>,
        /// Write the files; without this flag tables are computed and discarded
        #[arg(long)]
        execute: bool,
    },
}

/// Scene manifest, boundary layers and pipeline settings
#[derive(Args)]
struct Inputs {
    /// Scene manifest JSON
    #[arg(short, long)]
    manifest: PathBuf,
    /// HUC6 basin boundaries (GeoJSON)
    #[arg(long)]
    huc6: PathBuf,
    /// HUC12 sub-watershed boundaries (GeoJSON)
    #[arg(long)]
    huc12: PathBuf,
    /// First month of the season window
    #[arg(long, default_value = "5")]
    start_month: u32,
    /// Last month of the season window
    #[arg(long, default_value = "9")]
    end_month: u32,
    /// Sampling scale of the zonal means, in map units
    #[arg(long, default_value = "30")]
    scale: f64,
    /// Strips per zone for the zonal reduction
    #[arg(long, default_value = "4")]
    tile_scale: usize,
}

#[derive(Args)]
struct YearArgs {
    /// First year
    #[arg(long, default_value = "1985")]
    first: i32,
    /// Last year
    #[arg(long, default_value = "2020")]
    last: i32,
}

impl YearArgs {
    fn range(&self) -> Result<YearRange> {
        YearRange::new(self.first, self.last).context("Invalid year range")
    }
}

impl Inputs {
    fn annual_params(&self) -> Result<AnnualParams> {
        let season = SeasonWindow::new(self.start_month, self.end_month)
            .context("Invalid season window")?;
        Ok(AnnualParams {
            season,
            ..AnnualParams::default()
        })
    }

    fn zonal_params(&self) -> ZonalParams {
        ZonalParams {
            scale: self.scale,
            tile_scale: self.tile_scale,
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn progress(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg} [{elapsed_precise}]")
    {
        pb.set_style(style);
    }
    pb
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("Failed to read catalog {}", path.display())),
        None => Catalog::colorado_river().context("Built-in catalog is invalid"),
    }
}

fn pick<'a>(catalog: &'a Catalog, key: Option<&str>) -> Result<Vec<&'a WatershedRecord>> {
    catalog.select(key).context("Failed to select watershed")
}

fn load_archives(path: &Path) -> Result<ArchiveSet> {
    let pb = spinner("Reading scene manifest...");
    let archives = ArchiveSet::from_manifest_file(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    pb.finish_and_clear();
    info!("Scenes: {} in {} archives", archives.scene_count(), archives.len());
    Ok(archives)
}

fn load_boundaries(inputs: &Inputs) -> Result<BoundarySource> {
    let pb = spinner("Reading boundaries...");
    let boundaries = BoundarySource::from_geojson_files(&inputs.huc6, &inputs.huc12)
        .context("Failed to read boundaries")?;
    pb.finish_and_clear();
    info!(
        "Boundaries: {} basins, {} sub-watersheds",
        boundaries.basins.len(),
        boundaries.sub_watersheds.len()
    );
    Ok(boundaries)
}

fn composite_for(
    inputs: &Inputs,
    boundaries: &BoundarySource,
    record: &WatershedRecord,
    year: i32,
) -> Result<Image> {
    let archives = load_archives(&inputs.manifest)?;
    let basin = boundaries.basin(record)?;
    let pb = spinner(&format!("Compositing {} {}...", record.name, year));
    let image = make_annual(&archives, basin, year, &inputs.annual_params()?)
        .context("Failed to build annual composite")?;
    pb.finish_and_clear();
    Ok(image)
}

fn write_bands(image: &Image, dir: &Path, prefix: &str) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let pb = spinner("Writing bands...");
    for (name, band) in image.bands() {
        let path = dir.join(format!("{}_{}.tif", prefix, name));
        let bytes = write_band_geotiff_to_buffer(band).context("Failed to encode band")?;
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let catalog = load_catalog(cli.catalog.as_ref())?;

    match cli.command {
        // ── Catalog ──────────────────────────────────────────────────
        Commands::Catalog { json } => {
            if json {
                println!("{}", catalog.to_json_string()?);
            } else {
                for (i, r) in catalog.iter().enumerate() {
                    println!(
                        "{:>3}  {:<24} {}  [{}, {})  {}",
                        i,
                        r.name,
                        r.huc6,
                        r.huc12.lower(),
                        r.huc12.upper(),
                        r.region
                    );
                }
            }
        }

        // ── Dry run ──────────────────────────────────────────────────
        Commands::DryRun {
            watershed,
            years,
            destination,
        } => {
            let years = years.range()?;
            for record in pick(&catalog, watershed.as_deref())? {
                for request in plan_requests(record, &years, &destination) {
                    println!("{}", request.description);
                    println!("{}", request.file_name_prefix);
                }
            }
        }

        // ── Composite ────────────────────────────────────────────────
        Commands::Composite {
            watershed,
            year,
            inputs,
            output,
        } => {
            let record = catalog
                .find(&watershed)
                .with_context(|| format!("Unknown watershed '{}'", watershed))?;
            let boundaries = load_boundaries(&inputs)?;
            let start = Instant::now();
            let image = composite_for(&inputs, &boundaries, record, year)?;
            let elapsed = start.elapsed();
            info!(
                "Composite: {} x {}, {} valid pixels",
                image.cols(),
                image.rows(),
                image.valid_pixel_count()
            );
            let prefix = format!("{}{:04}", record.file_name_prefix, year);
            write_bands(&image, &output, &prefix)?;
            done("Composite", &output, elapsed);
        }

        // ── Stats ────────────────────────────────────────────────────
        Commands::Stats {
            watershed,
            year,
            inputs,
            output,
        } => {
            let record = catalog
                .find(&watershed)
                .with_context(|| format!("Unknown watershed '{}'", watershed))?;
            let boundaries = load_boundaries(&inputs)?;
            let start = Instant::now();
            let image = composite_for(&inputs, &boundaries, record, year)?;
            let zones = boundaries.sub_watersheds(record);
            let table = zonal_means(&image, &zones, &inputs.zonal_params())
                .context("Failed to compute zonal means")?;
            let elapsed = start.elapsed();
            match output {
                Some(path) => {
                    let file = fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_stats_csv(&table, io::BufWriter::new(file))
                        .context("Failed to write table")?;
                    done("Table", &path, elapsed);
                }
                None => {
                    write_stats_csv(&table, io::stdout().lock()).context("Failed to write table")?
                }
            }
        }

        // ── Export ───────────────────────────────────────────────────
        Commands::Export {
            watershed,
            inputs,
            years,
            output,
            destination,
            threads,
            execute,
        } => {
            let years = years.range()?;
            let records = pick(&catalog, watershed.as_deref())?;
            let archives = load_archives(&inputs.manifest)?;
            let boundaries = load_boundaries(&inputs)?;

            let local = LocalCsvSink::new(&output);
            let dry = DryRunSink::new();
            let sink: &dyn ExportSink = if execute { &local } else { &dry };
            if !execute {
                info!("Dry run: tables are computed but not written (use --execute)");
            }

            let runner = BatchRunner::new(&archives, &boundaries, sink)
                .destination(destination)
                .years(years)
                .mode(ProcessingMode::from_threads(threads))
                .annual_params(inputs.annual_params()?)
                .zonal_params(inputs.zonal_params());

            let start = Instant::now();
            let pb = progress((records.len() * years.len()) as u64);
            let mut exported = 0;
            for record in records {
                pb.set_message(record.name.clone());
                let receipts = runner
                    .run_with_progress(record, |_| pb.inc(1))
                    .with_context(|| format!("Failed to export {}", record.name))?;
                exported += receipts.len();
            }
            pb.finish_and_clear();

            let elapsed = start.elapsed();
            if execute {
                println!("{} tables saved under: {}", exported, output.display());
            } else {
                println!("{} tables computed (dry run)", exported);
            }
            println!("  Processing time: {:.2?}", elapsed);
        }
    }

    Ok(())
}
