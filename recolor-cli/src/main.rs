//! Seed-point recoloring CLI
//!
//! Blends an image with colors spread from a set of seed points.
//!
//! Run with: `recolor -i photo.jpg -s seeds.json -o out.png`
//!
//! ## Variants
//!
//! - `circles` (default): every pixel within `radius` of a seed takes the
//!   color of its nearest seed, blended by disc coverage and `alpha`.
//! - `cells`: the image is partitioned into seed cells, and the colored cell
//!   layer is composited through the same circle mask.
//!
//! ## YAML config file
//!
//! ```yaml
//! variant: cells
//! radius: 80
//! scale: 2.0
//! alpha: 200
//! seed: 42
//! ```
//!
//! Explicit command-line flags override values from `--config`.

mod seeds;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use recolor_core::{ClippedCells, Params, Pipeline, Recolorer, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
enum VariantArg {
    Circles,
    Cells,
}

impl From<VariantArg> for Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Circles => Variant::Circles,
            VariantArg::Cells => Variant::Cells,
        }
    }
}

/// YAML config file format
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecolorConfig {
    #[serde(default)]
    variant: Option<VariantArg>,
    #[serde(default)]
    radius: Option<f64>,
    #[serde(default)]
    scale: Option<f64>,
    #[serde(default)]
    alpha: Option<u8>,
    #[serde(default)]
    seed: Option<u64>,
}

fn load_config(path: &PathBuf) -> anyhow::Result<RecolorConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {:?}", path))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config file: {:?}", path))
}

#[derive(Parser, Debug)]
#[command(name = "recolor")]
#[command(about = "Recolor an image from seed points", long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Input image path
    #[arg(short, long)]
    input: PathBuf,

    /// Seed records (JSON array)
    #[arg(short, long)]
    seeds: PathBuf,

    /// Output image path (format chosen by extension)
    #[arg(short, long)]
    output: PathBuf,

    /// Overlay variant [default: circles]
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Influence disc radius in pixels [default: 50]
    #[arg(short, long)]
    radius: Option<f64>,

    /// Multiplier applied to seed coordinates [default: 1.0]
    #[arg(long)]
    scale: Option<f64>,

    /// Global overlay alpha, 0-255 [default: 255]
    #[arg(short, long)]
    alpha: Option<u8>,

    /// Random seed for generated seed colors [default: 0]
    #[arg(long)]
    seed: Option<u64>,

    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (0 = Rayon default)
    #[arg(long, default_value = "0")]
    threads: usize,

    /// Process rows on a single thread
    #[arg(long)]
    sequential: bool,
}

/// Parameters after merging CLI flags over the config file
#[derive(Debug, Clone, Copy, PartialEq)]
struct Settings {
    variant: Variant,
    params: Params,
    scale: f64,
    seed: u64,
}

impl Settings {
    fn resolve(args: &Args, config: &RecolorConfig) -> anyhow::Result<Self> {
        let defaults = Params::default();
        let variant = args
            .variant
            .or(config.variant)
            .map(Variant::from)
            .unwrap_or_default();
        let radius = args.radius.or(config.radius).unwrap_or(defaults.radius);
        let global_alpha = args.alpha.or(config.alpha).unwrap_or(defaults.global_alpha);
        let scale = args.scale.or(config.scale).unwrap_or(1.0);
        let seed = args.seed.or(config.seed).unwrap_or(0);

        if !radius.is_finite() || radius <= 0.0 {
            anyhow::bail!("radius must be a positive number, got {}", radius);
        }
        if !scale.is_finite() || scale <= 0.0 {
            anyhow::bail!("scale must be a positive number, got {}", scale);
        }

        Ok(Self {
            variant,
            params: Params { radius, global_alpha },
            scale,
            seed,
        })
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Encode to a sibling temp file, then rename over `output`.
fn save_image(image: &image::RgbaImage, output: &Path) -> anyhow::Result<()> {
    let format = image::ImageFormat::from_path(output)
        .with_context(|| format!("unsupported output format: {:?}", output))?;
    let file_name = output
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("output path has no file name: {:?}", output))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".partial");
    let tmp = output.with_file_name(tmp_name);

    if let Err(e) = image.save_with_format(&tmp, format) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to encode {:?}", output));
    }
    if let Err(e) = std::fs::rename(&tmp, output) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to write output: {:?}", output));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    let config = args
        .config
        .as_ref()
        .map(load_config)
        .transpose()?
        .unwrap_or_default();
    let settings = Settings::resolve(&args, &config)?;

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .context("failed to configure worker threads")?;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    let seeds = seeds::load_seeds(&args.seeds, settings.scale, &mut rng)?;
    tracing::info!(count = seeds.len(), seed = settings.seed, "loaded seeds");

    println!("Loading image: {:?}", args.input);
    let image = image::open(&args.input)
        .with_context(|| format!("failed to open image: {:?}", args.input))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    println!("Image size: {}x{}", width, height);

    let recolorer = if args.sequential {
        println!("Using sequential recolorer");
        Recolorer::sequential()
    } else {
        println!("Using parallel recolorer (Rayon)");
        Recolorer::new()
    };
    let pipeline = Pipeline::new(ClippedCells::new(), recolorer, settings.params);

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    progress.set_message(format!(
        "Recoloring with {} seeds ({:?})",
        seeds.len(),
        settings.variant
    ));
    progress.enable_steady_tick(Duration::from_millis(100));

    let result = pipeline.run(image, &seeds, settings.variant);
    let output = match result {
        Ok(output) => {
            progress.finish_with_message("Recoloring complete");
            output
        }
        Err(e) => {
            progress.abandon_with_message("Recoloring failed");
            return Err(e).context("recoloring failed");
        }
    };

    save_image(&output, &args.output)?;
    println!("Output saved to: {:?}", args.output);
    Ok(())
}
