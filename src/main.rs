use anyhow::{Context, Result};
use glyph_segmenter::observability;
use glyph_segmenter::output::{OutputWorkspace, DEFAULT_PREFIX};
use glyph_segmenter::{GlyphSegmenter, Raster, SegmentationConfig};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const USAGE: &str = "usage: glyph-segmenter <input-image> [output-dir] [config.json]";

/// Command line arguments, positional only
#[derive(Debug)]
struct Args {
    input: PathBuf,
    output_dir: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args_os().skip(1);
    let input = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("missing input image\n{}", USAGE))?;
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let config = args.next().map(PathBuf::from);
    if args.next().is_some() {
        return Err(anyhow::anyhow!("too many arguments\n{}", USAGE));
    }
    Ok(Args {
        input,
        output_dir,
        config,
    })
}

/// Config file when given, `GLYPH_*` environment overrides otherwise
fn load_config(args: &Args) -> Result<SegmentationConfig> {
    let mut config = match &args.config {
        Some(path) => SegmentationConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SegmentationConfig::from_env().context("Invalid GLYPH_* environment configuration")?,
    };

    if env::var("GLYPH_DEBUG_MASKS").map(|v| v == "true").unwrap_or(false) {
        config.keep_intermediates = true;
    }
    Ok(config)
}

fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    observability::init_tracing()?;

    let args = parse_args()?;
    let config = load_config(&args)?;
    let segmenter = GlyphSegmenter::new(config).context("Segmentation configuration rejected")?;

    let image = image::open(&args.input)
        .with_context(|| format!("Failed to load image {}", args.input.display()))?;
    let source = Raster::from_dynamic_image(&image);
    info!(
        input = %args.input.display(),
        width = source.width(),
        height = source.height(),
        channels = source.channels(),
        "Source image loaded"
    );

    let written = segment_into(&segmenter, &source, &args.output_dir)?;
    if written.is_empty() {
        warn!("No glyphs found in {}", args.input.display());
    }
    Ok(())
}

/// Segments `source` and writes its crops into `output_dir`.
fn segment_into(segmenter: &GlyphSegmenter, source: &Raster, output_dir: &Path) -> Result<Vec<PathBuf>> {
    // Stale crops go first so a failed run leaves none behind
    let (workspace, removed) = OutputWorkspace::prepare(output_dir, DEFAULT_PREFIX)?;
    if removed > 0 {
        info!(removed, "Deleted crops from a previous run");
    }

    let outcome = segmenter.segment(source)?;
    if !outcome.intermediates.is_empty() {
        workspace.write_debug_masks(&outcome.intermediates)?;
    }

    let written = workspace.write_glyphs(&outcome.glyphs)?;
    for (glyph, path) in outcome.glyphs.iter().zip(&written) {
        info!(
            index = glyph.index,
            x = glyph.bbox.x,
            y = glyph.bbox.y,
            width = glyph.bbox.width,
            height = glyph.bbox.height,
            path = %path.display(),
            "Glyph saved"
        );
    }

    info!(
        glyphs = written.len(),
        processing_time_ms = outcome.processing_time_ms,
        "Segmentation finished"
    );
    Ok(written)
}
