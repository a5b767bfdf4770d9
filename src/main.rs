use anyhow::{Context, Result};
use chromakey_router_rs::chroma_pipeline::{
    Background, Bgra, ChromaKeyPipeline, Metric, PipelineConfig, PipelineConfigBuilder, SinkFormat,
};
use chromakey_router_rs::logger;

use tracing::{error, info};

const DEFAULT_WIDTH: usize = 720;
const DEFAULT_HEIGHT: usize = 480;
const DEFAULT_MAX_THRESHOLD: u8 = 96;

fn print_usage(program: &str) {
    eprintln!("Chroma-key router: raw BGRA frames on stdin, keyed stream on stdout");
    eprintln!();
    eprintln!("Usage: {} [WIDTH HEIGHT] [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --fps <N>             Output frame rate (default: 25)");
    eprintln!("  --metric <NAME>       max-channel, max-channel-alpha, ycbcr, rgb, luma, redmean, hsv, hsv-full");
    eprintln!("  --key <COLOR>         Key color, #RRGGBB or r,g,b (default: #00FF00)");
    eprintln!("  --min <N>             Lower threshold 0-255");
    eprintln!("  --mid <N>             Middle threshold 0-255 (requires --min)");
    eprintln!("  --max <N>             Upper threshold 0-255 (default: 96)");
    eprintln!("  --full-mask           Recolor keyed pixels toward --substitute");
    eprintln!("  --substitute <COLOR>  Substitute color for --full-mask");
    eprintln!("  --background <COLOR>  Opaque color behind keyed pixels (default: black)");
    eprintln!("  --format <FMT>        rgb24 or bgra32 (default: rgb24)");
    eprintln!("  --no-key              Pass frames through without keying");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  ffmpeg ... -f rawvideo -pix_fmt bgra - | {} 1280 720 --metric ycbcr --min 8 --max 64 | ...", program);
}

fn main() -> Result<()> {
    logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("chromakey_router_rs");
    let options = match parse_options(&args[1.min(args.len())..]) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage(program);
            return Ok(());
        }
        Err(e) => {
            print_usage(program);
            return Err(e);
        }
    };

    let config = options.config.build().context("Invalid pipeline configuration")?;

    info!("Starting chromakey router...");
    info!("Input: {}x{} BGRA on stdin", options.width, options.height);
    info!("Classifier: {}", config.classifier.metric.name());
    info!("Key color: {}", config.classifier.key_color.color());
    info!("Thresholds: {:?}", config.classifier.thresholds);
    info!("Output: {:?} at {} fps", config.output_format, config.target_fps);

    let pipeline = ChromaKeyPipeline::stdio(options.width, options.height, config)
        .context("Failed to set up pipeline")?;

    match pipeline.run() {
        Ok(report) => {
            info!(
                "Stream finished after {:.2?}: {} frames captured, {} delivered",
                report.elapsed, report.counters.frames_captured, report.counters.frames_processed
            );
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}

struct Options {
    width: usize,
    height: usize,
    config: PipelineConfigBuilder,
}

/// Returns `None` when help was requested.
fn parse_options(args: &[String]) -> Result<Option<Options>> {
    let mut width = DEFAULT_WIDTH;
    let mut height = DEFAULT_HEIGHT;
    let mut min = None;
    let mut mid = None;
    let mut max = None;
    let mut config = PipelineConfig::builder();

    let mut i = 0;
    if let (Some(w), Some(h)) = (args.first(), args.get(1)) {
        if !w.starts_with("--") {
            width = w.parse().context("Invalid frame width")?;
            height = h.parse().context("Invalid frame height")?;
            i = 2;
        }
    }

    while i < args.len() {
        let flag = args[i].as_str();
        let value = || {
            args.get(i + 1)
                .map(String::as_str)
                .with_context(|| format!("{} requires a value", flag))
        };
        match flag {
            "--help" | "-h" => return Ok(None),
            "--full-mask" => {
                config = config.full_mask(true);
                i += 1;
                continue;
            }
            "--no-key" => {
                config = config.chroma_key_enabled(false);
                i += 1;
                continue;
            }
            "--fps" => {
                config = config.target_fps(value()?.parse().context("Invalid frame rate")?);
            }
            "--metric" => {
                let metric: Metric = value()?.parse().context("Invalid classifier name")?;
                config = config.metric(metric);
            }
            "--key" => {
                let color: Bgra = value()?.parse().context("Invalid key color")?;
                config = config.key_color(color);
            }
            "--min" => min = Some(value()?.parse::<u8>().context("Invalid --min threshold")?),
            "--mid" => mid = Some(value()?.parse::<u8>().context("Invalid --mid threshold")?),
            "--max" => max = Some(value()?.parse::<u8>().context("Invalid --max threshold")?),
            "--substitute" => {
                let color: Bgra = value()?.parse().context("Invalid substitute color")?;
                config = config.substitute_color(Some(color));
            }
            "--background" => {
                let color: Bgra = value()?.parse().context("Invalid background color")?;
                config = config.background(Background::Color(color));
            }
            "--format" => {
                let format: SinkFormat = value()?.parse().context("Invalid output format")?;
                config = config.output_format(format);
            }
            other => return Err(anyhow::anyhow!("Unknown option: {}", other)),
        }
        i += 2;
    }

    if min.is_some() || mid.is_some() || max.is_some() {
        config = config.thresholds(min, mid, max.unwrap_or(DEFAULT_MAX_THRESHOLD));
    }

    Ok(Some(Options {
        width,
        height,
        config,
    }))
}
