//! pupil2d CLI: run the pupil detector on single frames.

use clap::{Args, Parser, Subcommand};
use imageproc::rect::Rect;
use std::path::PathBuf;

use pupil2d::{
    DetectionParameters, Detector, DetectorOptions, DetectorState, DrawingSurface, FrameInput,
    Overlays, SearchConfig,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pupil2d")]
#[command(about = "Detect the pupil ellipse in eye-tracking camera frames")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the pupil in one grayscale frame.
    Detect(CliDetectArgs),

    /// Print the default detection parameters as JSON.
    DefaultParams,
}

#[derive(Debug, Clone, Args)]
struct CliDetectArgs {
    /// Path to the input image (converted to 8-bit grayscale).
    #[arg(long)]
    image: PathBuf,

    /// Path to write the detection result (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Detection parameters (JSON). Defaults are used when omitted.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Search region as `x,y,w,h` in pixels. Defaults to the whole frame.
    #[arg(long, value_parser = parse_roi)]
    roi: Option<Rect>,

    /// Tighter region expected to contain the pupil, `x,y,w,h`.
    #[arg(long, value_parser = parse_roi)]
    pupil_roi: Option<Rect>,

    /// Timestamp copied into the result.
    #[arg(long, default_value = "0.0")]
    timestamp: f64,

    /// Detector state (JSON) to resume from; rewritten after detection.
    #[arg(long)]
    state: Option<PathBuf>,

    /// Try the previous strong ellipse before the segment search.
    #[arg(long)]
    warm_start: bool,

    /// Largest number of segments merged into one candidate.
    #[arg(long, default_value = "5")]
    max_depth: usize,

    /// Cap on merge-search evaluations per frame.
    #[arg(long, default_value = "1000")]
    max_evaluations: usize,

    /// Path to write a versioned debug dump (JSON).
    #[arg(long)]
    debug_json: Option<PathBuf>,

    /// Path to write the annotated frame (PNG).
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Path to write the segment / seed / candidate drawing (PNG).
    #[arg(long)]
    debug_overlay: Option<PathBuf>,
}

fn parse_roi(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("expected x,y,w,h, got '{s}'"));
    };
    let x: i32 = x.parse().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y: i32 = y.parse().map_err(|e| format!("bad y '{y}': {e}"))?;
    let w: u32 = w.parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h: u32 = h.parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    if w == 0 || h == 0 {
        return Err("ROI width and height must be positive".to_string());
    }
    Ok(Rect::at(x, y).of_size(w, h))
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::DefaultParams => run_default_params(),
    }
}

// ── default-params ────────────────────────────────────────────────────

fn run_default_params() -> CliResult<()> {
    let json = serde_json::to_string_pretty(&DetectionParameters::default())?;
    println!("{json}");
    Ok(())
}

// ── detect ────────────────────────────────────────────────────────────

fn load_params(args: &CliDetectArgs) -> CliResult<DetectionParameters> {
    let params = match &args.params {
        Some(path) => {
            tracing::info!("Loading parameters: {}", path.display());
            DetectionParameters::from_json_file(path)?
        }
        None => DetectionParameters::default(),
    };
    params.validate()?;
    Ok(params)
}

fn load_state(args: &CliDetectArgs) -> CliResult<DetectorState> {
    match &args.state {
        Some(path) if path.exists() => {
            let data = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&data)?)
        }
        _ => Ok(DetectorState::default()),
    }
}

fn run_detect(args: &CliDetectArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", args.image.display());
    let img = image::open(&args.image)?;
    let gray = img.to_luma8();
    let (w, h) = gray.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let params = load_params(args)?;
    let options = DetectorOptions {
        search: SearchConfig {
            max_depth: args.max_depth,
            max_evaluations: args.max_evaluations,
        },
        warm_start: args.warm_start,
    };
    let mut detector = Detector::with_state(options, load_state(args)?);

    let mut input = FrameInput::full_frame(&gray, args.timestamp);
    if let Some(roi) = args.roi {
        input.user_roi = roi;
        input.pupil_roi = roi;
    }
    if let Some(pupil_roi) = args.pupil_roi {
        input.pupil_roi = pupil_roi;
    }

    let mut color = args.overlay.as_ref().map(|_| img.to_rgb8());
    let mut debug = args
        .debug_overlay
        .as_ref()
        .map(|_| image::RgbImage::new(w, h));
    let overlays = Overlays {
        color: color.as_mut().map(|c| c as &mut dyn DrawingSurface),
        debug: debug.as_mut().map(|d| d as &mut dyn DrawingSurface),
    };

    let result = if let Some(debug_path) = &args.debug_json {
        let (result, dump) = detector.detect_with_debug(&input, &params, overlays);
        std::fs::write(debug_path, serde_json::to_string_pretty(&dump)?)?;
        tracing::info!("Debug dump written to {}", debug_path.display());
        result
    } else {
        detector.detect(&input, &params, overlays)
    };

    match result.ellipse {
        Some(e) => tracing::info!(
            "Pupil at ({:.2}, {:.2}), axes {:.2} x {:.2}, confidence {:.3} ({:?})",
            e.cx,
            e.cy,
            e.major_axis(),
            e.minor_axis(),
            result.confidence,
            result.outcome
        ),
        None => tracing::info!("No pupil found ({:?})", result.outcome),
    }

    std::fs::write(&args.out, serde_json::to_string_pretty(&result)?)?;
    tracing::info!("Results written to {}", args.out.display());

    if let Some(path) = &args.state {
        std::fs::write(path, serde_json::to_string_pretty(detector.state())?)?;
        tracing::info!("State written to {}", path.display());
    }
    if let (Some(path), Some(canvas)) = (&args.overlay, &color) {
        canvas.save(path)?;
        tracing::info!("Overlay written to {}", path.display());
    }
    if let (Some(path), Some(canvas)) = (&args.debug_overlay, &debug) {
        canvas.save(path)?;
        tracing::info!("Debug overlay written to {}", path.display());
    }

    Ok(())
}
