use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use pdf_hebrew_overlay::geometry::FrontendRect;
use pdf_hebrew_overlay::{
    LogoImage, LogoSpec, MockTranslator, OverlayWarning, Rectangle, TranslateOptions,
    detect_rectangles, extract_rectangles, process_document, translate::translate_rectangles,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2hebrew",
    version,
    about = "Detect, translate and overlay right-side text blocks in PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect text blocks on the right half of each page.
    Detect(DetectArgs),
    /// Extract the text under previously detected or edited rectangles.
    Extract(ExtractArgs),
    /// Translate extracted rectangles with the built-in mock translator.
    Translate(TranslateArgs),
    /// Run the full detect/extract/translate/render cycle.
    Process(ProcessArgs),
}

#[derive(Debug, Args)]
struct DetectArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output JSON path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Rectangles JSON produced by `detect` (possibly edited).
    #[arg(short, long)]
    rectangles: PathBuf,

    /// Output JSON path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct TranslateArgs {
    /// Extracted rectangles JSON produced by `extract`.
    #[arg(short, long)]
    rectangles: PathBuf,

    /// Output JSON path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum delay between translation calls, in milliseconds.
    #[arg(long, default_value_t = 500)]
    throttle_ms: u64,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ProcessArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF path.
    #[arg(short, long)]
    output: PathBuf,

    /// JPEG logo stamped onto every page.
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Explicit logo placement in frontend units, format x,y,w,h.
    /// Defaults to the top-right corner.
    #[arg(long = "logo-box", requires = "logo")]
    logo_box: Option<String>,

    /// Minimum delay between translation calls, in milliseconds.
    #[arg(long, default_value_t = 500)]
    throttle_ms: u64,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_logo_box(spec: &str) -> Result<FrontendRect> {
    let parts = spec.split(',').map(str::trim).collect::<Vec<_>>();
    if parts.len() != 4 {
        anyhow::bail!("invalid --logo-box '{spec}', expected exactly 4 coordinates");
    }

    let mut values = [0.0_f32; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| anyhow!("invalid --logo-box coordinate: '{part}'"))?;
    }

    if values[2] <= 0.0 || values[3] <= 0.0 {
        anyhow::bail!("--logo-box requires positive width and height");
    }

    Ok(FrontendRect {
        x: values[0],
        y: values[1],
        width: values[2],
        height: values[3],
    })
}

fn load_logo(args: &ProcessArgs) -> Result<Option<LogoSpec>> {
    let Some(path) = &args.logo else {
        return Ok(None);
    };

    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read logo '{}'", path.display()))?;
    let image = LogoImage::from_jpeg(bytes)
        .with_context(|| format!("failed to parse logo '{}'", path.display()))?;

    let placement = args
        .logo_box
        .as_deref()
        .map(parse_logo_box)
        .transpose()
        .context("failed to parse --logo-box")?;

    Ok(Some(LogoSpec { image, placement }))
}

fn read_rectangles(path: &Path) -> Result<Vec<Rectangle>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rectangles from '{}'", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("invalid rectangles JSON in '{}'", path.display()))
}

fn write_rectangles(rectangles: &[Rectangle], output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(rectangles)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn log_warnings(warnings: &[OverlayWarning], verbose: bool) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", warnings.len());
    if verbose {
        for warning in warnings {
            eprintln!(
                "  - {:?} page={:?} rect={:?}: {}",
                warning.code, warning.page, warning.rect_id, warning.message
            );
        }
    }
}

fn run_detect(args: &DetectArgs) -> Result<usize> {
    let pdf_bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let (rectangles, report) = detect_rectangles(&pdf_bytes)
        .with_context(|| format!("failed to detect blocks in '{}'", args.input.display()))?;

    write_rectangles(&rectangles, args.output.as_deref())?;
    log_warnings(&report.warnings, args.verbose);
    Ok(report.rectangle_count)
}

fn run_extract(args: &ExtractArgs) -> Result<()> {
    let pdf_bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let rectangles = read_rectangles(&args.rectangles)?;
    let (extracted, warnings) = extract_rectangles(&pdf_bytes, &rectangles)
        .with_context(|| format!("failed to extract text from '{}'", args.input.display()))?;

    write_rectangles(&extracted, args.output.as_deref())?;
    log_warnings(&warnings, args.verbose);
    Ok(())
}

fn run_translate(args: &TranslateArgs) -> Result<()> {
    let rectangles = read_rectangles(&args.rectangles)?;
    let options = TranslateOptions {
        throttle: std::time::Duration::from_millis(args.throttle_ms),
    };

    let mut warnings = Vec::new();
    let translated = translate_rectangles(rectangles, &MockTranslator, &options, &mut warnings);

    write_rectangles(&translated, args.output.as_deref())?;
    log_warnings(&warnings, args.verbose);
    Ok(())
}

fn run_process(args: &ProcessArgs) -> Result<()> {
    let pdf_bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let logo = load_logo(args)?;
    let options = TranslateOptions {
        throttle: std::time::Duration::from_millis(args.throttle_ms),
    };

    let (output, warnings) =
        process_document(&pdf_bytes, &MockTranslator, &options, logo.as_ref())
            .with_context(|| format!("failed to process '{}'", args.input.display()))?;

    std::fs::write(&args.output, output)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    log_warnings(&warnings, args.verbose);
    Ok(())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pdf_hebrew_overlay=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Detect(args) => run_detect(args).map(|count| {
            if count > 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }),
        Commands::Extract(args) => run_extract(args).map(|()| ExitCode::SUCCESS),
        Commands::Translate(args) => run_translate(args).map(|()| ExitCode::SUCCESS),
        Commands::Process(args) => run_process(args).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
