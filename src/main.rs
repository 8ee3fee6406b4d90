use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use slipscan::ocr::tesseract::TesseractBackend;
use slipscan::pipeline::{DebugLevel, Pipeline};
use slipscan::session::{DebugArtifactWriter, NullObserver, ResultSession, StageObserver};
use slipscan::{EngineOptions, ScanError, ScanOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DebugOutput {
    File,
    Screen,
    Both,
}

#[derive(Parser)]
#[command(name = "slipscan")]
#[command(about = "Detect, flatten and OCR a photographed receipt or document")]
#[command(version)]
struct Cli {
    /// Path to the input photograph
    #[arg(short, long, value_name = "IMAGE")]
    input: PathBuf,

    /// Root directory for result sessions
    #[arg(short, long, value_name = "DIR", default_value = "./output")]
    output: PathBuf,

    /// Result directory name prefix ("result" gives result1, result2, ...)
    #[arg(short, long, default_value = "result")]
    name: String,

    /// OCR languages, '+'-joined (e.g. "kor+eng")
    #[arg(long, default_value = "kor+eng")]
    lang: String,

    /// OCR engine mode, passed through to the engine
    #[arg(long, default_value_t = 2)]
    oem: u32,

    /// Page segmentation mode, passed through to the engine
    #[arg(long, default_value_t = 6)]
    psm: u32,

    /// Tesseract executable to invoke
    #[arg(long, value_name = "PATH", default_value = "tesseract")]
    tesseract_cmd: PathBuf,

    /// Minimum contour area considered a document candidate
    #[arg(long, default_value_t = 1000.0)]
    min_area: f64,

    /// Debug artifact level: 0 none, 1 key stages, 2 +preprocessing,
    /// 3 +overlays
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=3))]
    debug: u8,

    /// Where debug artifacts go
    #[arg(long, value_enum, default_value_t = DebugOutput::File)]
    debug_out: DebugOutput,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "slipscan=debug" } else { "slipscan=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    if matches!(args.debug_out, DebugOutput::Screen | DebugOutput::Both) {
        tracing::warn!("on-screen debug display is not available; writing artifacts to disk");
    }

    // Decode up front: an unreadable input aborts before any stage runs.
    let frame = image::open(&args.input).map_err(|e| ScanError::ImageLoad {
        path: args.input.clone(),
        reason: e.to_string(),
    })?;
    tracing::info!(
        input = %args.input.display(),
        width = frame.width(),
        height = frame.height(),
        "input image loaded"
    );

    let session = ResultSession::allocate(&args.output, &args.name)?;
    session.copy_input(&args.input)?;

    let backend = TesseractBackend::new(&args.tesseract_cmd);
    let mut pipeline = Pipeline {
        lang: args.lang,
        engine_options: EngineOptions {
            oem: args.oem,
            psm: args.psm,
        },
        debug_level: DebugLevel::from_cli(args.debug),
        ..Pipeline::default()
    };
    pipeline.detector.min_area = args.min_area;

    let mut writer = DebugArtifactWriter::new(&session);
    let mut null = NullObserver;
    let observer: &mut dyn StageObserver = if args.debug == 0 {
        &mut null
    } else {
        &mut writer
    };

    let report = pipeline.run(&frame, &backend, observer)?;

    match report.outcome {
        ScanOutcome::QuadNotFound => {
            println!("No document boundary detected; see {} for the preprocessing artifacts.",
                session.debug_dir().display());
        }
        ScanOutcome::Complete => {
            let text_path = session.write_text_result(&report.extraction.text)?;
            let markup_path = session.write_markup_result(&report.extraction.markup)?;

            if let Some(error) = &report.ocr_error {
                println!("OCR failed ({}); empty results written.", error);
            }
            if let Some((w, h)) = report.rectified_size {
                println!("Rectified document: {}x{} px", w, h);
            }
            let words = report
                .extraction
                .pages
                .iter()
                .map(|p| p.words().count())
                .sum::<usize>();
            println!("Recognized {} words across {} page(s).", words, report.extraction.pages.len());
            println!("Text result:   {}", text_path.display());
            println!("Markup result: {}", markup_path.display());
        }
    }
    println!("Stage artifacts: {}", session.debug_dir().display());

    Ok(())
}
