use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use facelock_core::detection::domain::face_locator::FaceLocator;
use facelock_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facelock_core::detection::infrastructure::onnx_yolo_face_locator::{
    OnnxYoloFaceLocator, DEFAULT_FACE_CONFIDENCE,
};
use facelock_core::identity::domain::embedding_provider::EmbeddingProvider;
use facelock_core::identity::infrastructure::locating_embedder::LocatingEmbedder;
use facelock_core::identity::infrastructure::onnx_arcface_embedder::{
    self, OnnxArcFaceEmbedder,
};
use facelock_core::matching::domain::identity_matcher::IdentityMatcher;
use facelock_core::overlay::infrastructure::rectangle_overlay::RectangleOverlay;
use facelock_core::pipeline::cadence_controller::{CadenceController, SessionIo};
use facelock_core::pipeline::enroll_reference_use_case::EnrollReferenceUseCase;
use facelock_core::pipeline::session_logger::StdoutSessionLogger;
use facelock_core::shared::constants::IMAGE_EXTENSIONS;
use facelock_core::shared::model_resolver::{self, ModelSpec, EMBEDDING_MODEL, FACE_MODEL};
use facelock_core::shared::tracking_config::TrackingConfig;
use facelock_core::video::domain::display_sink::{DisplaySink, NullDisplaySink};
use facelock_core::video::domain::frame_source::FrameSource;
use facelock_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use facelock_core::video::infrastructure::image_file_reader::ImageFileReader;
use facelock_core::video::infrastructure::image_preview_sink::{
    ImagePreviewSink, DEFAULT_PREVIEW_SIZE,
};

/// Lock onto one person's face in a video and follow it.
#[derive(Parser, Debug)]
#[command(name = "facelock")]
struct Cli {
    /// Still photo of the person to track.
    #[arg(long)]
    reference: PathBuf,

    /// Video file to track in.
    #[arg(long)]
    video: PathBuf,

    /// Person detector model (YOLO ONNX, COCO classes).
    #[arg(long)]
    model: PathBuf,

    /// Keep this image updated with the annotated frames.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// JSON config file (default: platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Face distance threshold; lower is stricter.
    #[arg(long)]
    threshold: Option<f64>,

    /// Run detection every Nth frame.
    #[arg(long)]
    detect_interval: Option<u64>,

    /// Display every Nth frame.
    #[arg(long)]
    display_interval: Option<u64>,

    /// Drop the box after N consecutive misses (default: 1).
    #[arg(long, conflicts_with = "keep_box")]
    stale_after: Option<u32>,

    /// Keep drawing the last box until a new match replaces it.
    #[arg(long)]
    keep_box: bool,

    /// Face locator model override.
    #[arg(long)]
    face_model: Option<PathBuf>,

    /// Face embedding model override.
    #[arg(long)]
    embedding_model: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli)?;

    let locator: Arc<dyn FaceLocator> = Arc::new(OnnxYoloFaceLocator::new(
        &resolve_model(FACE_MODEL, cli.face_model.as_deref())?,
        DEFAULT_FACE_CONFIDENCE,
    )?);
    let face_embedder: Arc<dyn EmbeddingProvider> = Arc::new(OnnxArcFaceEmbedder::new(
        &resolve_model(EMBEDDING_MODEL, cli.embedding_model.as_deref())?,
    )?);

    let enroll = EnrollReferenceUseCase::new(
        Box::new(ImageFileReader::new()),
        Arc::clone(&locator),
        Arc::clone(&face_embedder),
    );
    let reference = enroll.execute(&cli.reference)?;

    let mut source = FfmpegFrameSource::new();
    let metadata = source
        .open(&cli.video)
        .map_err(|e| format!("Failed to open video {}: {e}", cli.video.display()))?;
    log::info!(
        "Opened {} ({}x{}, {:.1} fps, {} frames)",
        cli.video.display(),
        metadata.width,
        metadata.height,
        metadata.fps,
        metadata.total_frames
    );

    let detector = OnnxYoloDetector::new(&cli.model, config.detector_confidence)?;
    let sink: Box<dyn DisplaySink> = match &cli.preview {
        Some(path) => Box::new(ImagePreviewSink::new(path, DEFAULT_PREVIEW_SIZE)),
        None => Box::new(NullDisplaySink),
    };

    let io = SessionIo {
        source: Box::new(source),
        detector: Box::new(detector),
        overlay: Box::new(RectangleOverlay::default()),
        sink,
        logger: Box::new(StdoutSessionLogger::default()),
    };
    let matcher = IdentityMatcher::new(
        reference,
        config.face_threshold,
        Arc::new(LocatingEmbedder::new(locator, face_embedder)),
    );

    let mut controller =
        CadenceController::new(io, matcher, &config)?.with_total_frames(metadata.total_frames);
    let frames = controller.run();

    match controller.state().last_box() {
        Some(locked) => log::info!("Processed {frames} frames; last lock at {locked}"),
        None => log::info!("Processed {frames} frames; no lock acquired"),
    }
    if let Some(preview) = &cli.preview {
        log::info!("Preview written to {}", preview.display());
    }
    Ok(())
}

/// File config (explicit or default location) with CLI flags on top.
///
/// The face threshold falls back to the ArcFace calibration, not the
/// generic default, when neither the file nor a flag sets it.
fn build_config(cli: &Cli) -> Result<TrackingConfig, Box<dyn std::error::Error>> {
    let base = TrackingConfig {
        face_threshold: onnx_arcface_embedder::recommended_threshold(),
        ..TrackingConfig::default()
    };
    let mut config = TrackingConfig::load_or(cli.config.as_deref(), base)?;
    if let Some(threshold) = cli.threshold {
        config.face_threshold = threshold;
    }
    if let Some(n) = cli.detect_interval {
        config.detect_interval = n;
    }
    if let Some(n) = cli.display_interval {
        config.display_interval = n;
    }
    if cli.stale_after.is_some() {
        config.stale_after_misses = cli.stale_after;
    }
    if cli.keep_box {
        config.stale_after_misses = None;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_model(
    spec: ModelSpec,
    override_path: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", spec.name);
    let path = model_resolver::resolve(spec, override_path, None, Some(Box::new(download_progress)))?;
    Ok(path)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.reference.exists() {
        return Err(format!("Reference image not found: {}", cli.reference.display()).into());
    }
    if !is_image(&cli.reference) {
        return Err(format!(
            "Reference must be an image ({}), got {}",
            IMAGE_EXTENSIONS.join(", "),
            cli.reference.display()
        )
        .into());
    }
    if !cli.video.exists() {
        return Err(format!("Video file not found: {}", cli.video.display()).into());
    }
    if !cli.model.exists() {
        return Err(format!("Detector model not found: {}", cli.model.display()).into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}
