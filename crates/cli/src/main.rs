use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facetag_core::annotation::domain::annotation_style::AnnotationStyle;
use facetag_core::annotation::infrastructure::box_label_annotator::BoxLabelAnnotator;
use facetag_core::annotation::infrastructure::font_resolver::resolve_font;
use facetag_core::detection::domain::face_analyzer::FaceAnalyzer;
use facetag_core::detection::infrastructure::onnx_arcface_embedder::OnnxArcFaceEmbedder;
use facetag_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facetag_core::pipeline::annotate_video_use_case::AnnotateVideoUseCase;
use facetag_core::pipeline::load_gallery_use_case::LoadGalleryUseCase;
use facetag_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facetag_core::recognition::domain::face_matcher::{FaceMatcher, DEFAULT_DISTANCE_THRESHOLD};
use facetag_core::recognition::domain::multi_face_policy::MultiFacePolicy;
use facetag_core::recognition::domain::recognition_config::RecognitionConfig;
use facetag_core::shared::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_OUTPUT_PATH, DEFAULT_PROGRESS_INTERVAL, EMBEDDING_MODEL_NAME,
    EMBEDDING_MODEL_URL, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use facetag_core::shared::error::ConfigurationError;
use facetag_core::shared::model_resolver;
use facetag_core::video::domain::video_reader::VideoReader;
use facetag_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facetag_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use facetag_core::video::infrastructure::image_file_reader::ImageFileReader;

/// Label known people in a video using a directory of reference photos.
#[derive(Parser, Debug)]
#[command(name = "facetag")]
struct Cli {
    /// Directory of reference images (`Name.jpg` or `Name/*.jpg`).
    known_faces: PathBuf,

    /// Input video file.
    input: PathBuf,

    /// Output video file; `.avi` is encoded as MJPEG, anything else as MPEG-4.
    #[arg(default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Maximum embedding distance for a match (lower is stricter).
    #[arg(long, default_value_t = DEFAULT_DISTANCE_THRESHOLD)]
    threshold: f64,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Reference images with several faces: first, largest or skip.
    #[arg(long, default_value = "first")]
    multi_face: MultiFacePolicy,

    /// TrueType font for labels (defaults to a system font).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Append the match distance to each label.
    #[arg(long)]
    show_distance: bool,

    /// Log progress every N frames.
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_every: usize,

    /// Directory holding the ONNX models; missing models are downloaded
    /// to the user cache.
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

impl Cli {
    fn recognition_config(&self) -> RecognitionConfig {
        RecognitionConfig {
            threshold: self.threshold,
            confidence: self.confidence,
            multi_face: self.multi_face,
        }
    }
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
    let config = cli.recognition_config();

    let analyzer = build_analyzer(&cli, &config)?;

    let mut loader =
        LoadGalleryUseCase::new(Box::new(ImageFileReader::new()), analyzer, config.multi_face);
    let (gallery, _report) = loader.execute(&cli.known_faces)?;
    let analyzer = loader.into_analyzer();
    let matcher = FaceMatcher::new(gallery, config.threshold)?;

    let style = AnnotationStyle {
        show_distance: cli.show_distance,
        ..AnnotationStyle::default()
    };
    let annotator = BoxLabelAnnotator::new(style, resolve_font(cli.font.as_deref())?);

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(&cli.input)?;
    log::info!(
        "Input {}: {}x{} @ {:.2} fps, ~{} frames ({})",
        cli.input.display(),
        metadata.width,
        metadata.height,
        metadata.fps,
        metadata.total_frames,
        metadata.codec
    );

    let mut use_case = AnnotateVideoUseCase::new(
        reader,
        Box::new(FfmpegWriter::new()),
        analyzer,
        matcher,
        Box::new(annotator),
        Box::new(StdoutPipelineLogger::new(cli.progress_every)),
    );
    let report = use_case.execute(&metadata, &cli.output)?;

    if report.ambiguous_matches > 0 {
        log::info!(
            "{} faces tied between identities; the alphabetically first label was used",
            report.ambiguous_matches
        );
    }
    log::info!("Output written to {}", cli.output.display());
    Ok(())
}

fn build_analyzer(
    cli: &Cli,
    config: &RecognitionConfig,
) -> Result<FaceAnalyzer, Box<dyn std::error::Error>> {
    let models_dir = cli.models_dir.as_deref();

    let detector_path = resolve_model(YOLO_MODEL_NAME, YOLO_MODEL_URL, models_dir)?;
    let detector = OnnxYoloDetector::new(&detector_path, config.confidence)?;

    let embedder_path = resolve_model(EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, models_dir)?;
    let embedder = OnnxArcFaceEmbedder::new(&embedder_path)?;

    Ok(FaceAnalyzer::new(Box::new(detector), Box::new(embedder)))
}

fn resolve_model(
    name: &'static str,
    url: &str,
    models_dir: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    let progress: model_resolver::ProgressFn =
        Box::new(move |downloaded, total| download_progress(name, downloaded, total));
    let path = model_resolver::resolve(name, url, models_dir, Some(progress))?;
    Ok(path)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.known_faces.exists() {
        return Err(ConfigurationError::GalleryDirMissing(cli.known_faces.clone()).into());
    }
    if !cli.known_faces.is_dir() {
        return Err(ConfigurationError::GalleryNotADirectory(cli.known_faces.clone()).into());
    }
    if !cli.input.is_file() {
        return Err(ConfigurationError::InputMissing(cli.input.clone()).into());
    }
    cli.recognition_config().validate()?;
    if cli.progress_every == 0 {
        return Err("--progress-every must be at least 1".into());
    }
    if let Some(font) = &cli.font {
        if !font.is_file() {
            return Err(format!("Font file not found: {}", font.display()).into());
        }
    }
    if let Some(dir) = &cli.models_dir {
        if !dir.is_dir() {
            return Err(format!("Models directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}
