use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::recognition::domain::gallery::{Gallery, GalleryBuilder};
use crate::recognition::domain::multi_face_policy::MultiFacePolicy;
use crate::shared::constants::is_image_path;
use crate::shared::error::ConfigurationError;
use crate::video::domain::image_reader::ImageReader;

/// What happened to each reference image while the gallery was built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GalleryLoadReport {
    pub loaded: Vec<PathBuf>,
    pub skipped_no_face: Vec<PathBuf>,
    /// Images showing several faces, with the face count.
    pub multi_face: Vec<(PathBuf, usize)>,
    /// Multi-face images dropped by [`MultiFacePolicy::Skip`].
    pub skipped_multi_face: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl GalleryLoadReport {
    pub fn summary(&self) -> String {
        format!(
            "{} loaded, {} without a face, {} with several faces ({} skipped), {} failed",
            self.loaded.len(),
            self.skipped_no_face.len(),
            self.multi_face.len(),
            self.skipped_multi_face.len(),
            self.failed.len()
        )
    }
}

/// Builds the known-face gallery from a directory of reference images.
///
/// Accepts flat files (`known/Alice.jpg` → `Alice`) and one level of
/// per-identity subdirectories (`known/Bob/1.jpg` → `Bob`). Images are
/// processed in sorted path order; hidden entries and non-image files are
/// ignored.
pub struct LoadGalleryUseCase {
    reader: Box<dyn ImageReader>,
    analyzer: FaceAnalyzer,
    policy: MultiFacePolicy,
}

impl LoadGalleryUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        analyzer: FaceAnalyzer,
        policy: MultiFacePolicy,
    ) -> Self {
        Self {
            reader,
            analyzer,
            policy,
        }
    }

    /// Hands the analyzer back for reuse by the annotation pipeline.
    pub fn into_analyzer(self) -> FaceAnalyzer {
        self.analyzer
    }

    pub fn execute(
        &mut self,
        dir: &Path,
    ) -> Result<(Arc<Gallery>, GalleryLoadReport), ConfigurationError> {
        let images = collect_reference_images(dir)?;
        log::info!(
            "Loading {} reference images from {}",
            images.len(),
            dir.display()
        );

        let mut builder = GalleryBuilder::default();
        let mut report = GalleryLoadReport::default();
        for (label, path) in images {
            self.load_one(&mut builder, &mut report, label, path)?;
        }

        log::info!("Gallery: {}", report.summary());
        let gallery = builder
            .build()
            .ok_or_else(|| ConfigurationError::EmptyGallery(dir.to_path_buf()))?;
        log::info!(
            "Gallery holds {} identities ({} embeddings)",
            gallery.len(),
            gallery.embedding_count()
        );
        Ok((Arc::new(gallery), report))
    }

    /// Adds one image's face to `builder`. Per-image problems, including an
    /// embedding with NaN or infinite components, are recorded in `report`;
    /// only an embedding dimension mismatch is fatal.
    fn load_one(
        &mut self,
        builder: &mut GalleryBuilder,
        report: &mut GalleryLoadReport,
        label: String,
        path: PathBuf,
    ) -> Result<(), ConfigurationError> {
        let frame = match self.reader.read(&path) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Skipping {}: failed to read image: {e}", path.display());
                report.failed.push((path, e.to_string()));
                return Ok(());
            }
        };

        let mut detections = match self.analyzer.analyze(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("Skipping {}: face analysis failed: {e}", path.display());
                report.failed.push((path, e.to_string()));
                return Ok(());
            }
        };

        let chosen = match detections.len() {
            0 => {
                log::warn!("Skipping {}: no face found", path.display());
                report.skipped_no_face.push(path);
                return Ok(());
            }
            1 => detections.pop(),
            count => {
                log::warn!(
                    "{}: {count} faces found, applying '{}' policy",
                    path.display(),
                    self.policy
                );
                report.multi_face.push((path.clone(), count));
                self.policy.select(detections)
            }
        };

        let Some(detection) = chosen else {
            report.skipped_multi_face.push(path);
            return Ok(());
        };

        match builder.add(label, detection.embedding) {
            Ok(()) => {
                log::debug!("Loaded {}", path.display());
                report.loaded.push(path);
                Ok(())
            }
            Err(e @ (ConfigurationError::EmptyLabel
            | ConfigurationError::NonFiniteEmbedding { .. })) => {
                log::warn!("Skipping {}: {e}", path.display());
                report.failed.push((path, e.to_string()));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Lists `(label, path)` pairs for every reference image under `dir`, in
/// sorted path order.
pub fn collect_reference_images(dir: &Path) -> Result<Vec<(String, PathBuf)>, ConfigurationError> {
    if !dir.exists() {
        return Err(ConfigurationError::GalleryDirMissing(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ConfigurationError::GalleryNotADirectory(dir.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in sorted_entries(dir)? {
        if entry.is_dir() {
            let Some(label) = os_label(entry.file_name()) else {
                continue;
            };
            let nested = match sorted_entries(&entry) {
                Ok(nested) => nested,
                Err(e) => {
                    log::warn!("{e}");
                    continue;
                }
            };
            images.extend(
                nested
                    .into_iter()
                    .filter(|p| p.is_file() && is_image_path(p))
                    .map(|p| (label.clone(), p)),
            );
        } else if entry.is_file() && is_image_path(&entry) {
            if let Some(label) = os_label(entry.file_stem()) {
                images.push((label, entry));
            }
        }
    }
    Ok(images)
}

/// Non-hidden children of `dir`, sorted by path.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ConfigurationError> {
    let unreadable = |e: std::io::Error| ConfigurationError::GalleryDirUnreadable {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };
    let mut entries = std::fs::read_dir(dir)
        .map_err(unreadable)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(unreadable)?;
    entries.retain(|p| !is_hidden(p));
    entries.sort();
    Ok(entries)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn os_label(name: Option<&std::ffi::OsStr>) -> Option<String> {
    name.map(|s| s.to_string_lossy().into_owned())
}
