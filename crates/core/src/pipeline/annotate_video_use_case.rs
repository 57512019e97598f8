use std::path::Path;
use std::time::Instant;

use crate::annotation::domain::frame_annotator::{FrameAnnotator, MatchedFace};
use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::recognition::domain::face_matcher::FaceMatcher;
use crate::shared::error::FrameDecodeError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_logger::PipelineLogger;

/// Counters for one annotation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationReport {
    /// Items yielded by the reader, decodable or not.
    pub frames_read: usize,
    pub frames_written: usize,
    /// Frames dropped because they could not be decoded.
    pub skipped: Vec<FrameDecodeError>,
    /// Frames written as decoded because analysis or drawing failed.
    pub frames_unannotated: usize,
    pub faces_detected: usize,
    pub faces_identified: usize,
    pub faces_unknown: usize,
    /// Faces whose nearest identity tied with another.
    pub ambiguous_matches: usize,
}

impl AnnotationReport {
    pub fn summary(&self) -> String {
        format!(
            "{} frames written ({} skipped, {} unannotated); {} faces: {} identified, {} unknown",
            self.frames_written,
            self.skipped.len(),
            self.frames_unannotated,
            self.faces_detected,
            self.faces_identified,
            self.faces_unknown
        )
    }
}

/// Sequential annotation loop: read → analyze → match → annotate → write.
///
/// Undecodable frames are dropped and recorded; frames whose analysis or
/// drawing fails are written unannotated. Only an encode failure aborts the
/// run. Reader and writer are closed whatever the outcome.
pub struct AnnotateVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    analyzer: FaceAnalyzer,
    matcher: FaceMatcher,
    annotator: Box<dyn FrameAnnotator>,
    logger: Box<dyn PipelineLogger>,
}

impl AnnotateVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        analyzer: FaceAnalyzer,
        matcher: FaceMatcher,
        annotator: Box<dyn FrameAnnotator>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            analyzer,
            matcher,
            annotator,
            logger,
        }
    }

    /// Annotates every frame of the already opened reader into
    /// `output_path`.
    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
        output_path: &Path,
    ) -> Result<AnnotationReport, Box<dyn std::error::Error>> {
        if let Err(e) = self.writer.open(output_path, metadata) {
            self.reader.close();
            return Err(e);
        }

        let result = self.process(metadata);
        let closed = self.writer.close();
        self.reader.close();
        self.logger.summary();

        let report = result?;
        closed?;
        self.logger.info(&format!("Annotation: {}", report.summary()));
        Ok(report)
    }

    fn process(
        &mut self,
        metadata: &VideoMetadata,
    ) -> Result<AnnotationReport, Box<dyn std::error::Error>> {
        let mut report = AnnotationReport::default();
        let mut stages = FrameStages {
            analyzer: &mut self.analyzer,
            matcher: &self.matcher,
            annotator: self.annotator.as_ref(),
            logger: &mut self.logger,
        };

        for (position, item) in self.reader.frames().enumerate() {
            report.frames_read += 1;
            let mut frame = match item {
                Ok(frame) => frame,
                Err(e) => {
                    let err = FrameDecodeError {
                        index: position,
                        reason: e.to_string(),
                    };
                    log::warn!("{err}; skipping");
                    report.skipped.push(err);
                    continue;
                }
            };

            if let Err(e) = stages.annotate(&mut frame, &mut report) {
                log::warn!(
                    "Frame {}: annotation failed, writing it unannotated: {e}",
                    frame.index()
                );
                report.frames_unannotated += 1;
            }

            let t0 = Instant::now();
            self.writer.write(&frame)?;
            stages.logger.timing("encode", elapsed_ms(t0));
            report.frames_written += 1;
            stages.logger.progress(position + 1, metadata.total_frames);
        }

        Ok(report)
    }
}

/// The per-frame stages, borrowed from the use case while the reader's
/// frame iterator is alive.
struct FrameStages<'a> {
    analyzer: &'a mut FaceAnalyzer,
    matcher: &'a FaceMatcher,
    annotator: &'a dyn FrameAnnotator,
    logger: &'a mut Box<dyn PipelineLogger>,
}

impl FrameStages<'_> {
    /// Matches and draws every face in `frame`. The frame is only touched
    /// once all faces are matched, so on error it is still as decoded.
    fn annotate(
        &mut self,
        frame: &mut Frame,
        report: &mut AnnotationReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let t0 = Instant::now();
        let detections = self.analyzer.analyze(frame)?;
        self.logger.timing("analyze", elapsed_ms(t0));
        self.logger.metric("faces", detections.len() as f64);

        let t0 = Instant::now();
        let faces = detections
            .into_iter()
            .map(|d| {
                self.matcher.identify(&d.embedding).map(|result| MatchedFace {
                    region: d.region,
                    result,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.logger.timing("match", elapsed_ms(t0));

        let t0 = Instant::now();
        self.annotator.annotate(frame, &faces)?;
        self.logger.timing("annotate", elapsed_ms(t0));

        for face in &faces {
            report.faces_detected += 1;
            if face.result.label.is_known() {
                report.faces_identified += 1;
            } else {
                report.faces_unknown += 1;
            }
            if face.result.ambiguous {
                report.ambiguous_matches += 1;
                log::debug!(
                    "Frame {}: '{}' tied with another identity at distance {:.3}",
                    frame.index(),
                    face.result.nearest,
                    face.result.distance
                );
            }
        }
        Ok(())
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
