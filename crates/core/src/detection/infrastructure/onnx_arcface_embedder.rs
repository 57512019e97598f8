/// ArcFace face embedder using ONNX Runtime.
///
/// Faces with five visible landmarks are warped onto the canonical ArcFace
/// template before inference; otherwise the box crop is resized directly.
use std::path::Path;

use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::recognition::domain::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::alignment::{align_face, ALIGNED_SIZE};
use super::math::nearest_source_index;
use super::session::open_session;

const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxArcFaceEmbedder {
    session: ort::session::Session,
}

impl OnnxArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path)?;
        Ok(Self { session })
    }
}

impl FaceEmbedder for OnnxArcFaceEmbedder {
    fn embed(
        &mut self,
        frame: &Frame,
        region: &Region,
    ) -> Result<Embedding, Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }
        let face = face_pixels(frame, region)?;
        let tensor = preprocess(&face);

        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("ArcFace model produced no outputs".into());
        }
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_array = embedding_array.as_standard_layout();
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        Ok(Embedding::normalized(embedding_slice.to_vec()))
    }
}

/// 112×112 RGB pixels of the face, aligned when landmarks allow.
fn face_pixels(frame: &Frame, region: &Region) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if let Some(landmarks) = region.visible_landmarks() {
        return Ok(align_face(
            frame.data(),
            frame.width(),
            frame.height(),
            landmarks,
        ));
    }

    let (crop, w, h) = frame.crop(region);
    if w == 0 || h == 0 {
        return Err("face region lies outside the frame".into());
    }
    Ok(resize_nearest(&crop, w as usize, h as usize, ALIGNED_SIZE))
}

fn resize_nearest(rgb: &[u8], width: usize, height: usize, out_size: usize) -> Vec<u8> {
    let mut out = vec![0u8; out_size * out_size * 3];
    for y in 0..out_size {
        let sy = nearest_source_index(y, height, out_size);
        for x in 0..out_size {
            let sx = nearest_source_index(x, width, out_size);
            let src = (sy * width + sx) * 3;
            let dst = (y * out_size + x) * 3;
            out[dst..dst + 3].copy_from_slice(&rgb[src..src + 3]);
        }
    }
    out
}

/// HWC u8 → NCHW f32 scaled to `[-1, 1]`.
fn preprocess(face: &[u8]) -> ndarray::Array4<f32> {
    let size = ALIGNED_SIZE;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    for y in 0..size {
        for x in 0..size {
            let offset = (y * size + x) * 3;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (face[offset + c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}
