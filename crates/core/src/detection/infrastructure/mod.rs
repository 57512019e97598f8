pub mod alignment;
pub mod math;
pub mod onnx_arcface_embedder;
pub mod onnx_yolo_detector;
mod session;
