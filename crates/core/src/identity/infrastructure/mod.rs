pub mod locating_embedder;
pub mod onnx_arcface_embedder;
