pub(crate) mod onnx_session;
pub mod onnx_yolo_detector;
pub mod onnx_yolo_face_locator;
mod yolo;
