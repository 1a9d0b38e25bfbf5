/// YOLO face locator using ONNX Runtime.
///
/// Used by enrollment to find the reference face, and by the locating
/// embedder to find a face inside a person box. The session sits behind a
/// mutex so one loaded model can serve both.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::face_locator::FaceLocator;
use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

use super::onnx_session;
use super::yolo::{self, YoloLayout, NMS_IOU_THRESH};

/// Default confidence threshold for faces.
pub const DEFAULT_FACE_CONFIDENCE: f64 = 0.5;

pub struct OnnxYoloFaceLocator {
    session: Mutex<ort::session::Session>,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloFaceLocator {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = onnx_session::build_session(model_path)?;
        let input_size = yolo::model_input_size(&session);
        Ok(Self {
            session: Mutex::new(session),
            confidence,
            input_size,
        })
    }
}

impl FaceLocator for OnnxYoloFaceLocator {
    fn locate(&self, frame: &Frame) -> Result<Vec<CandidateRegion>, Box<dyn std::error::Error>> {
        let (input_tensor, transform) = yolo::letterbox(frame, self.input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut raw = yolo::decode(
            data,
            tensor.shape(),
            YoloLayout::SingleClass,
            self.confidence,
            &transform,
        )?;
        Ok(yolo::nms(&mut raw, NMS_IOU_THRESH)
            .iter()
            .filter_map(|d| d.to_region(frame.width(), frame.height()))
            .collect())
    }
}
