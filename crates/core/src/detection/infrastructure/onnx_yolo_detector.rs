/// YOLO object detector using ONNX Runtime via `ort`.
///
/// Runs a COCO-style multi-class model (`[1, 4 + classes, anchors]`) and
/// returns boxes for the requested classes, in the detector's confidence
/// order after NMS.
use std::path::Path;

use crate::detection::domain::candidate_detector::CandidateDetector;
use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

use super::onnx_session;
use super::yolo::{self, RawDetection, YoloLayout, NMS_IOU_THRESH};

/// YOLO object detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = onnx_session::build_session(model_path)?;
        let input_size = yolo::model_input_size(&session);
        log::info!(
            "Loaded detector {} (input {input_size}px, confidence {confidence})",
            model_path.display()
        );
        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl CandidateDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        class_filter: &[u32],
    ) -> Result<Vec<CandidateRegion>, Box<dyn std::error::Error>> {
        let (input_tensor, transform) = yolo::letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let raw = yolo::decode(
            data,
            tensor.shape(),
            YoloLayout::MultiClass,
            self.confidence,
            &transform,
        )?;
        Ok(select_candidates(
            raw,
            class_filter,
            frame.width(),
            frame.height(),
        ))
    }
}

/// Keeps detections of the requested classes, applies NMS and converts
/// the survivors to frame-clipped regions. An empty filter keeps all classes.
fn select_candidates(
    raw: Vec<RawDetection>,
    class_filter: &[u32],
    frame_w: u32,
    frame_h: u32,
) -> Vec<CandidateRegion> {
    let mut wanted: Vec<RawDetection> = raw
        .into_iter()
        .filter(|d| class_filter.is_empty() || class_filter.contains(&d.class_id))
        .collect();
    yolo::nms(&mut wanted, NMS_IOU_THRESH)
        .iter()
        .filter_map(|d| d.to_region(frame_w, frame_h))
        .collect()
}
