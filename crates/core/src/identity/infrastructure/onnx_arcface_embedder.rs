/// ArcFace face embedder using ONNX Runtime.
///
/// Embeds a face box as an L2-normalized descriptor. The box is expected
/// to already be tight around a face; see `LocatingEmbedder` for person
/// boxes.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::infrastructure::onnx_session;
use crate::identity::domain::embedding_provider::{EmbeddingError, EmbeddingProvider};
use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

/// Face crops smaller than this on either side carry too little detail.
pub const MIN_FACE_SIDE: u32 = 16;

/// Cosine similarity at which two ArcFace descriptors are the same person.
pub const SAME_IDENTITY_COSINE: f64 = 0.4;

/// Euclidean distance between unit vectors whose cosine similarity is `cosine`.
pub fn euclidean_for_cosine(cosine: f64) -> f64 {
    (2.0 - 2.0 * cosine.clamp(-1.0, 1.0)).sqrt()
}

/// Distance cutoff for this embedder's normalized descriptors.
///
/// The generic default threshold is tuned for a different descriptor space
/// and rejects nearly every ArcFace match.
pub fn recommended_threshold() -> f64 {
    euclidean_for_cosine(SAME_IDENTITY_COSINE)
}

pub struct OnnxArcFaceEmbedder {
    session: Mutex<ort::session::Session>,
}

impl OnnxArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = onnx_session::build_session(model_path)?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    fn infer(&self, tensor: ndarray::Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;
        Ok(embedding_slice.to_vec())
    }
}

impl EmbeddingProvider for OnnxArcFaceEmbedder {
    fn embedding(
        &self,
        frame: &Frame,
        region: &CandidateRegion,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let crop = frame
            .crop(region)
            .ok_or(EmbeddingError::OutsideFrame(*region))?;
        if crop.width() < MIN_FACE_SIDE || crop.height() < MIN_FACE_SIDE {
            return Err(EmbeddingError::NoFaceGeometry(*region));
        }

        let tensor = preprocess(crop.data(), crop.width(), crop.height());
        let mut embedding = self
            .infer(tensor)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::domain::reference_descriptor::ReferenceDescriptor;
    use crate::shared::constants::DEFAULT_FACE_THRESHOLD;
    use approx::assert_relative_eq;

    #[test]
    fn test_l2_normalize_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert_relative_eq!(v[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_recommended_threshold_matches_cosine_cutoff() {
        assert_relative_eq!(recommended_threshold(), 1.2f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(euclidean_for_cosine(1.0), 0.0);
        assert_relative_eq!(euclidean_for_cosine(-1.0), 2.0);
    }

    #[test]
    fn test_recommended_threshold_accepts_same_identity() {
        let reference = ReferenceDescriptor::new(vec![1.0, 0.0]);
        let threshold = recommended_threshold();

        // cos 0.6: same person by the cosine cutoff, rejected by the 0.45 default.
        let close = reference.distance_to(&[0.6, 0.8]).unwrap();
        assert!(close < threshold);
        assert!(close >= DEFAULT_FACE_THRESHOLD);

        // cos 0.3: a different person.
        let mut far = vec![0.3, 0.0];
        far[1] = (1.0f32 - 0.09).sqrt();
        assert!(reference.distance_to(&far).unwrap() >= threshold);
    }

    #[test]
    fn test_preprocess_shape() {
        let data = vec![128u8; 50 * 50 * 3];
        assert_eq!(preprocess(&data, 50, 50).shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_normalization_bounds() {
        let white = preprocess(&vec![255u8; 10 * 10 * 3], 10, 10);
        let black = preprocess(&vec![0u8; 10 * 10 * 3], 10, 10);
        assert_relative_eq!(white[[0, 0, 0, 0]], 1.0, epsilon = 0.01);
        assert_relative_eq!(black[[0, 2, 111, 111]], -1.0, epsilon = 0.01);
    }

    #[test]
    fn test_preprocess_keeps_channel_order() {
        let frame = Frame::filled(20, 20, [255, 0, 128], 0);
        let tensor = preprocess(frame.data(), 20, 20);
        assert_relative_eq!(tensor[[0, 0, 56, 56]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 1, 56, 56]], -1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 2, 56, 56]], 0.0, epsilon = 0.01);
    }
}
