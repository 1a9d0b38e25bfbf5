use std::sync::Arc;

use crate::detection::domain::face_locator::FaceLocator;
use crate::identity::domain::embedding_provider::{EmbeddingError, EmbeddingProvider};
use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

/// Embeds the face inside a larger candidate box (typically a person).
///
/// Crops the candidate, asks the locator for faces inside the crop, and
/// embeds the most confident one. A box with no locatable face fails with
/// [`EmbeddingError::NoFaceGeometry`], which the match worker treats as
/// "skip this candidate".
pub struct LocatingEmbedder {
    locator: Arc<dyn FaceLocator>,
    face_embedder: Arc<dyn EmbeddingProvider>,
}

impl LocatingEmbedder {
    pub fn new(locator: Arc<dyn FaceLocator>, face_embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            locator,
            face_embedder,
        }
    }
}

impl EmbeddingProvider for LocatingEmbedder {
    fn embedding(
        &self,
        frame: &Frame,
        region: &CandidateRegion,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let crop = frame
            .crop(region)
            .ok_or(EmbeddingError::OutsideFrame(*region))?;
        let faces = self
            .locator
            .locate(&crop)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
        let face = faces
            .first()
            .ok_or(EmbeddingError::NoFaceGeometry(*region))?;
        self.face_embedder.embedding(&crop, face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubLocator {
        faces: Vec<CandidateRegion>,
        seen_sizes: Mutex<Vec<(u32, u32)>>,
    }

    impl FaceLocator for StubLocator {
        fn locate(
            &self,
            frame: &Frame,
        ) -> Result<Vec<CandidateRegion>, Box<dyn std::error::Error>> {
            self.seen_sizes
                .lock()
                .unwrap()
                .push((frame.width(), frame.height()));
            Ok(self.faces.clone())
        }
    }

    struct FailingLocator;

    impl FaceLocator for FailingLocator {
        fn locate(&self, _: &Frame) -> Result<Vec<CandidateRegion>, Box<dyn std::error::Error>> {
            Err("model exploded".into())
        }
    }

    /// Encodes the face box it was asked about as the descriptor.
    struct EchoEmbedder;

    impl EmbeddingProvider for EchoEmbedder {
        fn embedding(
            &self,
            _frame: &Frame,
            region: &CandidateRegion,
        ) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![
                region.x1() as f32,
                region.y1() as f32,
                region.x2() as f32,
                region.y2() as f32,
            ])
        }
    }

    fn region(x1: i32, y1: i32, x2: i32, y2: i32) -> CandidateRegion {
        CandidateRegion::new(x1, y1, x2, y2).unwrap()
    }

    fn embedder(locator: Arc<dyn FaceLocator>) -> LocatingEmbedder {
        LocatingEmbedder::new(locator, Arc::new(EchoEmbedder))
    }

    #[test]
    fn test_embeds_first_face_in_crop_coordinates() {
        let locator = Arc::new(StubLocator {
            faces: vec![region(5, 5, 25, 25), region(30, 30, 40, 40)],
            seen_sizes: Mutex::new(Vec::new()),
        });
        let frame = Frame::filled(200, 200, [0, 0, 0], 0);

        let descriptor = embedder(locator.clone())
            .embedding(&frame, &region(50, 40, 110, 160))
            .unwrap();

        assert_eq!(descriptor, vec![5.0, 5.0, 25.0, 25.0]);
        assert_eq!(*locator.seen_sizes.lock().unwrap(), vec![(60, 120)]);
    }

    #[test]
    fn test_no_face_is_no_geometry() {
        let locator = Arc::new(StubLocator {
            faces: vec![],
            seen_sizes: Mutex::new(Vec::new()),
        });
        let frame = Frame::filled(100, 100, [0, 0, 0], 0);
        let target = region(0, 0, 50, 50);

        let err = embedder(locator).embedding(&frame, &target).unwrap_err();
        assert!(matches!(err, EmbeddingError::NoFaceGeometry(r) if r == target));
    }

    #[test]
    fn test_region_outside_frame() {
        let locator = Arc::new(StubLocator {
            faces: vec![region(0, 0, 5, 5)],
            seen_sizes: Mutex::new(Vec::new()),
        });
        let frame = Frame::filled(100, 100, [0, 0, 0], 0);

        let err = embedder(locator)
            .embedding(&frame, &region(200, 200, 250, 250))
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::OutsideFrame(_)));
    }

    #[test]
    fn test_locator_failure_is_inference_error() {
        let frame = Frame::filled(100, 100, [0, 0, 0], 0);
        let err = embedder(Arc::new(FailingLocator))
            .embedding(&frame, &region(0, 0, 50, 50))
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Inference(msg) if msg.contains("exploded")));
    }
}
