use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::detection::domain::face_locator::FaceLocator;
use crate::identity::domain::embedding_provider::{EmbeddingError, EmbeddingProvider};
use crate::identity::domain::reference_descriptor::ReferenceDescriptor;
use crate::video::domain::still_image_reader::StillImageReader;

#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("cannot read reference image {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("face location failed on {path}: {message}")]
    Locate { path: PathBuf, message: String },
    #[error("no face found in reference image {0}")]
    NoFace(PathBuf),
    #[error("cannot compute descriptor for reference face: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("reference descriptor is empty")]
    EmptyDescriptor,
}

/// Builds the reference descriptor from a still photo:
/// read → locate faces → embed the most confident face.
pub struct EnrollReferenceUseCase {
    reader: Box<dyn StillImageReader>,
    locator: Arc<dyn FaceLocator>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl EnrollReferenceUseCase {
    pub fn new(
        reader: Box<dyn StillImageReader>,
        locator: Arc<dyn FaceLocator>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            reader,
            locator,
            embedder,
        }
    }

    pub fn execute(&self, image_path: &Path) -> Result<ReferenceDescriptor, EnrollmentError> {
        let frame = self
            .reader
            .read(image_path)
            .map_err(|e| EnrollmentError::Read {
                path: image_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let faces = self
            .locator
            .locate(&frame)
            .map_err(|e| EnrollmentError::Locate {
                path: image_path.to_path_buf(),
                message: e.to_string(),
            })?;
        if faces.len() > 1 {
            log::warn!(
                "{} faces in {}; enrolling the most confident one",
                faces.len(),
                image_path.display()
            );
        }
        let face = faces
            .first()
            .ok_or_else(|| EnrollmentError::NoFace(image_path.to_path_buf()))?;

        let values = self.embedder.embedding(&frame, face)?;
        if values.is_empty() {
            return Err(EnrollmentError::EmptyDescriptor);
        }
        log::info!(
            "Enrolled reference face {face} from {} ({}-d descriptor)",
            image_path.display(),
            values.len()
        );
        Ok(ReferenceDescriptor::new(values))
    }
}
