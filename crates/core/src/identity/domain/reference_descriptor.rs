use std::sync::Arc;

/// Face descriptor of the tracked identity.
///
/// Produced once by enrollment and shared read-only for the lifetime of a
/// session. Cloning shares the same buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceDescriptor {
    values: Arc<[f32]>,
}

impl ReferenceDescriptor {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Euclidean distance to `other`, or `None` if the lengths differ.
    pub fn distance_to(&self, other: &[f32]) -> Option<f64> {
        euclidean_distance(&self.values, other)
    }
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum();
    Some(sum.sqrt())
}
