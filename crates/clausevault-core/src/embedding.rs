//! Embedding vector type and numeric utilities.
//!
//! [`Embedding`] is a fixed-dimension vector validated at construction, so a
//! wrong-dimension vector can never reach the similarity engine or the store.
//! Also provides pure helpers for vector serialization and cosine similarity.
//!
//! Concrete provider implementations (the HTTP orchestrator) live in the
//! `clausevault` app crate.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Metadata interface implemented by all embedding backends.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1024`).
    fn dims(&self) -> usize;
}

/// A fixed-dimension numeric vector.
///
/// Construction rejects empty vectors and dimension mismatches; every
/// `Embedding` in the system therefore carries the provider's declared
/// dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Validate `values` against the expected dimension.
    pub fn new(values: Vec<f32>, expected_dims: usize) -> Result<Self, CoreError> {
        if values.is_empty() || values.len() != expected_dims {
            return Err(CoreError::DimensionMismatch {
                expected: expected_dims,
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }

    /// Construct from a previously validated BLOB without re-checking.
    /// Used by store implementations reading back their own writes.
    pub fn from_stored(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dims(&self) -> usize {
        self.0.len()
    }

    pub fn to_blob(&self) -> Vec<u8> {
        vec_to_blob(&self.0)
    }
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// Each `f32` is stored as 4 bytes in little-endian order, producing
/// a BLOB of `vec.len() × 4` bytes.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
///
/// Reverses [`vec_to_blob`]: reads 4-byte little-endian `f32` values
/// from the byte slice.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or when
/// either norm is zero. Never divides by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        let blob = vec_to_blob(&vec);
        let restored = blob_to_vec(&blob);
        assert_eq!(vec, restored);
    }

    #[test]
    fn test_embedding_validates_dims() {
        assert!(Embedding::new(vec![1.0, 2.0, 3.0], 3).is_ok());
        let err = Embedding::new(vec![1.0, 2.0], 3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_embedding_rejects_empty() {
        assert!(Embedding::new(Vec::new(), 0).is_err());
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&b, &a), 0.0);
    }

    #[test]
    fn test_cosine_bounds() {
        let pairs = [
            (vec![1.0f32, -2.0, 0.5], vec![-3.0f32, 1.0, 2.0]),
            (vec![0.1f32, 0.1, 0.1], vec![100.0f32, -50.0, 25.0]),
        ];
        for (a, b) in &pairs {
            let sim = cosine_similarity(a, b);
            assert!(sim >= -1.0 - 1e-6 && sim <= 1.0 + 1e-6, "out of range: {}", sim);
        }
    }

    #[test]
    fn test_cosine_different_lengths() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
