//! This is the vector math module
//! Provide dot product, euclidean length and L2 normalization

use crate::error::StoreError;

/// Dot Product
/// dot_prod = sum(a[i] * b[i]) for i = 0..a.len()
/// Summed left to right so repeated scans give identical scores.
/// Can only process vectors with same dimensions
pub fn dot_product(left: &[f32], right: &[f32]) -> Result<f32, StoreError> {
    if left.len() != right.len() {
        return Err(StoreError::LengthMismatch { left: left.len(), right: right.len() });
    }

    let dot_prod = left.iter()
        .zip(right.iter())
        .fold(0.0f32, |acc, (x, y)| acc + x * y);

    Ok(dot_prod)
}

/// Euclidean length
/// ||vec|| = sqrt(sum(vec[i]^2))
pub fn length(vector: &[f32]) -> f32 {
    vector.iter()
        .fold(0.0f32, |acc, x| acc + x * x)
        .sqrt()
}

/// L2 Normalization
/// norm_vec = vec / ||vec||
/// Zero vector cannot be normalized
pub fn l2_norm(vector: &[f32]) -> Result<Vec<f32>, StoreError> {
    let norm = length(vector);

    if norm == 0.0 {
        return Err(StoreError::ZeroVector);
    }

    let normed_vec = vector.iter()
        .map(|x| x / norm)
        .collect();

    Ok(normed_vec)
}
