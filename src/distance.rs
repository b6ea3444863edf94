//! Distance interface and ready-made metrics.
//!
//! The index never does arithmetic on distances: it only compares them. A
//! metric therefore yields any scalar the caller guarantees to be totally
//! ordered (for floats this means never producing NaN). Distances must be
//! deterministic: the same pair of items must yield the same value for the
//! lifetime of a graph.
//!
//! Any closure or function `Fn(&T, &T) -> D` is a metric, so the functions
//! below plug in directly for the common `Vec<f32>` embedding case:
//!
//! ```
//! use smallworld::{euclidean, HnswIndex, HnswParams};
//!
//! let index = HnswIndex::new(euclidean, HnswParams::default());
//! # assert!(index.is_ok());
//! ```

/// A caller-supplied distance function over items of type `T`.
pub trait Metric<T> {
    /// The distance scalar. Totally ordered by contract; the index compares
    /// values but never adds or scales them.
    type Distance: PartialOrd + Clone;

    /// Compute the distance between two items. Pure and deterministic.
    fn distance(&self, a: &T, b: &T) -> Self::Distance;
}

impl<T, D, F> Metric<T> for F
where
    D: PartialOrd + Clone,
    F: Fn(&T, &T) -> D,
{
    type Distance = D;

    fn distance(&self, a: &T, b: &T) -> D {
        self(a, b)
    }
}

/// Euclidean (L2) distance between two `f32` vectors.
pub fn euclidean(a: &Vec<f32>, b: &Vec<f32>) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    squared_euclidean(a, b).sqrt()
}

/// Squared Euclidean distance between two `f32` vectors.
///
/// Orders candidates identically to [`euclidean`] while skipping the square
/// root; reported distances are squared.
pub fn squared_euclidean(a: &Vec<f32>, b: &Vec<f32>) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Cosine distance (`1 - cosine similarity`) between two `f32` vectors.
///
/// A zero vector has no direction; its distance to anything is 1.0.
pub fn cosine(a: &Vec<f32>, b: &Vec<f32>) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        1.0
    } else {
        1.0 - dot / (norm_a * norm_b)
    }
}
