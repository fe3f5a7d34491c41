use crate::models::TasteVector;

/// Calculate the Euclidean (L2) distance between two taste vectors
///
/// Matches pgvector's `<->` operator, so in-process and database ranking
/// agree on ordering.
///
/// # Returns
/// `None` when the dimensions differ or either vector is empty
#[inline]
pub fn euclidean_distance(a: &TasteVector, b: &TasteVector) -> Option<f32> {
    if a.dimension() != b.dimension() || a.dimension() == 0 {
        return None;
    }

    let sum: f32 = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();

    Some(sum.sqrt())
}
