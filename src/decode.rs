use crate::errors::{FeedError, Result};

/// Decodes one serialized feature vector blob into its float sequence.
///
/// The payload is a bincode-encoded `Vec<f64>` (little-endian u64 length
/// prefix followed by the values). Decoding is pure and row-independent; a
/// malformed blob aborts the run rather than producing a partial vector.
pub fn decode_feature_vector(blob: &[u8]) -> Result<Vec<f64>> {
    bincode::deserialize(blob).map_err(|err| FeedError::VectorDecode(err.to_string()))
}
