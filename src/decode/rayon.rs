//! Rayon-parallel decoding (feature-gated).
//!
//! Box indices are split into fixed-size chunks decoded on the rayon pool.
//! Chunks are concatenated in index order, so the output is identical to
//! [`decode_candidates`](super::decode_candidates).

use crate::candidate::Candidate;
use crate::decode::TensorView;
use crate::trace::{trace_event, trace_span};
use rayon::prelude::*;

const CHUNK_BOXES: usize = 256;

/// Parallel counterpart of [`decode_candidates`](super::decode_candidates).
pub fn decode_candidates_par(tensor: &TensorView<'_>) -> Vec<Candidate> {
    let _span = trace_span!(
        "decode_par",
        boxes = tensor.num_boxes(),
        classes = tensor.num_classes()
    )
    .entered();

    let num_boxes = tensor.num_boxes();
    let num_chunks = num_boxes.div_ceil(CHUNK_BOXES);
    let chunks: Vec<Vec<Candidate>> = (0..num_chunks)
        .into_par_iter()
        .map(|chunk| {
            let start = chunk * CHUNK_BOXES;
            let end = (start + CHUNK_BOXES).min(num_boxes);
            (start..end).filter_map(|i| tensor.candidate_at(i)).collect()
        })
        .collect();

    let out: Vec<Candidate> = chunks.into_iter().flatten().collect();
    trace_event!("decoded_candidates", count = out.len());
    out
}
