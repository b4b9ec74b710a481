//! Greedy IoU-based non-maximum suppression.

use crate::candidate::Candidate;
use crate::geometry::BoundingBox;

/// IoU above which a lower-scored box is suppressed by the pipeline.
pub const IOU_THRESHOLD: f32 = 0.5;

/// Returns the indices of boxes kept by greedy non-maximum suppression.
///
/// Indices are visited by descending score; equal scores keep their input
/// order. A visited box that is still active is kept and deactivates every
/// later active box whose IoU with it is strictly greater than
/// `iou_threshold`. The result is in keep order (descending score) and never
/// contains an index twice. If `boxes` and `scores` differ in length only the
/// common prefix is considered.
pub fn nms_indices(boxes: &[BoundingBox], scores: &[f32], iou_threshold: f32) -> Vec<usize> {
    let n = boxes.len().min(scores.len());
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();
    // `sort_by` is stable, so ties stay in input order.
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let areas: Vec<f32> = boxes[..n].iter().map(BoundingBox::area).collect();
    let mut active = vec![true; n];
    let mut kept = Vec::new();

    for (pos, &i) in order.iter().enumerate() {
        if !active[i] {
            continue;
        }
        kept.push(i);
        if areas[i] <= 0.0 {
            continue;
        }
        for &j in &order[pos + 1..] {
            if active[j] && iou_with_areas(&boxes[i], areas[i], &boxes[j], areas[j]) > iou_threshold
            {
                active[j] = false;
            }
        }
    }

    kept
}

/// Runs [`nms_indices`] over decoded candidates.
pub fn nms_candidates(candidates: &[Candidate], iou_threshold: f32) -> Vec<usize> {
    let boxes: Vec<BoundingBox> = candidates.iter().map(|c| c.bbox).collect();
    let scores: Vec<f32> = candidates.iter().map(|c| c.score).collect();
    nms_indices(&boxes, &scores, iou_threshold)
}

fn iou_with_areas(a: &BoundingBox, area_a: f32, b: &BoundingBox, area_b: f32) -> f32 {
    if area_a <= 0.0 || area_b <= 0.0 {
        return 0.0;
    }
    match a.intersection(b) {
        Some(inter) => {
            let inter_area = inter.area();
            inter_area / (area_a + area_b - inter_area)
        }
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::{nms_indices, IOU_THRESHOLD};
    use crate::geometry::BoundingBox;

    #[test]
    fn empty_input_keeps_nothing() {
        assert!(nms_indices(&[], &[], IOU_THRESHOLD).is_empty());
    }

    #[test]
    fn overlapping_lower_score_is_suppressed() {
        let boxes = [
            BoundingBox::new(0.0, 0.0, 0.5, 0.5),
            BoundingBox::new(0.01, 0.01, 0.51, 0.51),
            BoundingBox::new(0.6, 0.6, 0.9, 0.9),
        ];
        let scores = [0.7, 0.9, 0.6];
        assert_eq!(nms_indices(&boxes, &scores, IOU_THRESHOLD), vec![1, 2]);
    }

    #[test]
    fn iou_equal_to_threshold_is_not_suppressed() {
        // IoU of these two boxes is exactly 0.5.
        let boxes = [
            BoundingBox::new(0.0, 0.0, 0.5, 0.25),
            BoundingBox::new(0.0, 0.0, 0.25, 0.25),
        ];
        let scores = [0.9, 0.8];
        assert_eq!(nms_indices(&boxes, &scores, 0.5), vec![0, 1]);
    }

    #[test]
    fn degenerate_box_is_kept_but_suppresses_nothing() {
        let boxes = [
            BoundingBox::new(0.2, 0.2, 0.2, 0.8),
            BoundingBox::new(0.1, 0.1, 0.3, 0.9),
        ];
        let scores = [0.95, 0.6];
        assert_eq!(nms_indices(&boxes, &scores, IOU_THRESHOLD), vec![0, 1]);
    }

    #[test]
    fn suppressed_box_cannot_suppress_others() {
        // 0 suppresses 1; 1 would have suppressed 2, but 2 only lightly
        // overlaps 0 and therefore survives.
        let boxes = [
            BoundingBox::new(0.0, 0.0, 0.4, 0.4),
            BoundingBox::new(0.1, 0.0, 0.5, 0.4),
            BoundingBox::new(0.2, 0.0, 0.6, 0.4),
        ];
        let scores = [0.9, 0.8, 0.7];
        assert_eq!(nms_indices(&boxes, &scores, IOU_THRESHOLD), vec![0, 2]);
    }

    #[test]
    fn mismatched_lengths_use_common_prefix() {
        let boxes = [
            BoundingBox::new(0.0, 0.0, 0.1, 0.1),
            BoundingBox::new(0.5, 0.5, 0.6, 0.6),
        ];
        assert_eq!(nms_indices(&boxes, &[0.8], IOU_THRESHOLD), vec![0]);
    }
}
