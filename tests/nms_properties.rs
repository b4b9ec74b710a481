use nutriscan::{iou, nms_indices, BoundingBox, IOU_THRESHOLD};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn random_box(rng: &mut StdRng) -> BoundingBox {
    let cx: f32 = rng.random_range(0.0..1.0);
    let cy: f32 = rng.random_range(0.0..1.0);
    let w: f32 = rng.random_range(0.0..0.5);
    let h: f32 = rng.random_range(0.0..0.5);
    BoundingBox::from_center(cx, cy, w, h)
}

fn random_set(rng: &mut StdRng, n: usize) -> (Vec<BoundingBox>, Vec<f32>) {
    let boxes = (0..n).map(|_| random_box(rng)).collect();
    // Coarse scores so ties are common.
    let scores = (0..n)
        .map(|_| 0.5 + rng.random_range(1..=10) as f32 * 0.05)
        .collect();
    (boxes, scores)
}

#[test]
fn iou_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let a = random_box(&mut rng);
        let b = random_box(&mut rng);
        assert_eq!(iou(&a, &b), iou(&b, &a));
        let v = iou(&a, &b);
        assert!((0.0..=1.0).contains(&v), "iou out of range: {v}");
    }
}

#[test]
fn iou_identity_and_disjoint() {
    let a = BoundingBox::new(0.1, 0.2, 0.4, 0.6);
    assert_eq!(iou(&a, &a), 1.0);
    let b = BoundingBox::new(0.5, 0.2, 0.9, 0.6);
    assert_eq!(iou(&a, &b), 0.0);
}

#[test]
fn nms_indices_are_unique_and_bounded() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in [0usize, 1, 2, 5, 40, 300] {
        let (boxes, scores) = random_set(&mut rng, n);
        let kept = nms_indices(&boxes, &scores, IOU_THRESHOLD);
        assert!(kept.len() <= n);
        let unique: HashSet<usize> = kept.iter().copied().collect();
        assert_eq!(unique.len(), kept.len(), "duplicate index in {kept:?}");
        assert!(kept.iter().all(|&i| i < n));
    }
}

#[test]
fn kept_boxes_never_overlap_above_threshold() {
    let mut rng = StdRng::seed_from_u64(99);
    let (boxes, scores) = random_set(&mut rng, 200);
    let kept = nms_indices(&boxes, &scores, IOU_THRESHOLD);
    for (pos, &i) in kept.iter().enumerate() {
        for &j in &kept[pos + 1..] {
            assert!(iou(&boxes[i], &boxes[j]) <= IOU_THRESHOLD);
        }
    }
}

#[test]
fn kept_order_is_descending_score_with_stable_ties() {
    let mut rng = StdRng::seed_from_u64(5);
    let (boxes, scores) = random_set(&mut rng, 120);
    let kept = nms_indices(&boxes, &scores, IOU_THRESHOLD);
    for pair in kept.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(scores[a] > scores[b] || (scores[a] == scores[b] && a < b));
    }
}

#[test]
fn threshold_at_or_above_max_iou_keeps_everything() {
    let mut rng = StdRng::seed_from_u64(11);
    let (mut boxes, mut scores) = random_set(&mut rng, 60);
    // Exact duplicate: IoU 1.0, which is not strictly greater than 1.0.
    boxes.push(boxes[0]);
    scores.push(scores[0]);

    let kept = nms_indices(&boxes, &scores, 1.0);
    assert_eq!(kept.len(), boxes.len());

    let mut max_iou = 0.0f32;
    for i in 0..boxes.len() {
        for j in i + 1..boxes.len() {
            max_iou = max_iou.max(iou(&boxes[i], &boxes[j]));
        }
    }
    let kept = nms_indices(&boxes, &scores, max_iou);
    assert_eq!(kept.len(), boxes.len());
}

#[test]
fn survivors_in_the_hundreds_are_handled() {
    let mut rng = StdRng::seed_from_u64(3);
    let (boxes, scores) = random_set(&mut rng, 2100);
    let kept = nms_indices(&boxes, &scores, IOU_THRESHOLD);
    assert!(!kept.is_empty());
    assert!(kept.len() <= boxes.len());
}
