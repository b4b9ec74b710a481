use criterion::{criterion_group, criterion_main, Criterion};
use nutriscan::{
    decode_candidates, nms_candidates, ClassLabels, Detector, NutritionEntry, NutritionTable,
    OwnedRgbImage, TensorView, DEFAULT_NUM_BOXES, INPUT_SIZE, IOU_THRESHOLD,
};
use std::hint::black_box;

/// Deterministic detector output with clusters of overlapping confident boxes.
fn make_tensor(num_classes: usize, num_boxes: usize, confident_every: usize) -> Vec<f32> {
    let mut data = vec![0.0f32; (num_classes + 4) * num_boxes];
    for i in 0..num_boxes {
        let cell = i / 8;
        data[i] = ((cell * 37) % 100) as f32 / 100.0;
        data[num_boxes + i] = ((cell * 61) % 100) as f32 / 100.0;
        data[2 * num_boxes + i] = 0.1 + (i % 8) as f32 * 0.005;
        data[3 * num_boxes + i] = 0.1;
        for j in 0..num_classes {
            let base = ((i * 13) ^ (j * 7)) % 40;
            data[(j + 4) * num_boxes + i] = base as f32 / 100.0;
        }
        if i % confident_every == 0 {
            let class = i % num_classes;
            data[(class + 4) * num_boxes + i] = 0.6 + (i % 37) as f32 / 100.0;
        }
    }
    data
}

fn food_detector() -> Detector {
    let labels = ClassLabels::default_foods();
    let table = NutritionTable::from_entries(labels.iter().map(|label| {
        (
            label.to_string(),
            NutritionEntry {
                calories: 150,
                portion: "1 porsi".to_string(),
            },
        )
    }));
    Detector::new(labels, table)
}

fn bench_postprocess(c: &mut Criterion) {
    let num_classes = 3;
    let sparse = make_tensor(num_classes, DEFAULT_NUM_BOXES, 40);
    let dense = make_tensor(num_classes, DEFAULT_NUM_BOXES, 4);
    let sparse_view = TensorView::new(&sparse, num_classes, DEFAULT_NUM_BOXES).unwrap();
    let dense_view = TensorView::new(&dense, num_classes, DEFAULT_NUM_BOXES).unwrap();

    c.bench_function("decode_2100_boxes", |b| {
        b.iter(|| black_box(decode_candidates(&dense_view)));
    });

    let candidates = decode_candidates(&dense_view);
    c.bench_function("nms_dense_survivors", |b| {
        b.iter(|| black_box(nms_candidates(&candidates, IOU_THRESHOLD)));
    });

    let detector = food_detector();
    c.bench_function("detect_tensor_sparse", |b| {
        b.iter(|| black_box(detector.detect_tensor(&sparse_view).unwrap()));
    });
    c.bench_function("detect_tensor_dense", |b| {
        b.iter(|| black_box(detector.detect_tensor(&dense_view).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let parallel = Detector::builder(ClassLabels::default_foods(), detector.table().clone())
            .parallel(true)
            .build()
            .unwrap();
        c.bench_function("detect_tensor_dense_parallel", |b| {
            b.iter(|| black_box(parallel.detect_tensor(&dense_view).unwrap()));
        });
    }
}

fn bench_preprocess(c: &mut Criterion) {
    let width = 1280;
    let height = 720;
    let mut pixels = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x & 0xFF) as u8, (y & 0xFF) as u8, ((x ^ y) & 0xFF) as u8]);
        }
    }
    let image = OwnedRgbImage::new(pixels, width, height).unwrap();

    c.bench_function("resize_normalize_720p", |b| {
        b.iter(|| {
            black_box(nutriscan::image::preprocess::resize_normalize(
                image.view(),
                INPUT_SIZE,
            ))
        });
    });
}

criterion_group!(benches, bench_postprocess, bench_preprocess);
criterion_main!(benches);
