//! Axis-aligned bounding boxes in normalized image coordinates.
//!
//! Coordinates are fractions of the model input frame. Boxes with
//! `left >= right` or `top >= bottom` are degenerate: they have zero area and
//! an IoU of zero with every other box, but they are never rejected.

use serde::Serialize;

/// Axis-aligned box stored in corner form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl BoundingBox {
    /// Creates a box from corner coordinates without validation.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a box from a center point and a size.
    ///
    /// Corners are not clamped, so boxes near the frame edge may extend past
    /// `[0, 1]`.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self {
            left: cx - half_w,
            top: cy - half_h,
            right: cx + half_w,
            bottom: cy + half_h,
        }
    }

    /// Horizontal extent, negative for inverted boxes.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent, negative for inverted boxes.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Returns true when the box has no positive area.
    pub fn is_degenerate(&self) -> bool {
        !(self.left < self.right && self.top < self.bottom)
    }

    /// Area of the box, or zero when degenerate.
    pub fn area(&self) -> f32 {
        if self.is_degenerate() {
            0.0
        } else {
            self.width() * self.height()
        }
    }

    /// Overlapping region of two boxes, if it has positive area.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let clipped = BoundingBox {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        if clipped.is_degenerate() {
            None
        } else {
            Some(clipped)
        }
    }

    /// Area covered by either box.
    pub fn union_area(&self, other: &BoundingBox) -> f32 {
        let inter = self.intersection(other).map_or(0.0, |b| b.area());
        self.area() + other.area() - inter
    }

    /// Intersection-over-Union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        iou(self, other)
    }

    /// Projects the box onto a display canvas that letterboxes the source
    /// image.
    ///
    /// The image is scaled by `min(canvas_w / image_w, canvas_h / image_h)`
    /// and centered; the result is `(x, y, width, height)` in canvas pixels.
    pub fn to_canvas(
        &self,
        image_width: f32,
        image_height: f32,
        canvas_width: f32,
        canvas_height: f32,
    ) -> (f32, f32, f32, f32) {
        let scale = (canvas_width / image_width).min(canvas_height / image_height);
        let offset_x = (canvas_width - image_width * scale) / 2.0;
        let offset_y = (canvas_height - image_height * scale) / 2.0;
        (
            self.left * image_width * scale + offset_x,
            self.top * image_height * scale + offset_y,
            self.width() * image_width * scale,
            self.height() * image_height * scale,
        )
    }
}

/// Intersection-over-Union of two boxes.
///
/// Returns 0 when either box is degenerate or the boxes do not overlap, so
/// the result is always finite and in `[0, 1]`.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let area_a = a.area();
    if area_a <= 0.0 {
        return 0.0;
    }
    let area_b = b.area();
    if area_b <= 0.0 {
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
