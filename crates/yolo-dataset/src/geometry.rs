// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Coordinate conversion between YOLO label geometry and pixel space.
//!
//! ## Coordinate Systems
//!
//! - **YOLO box**: normalized 0-1, center-point `(cx, cy, w, h)`
//! - **YOLO polygon**: normalized 0-1 point list `x1 y1 x2 y2 ...`
//! - **Pixel rect**: absolute pixels, `(left, top, right, bottom)`

// =============================================================================
// Normalized Boxes
// =============================================================================

/// A normalized center/size bounding box as stored in YOLO label files.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Box2d {
    cx: f64,
    cy: f64,
    w: f64,
    h: f64,
}

impl Box2d {
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { cx, cy, w, h }
    }

    pub fn cx(&self) -> f64 {
        self.cx
    }

    pub fn cy(&self) -> f64 {
        self.cy
    }

    pub fn width(&self) -> f64 {
        self.w
    }

    pub fn height(&self) -> f64 {
        self.h
    }

    pub fn left(&self) -> f64 {
        self.cx - self.w / 2.0
    }

    pub fn top(&self) -> f64 {
        self.cy - self.h / 2.0
    }

    pub fn right(&self) -> f64 {
        self.cx + self.w / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.cy + self.h / 2.0
    }

    /// The four coordinates in label-file order.
    pub fn to_array(&self) -> [f64; 4] {
        [self.cx, self.cy, self.w, self.h]
    }

    /// Convert to a pixel rectangle clamped to the image bounds.
    ///
    /// # Arguments
    /// * `image_width` - Image width in pixels
    /// * `image_height` - Image height in pixels
    ///
    /// # Returns
    /// `None` when the clamped rectangle has no area, which happens for
    /// zero-sized boxes and boxes lying entirely outside the image.
    ///
    /// # Example
    /// ```
    /// use yolo_dataset::Box2d;
    ///
    /// let rect = Box2d::new(0.5, 0.5, 0.5, 0.5).to_pixels(640, 480).unwrap();
    /// assert_eq!(rect.left(), 160.0);
    /// assert_eq!(rect.top(), 120.0);
    /// assert_eq!(rect.right(), 480.0);
    /// assert_eq!(rect.bottom(), 360.0);
    /// ```
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> Option<PixelRect> {
        let img_w = image_width as f64;
        let img_h = image_height as f64;

        let left = (self.left() * img_w).max(0.0);
        let top = (self.top() * img_h).max(0.0);
        let right = (self.right() * img_w).min(img_w);
        let bottom = (self.bottom() * img_h).min(img_h);

        if right > left && bottom > top {
            Some(PixelRect {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Convert a pixel rectangle into a normalized box.
    ///
    /// The rectangle corners may be given in any order; they are normalized
    /// so that the resulting box has a non-negative size.
    pub fn from_pixels(rect: &PixelRect, image_width: u32, image_height: u32) -> Self {
        let img_w = image_width as f64;
        let img_h = image_height as f64;

        let left = rect.left.min(rect.right);
        let right = rect.left.max(rect.right);
        let top = rect.top.min(rect.bottom);
        let bottom = rect.top.max(rect.bottom);

        Self {
            cx: (left + right) / 2.0 / img_w,
            cy: (top + bottom) / 2.0 / img_h,
            w: (right - left) / img_w,
            h: (bottom - top) / img_h,
        }
    }
}

// =============================================================================
// Pixel Rectangles
// =============================================================================

/// An axis-aligned rectangle in absolute pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl PixelRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

impl std::fmt::Display for PixelRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.1}, {:.1}, {:.1}, {:.1}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

// =============================================================================
// Polygons
// =============================================================================

/// A normalized polygon from a YOLO segmentation label.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub points: Vec<(f64, f64)>,
}

impl Polygon {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Build a polygon from a flat `[x1, y1, x2, y2, ...]` coordinate list.
    ///
    /// A trailing unpaired value is ignored.
    pub fn from_flat(coords: &[f64]) -> Self {
        let points = coords
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        Self { points }
    }

    /// Compute the enclosing box of the polygon.
    ///
    /// The center is the midpoint of the x and y extents and the size is the
    /// extent itself. An empty polygon yields a zero box at the origin.
    ///
    /// # Example
    /// ```
    /// use yolo_dataset::Polygon;
    ///
    /// let poly = Polygon::from_flat(&[0.1, 0.2, 0.5, 0.2, 0.3, 0.6]);
    /// let bbox = poly.bounding_box();
    /// assert!((bbox.cx() - 0.3).abs() < 1e-9);
    /// assert!((bbox.cy() - 0.4).abs() < 1e-9);
    /// assert!((bbox.width() - 0.4).abs() < 1e-9);
    /// assert!((bbox.height() - 0.4).abs() < 1e-9);
    /// ```
    pub fn bounding_box(&self) -> Box2d {
        if self.points.is_empty() {
            return Box2d::new(0.0, 0.0, 0.0, 0.0);
        }

        let (x_min, x_max, y_min, y_max) = self.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(x_min, x_max, y_min, y_max), &(x, y)| {
                (x_min.min(x), x_max.max(x), y_min.min(y), y_max.max(y))
            },
        );

        Box2d::new(
            (x_min + x_max) / 2.0,
            (y_min + y_max) / 2.0,
            x_max - x_min,
            y_max - y_min,
        )
    }

    /// Scale the polygon into pixel coordinates.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> Vec<(f64, f64)> {
        let img_w = image_width as f64;
        let img_h = image_height as f64;
        self.points
            .iter()
            .map(|&(x, y)| (x * img_w, y * img_h))
            .collect()
    }
}
