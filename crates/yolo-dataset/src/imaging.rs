// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Thumbnails and annotated previews.

use crate::{Error, Label};
use image::{
    Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use log::debug;
use std::path::Path;

const BOX_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BOX_THICKNESS: u32 = 2;

/// Read image dimensions from the file header without decoding pixels.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32), Error> {
    let size = imagesize::size(path)?;
    Ok((size.width as u32, size.height as u32))
}

/// Create a square thumbnail of edge `size`.
///
/// The image is shrunk (never enlarged) to fit, preserving aspect ratio, and
/// centered on a transparent background.
pub fn create_thumbnail(path: &Path, size: u32) -> Result<RgbaImage, Error> {
    let img = image::open(path)?;
    let fitted = if img.width() > size || img.height() > size {
        img.resize(size, size, FilterType::Lanczos3)
    } else {
        img
    };

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 0]));
    let x = (size - fitted.width()) / 2;
    let y = (size - fitted.height()) / 2;
    imageops::replace(&mut canvas, &fitted.to_rgba8(), x as i64, y as i64);
    Ok(canvas)
}

/// Draw the bounding box of every label and scale the result to
/// `size`×`size`.
///
/// Polygon labels are drawn as their bounding box. Labels without geometry
/// and boxes that fall outside the image are skipped.
pub fn render_preview(path: &Path, labels: &[Label], size: u32) -> Result<RgbaImage, Error> {
    let mut img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();

    let mut drawn = 0;
    for label in labels {
        let Some(rect) = label
            .bounding_box()
            .and_then(|bbox| bbox.to_pixels(width, height))
        else {
            continue;
        };

        let left = rect.left().floor() as i32;
        let top = rect.top().floor() as i32;
        let w = (rect.width().round() as u32).max(1);
        let h = (rect.height().round() as u32).max(1);

        for inset in 0..BOX_THICKNESS {
            let grow = 2 * inset;
            if w <= grow || h <= grow {
                break;
            }
            let ring = Rect::at(left + inset as i32, top + inset as i32).of_size(w - grow, h - grow);
            draw_hollow_rect_mut(&mut img, ring, BOX_COLOR);
        }
        drawn += 1;
    }
    debug!("Drew {} of {} labels on {:?}", drawn, labels.len(), path);

    Ok(imageops::resize(&img, size, size, FilterType::Lanczos3))
}
