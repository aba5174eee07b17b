// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # YOLO Dataset Manager Library
//!
//! Load, inspect and curate object detection datasets stored in the YOLO
//! layout: a `data.yaml` manifest naming the classes, an `images/` directory,
//! and a `labels/` directory with one text file per image holding
//! `class cx cy w h` rows in normalized coordinates.
//!
//! ## Features
//!
//! - **Loading**: Discover the dataset layout and index every image and its
//!   labels, optionally on a background thread with progress reporting
//! - **Label Editing**: Add, delete and reclassify labels; every edit is
//!   written back to disk immediately
//! - **Class Management**: Rename classes, or merge one class into another by
//!   renaming it to an existing name
//! - **Image Management**: Filter, delete and rename images together with
//!   their label files
//! - **Statistics**: Label counts, per-image distribution and per-class
//!   breakdown
//! - **Imaging**: Thumbnails and previews with bounding boxes drawn
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use yolo_dataset::{DatasetLoader, DatasetStats, Error};
//!
//! fn main() -> Result<(), Error> {
//!     let mut dataset = DatasetLoader::default().load("datasets/coco8")?;
//!
//!     // Merge "kitty" into "cat".
//!     let kitty = dataset.resolve_class("kitty")?;
//!     dataset.rename_class(kitty, "cat")?;
//!
//!     println!("{}", DatasetStats::compute(&dataset));
//!     Ok(())
//! }
//! ```

mod dataset;
mod editor;
mod error;
mod geometry;
pub mod imaging;
pub mod label;
mod loader;
pub mod manifest;
mod rename;
mod settings;
mod stats;

pub use crate::{
    dataset::{Dataset, SortOrder, filter_images},
    error::Error,
    geometry::{Box2d, PixelRect, Polygon},
    imaging::{create_thumbnail, image_dimensions, render_preview},
    label::{Label, LabelFile, Shape},
    loader::{DatasetLayout, DatasetLoader, Progress, list_images, read_label_file},
    manifest::{Manifest, NamesForm},
    rename::RenameOutcome,
    settings::Settings,
    stats::{ClassCount, DatasetStats, truncate_name},
};

#[cfg(test)]
mod fixtures;
