// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Aggregate annotation statistics.

use crate::Dataset;
use itertools::Itertools;
use log::warn;
use std::fmt;

const DEFAULT_NAME_WIDTH: usize = 30;

/// Label count of a single class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassCount {
    pub class_id: usize,
    pub name: String,
    pub count: usize,
    /// Share of all labels, 0-100.
    pub percentage: f64,
}

/// Dataset-wide label statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub total_images: usize,
    pub total_labels: usize,
    pub mean_labels_per_image: f64,
    /// Population standard deviation of labels per image.
    pub std_labels_per_image: f64,
    /// Share of images without labels, 0-100.
    pub empty_image_percentage: f64,
    pub num_classes: usize,
    /// Per-class counts, highest count first; ties keep class order.
    pub class_counts: Vec<ClassCount>,
    /// Labels referring to a class index outside the manifest.
    pub unknown_labels: usize,
    name_width: usize,
}

impl DatasetStats {
    pub fn compute(dataset: &Dataset) -> Self {
        let per_image: Vec<usize> = dataset
            .iter_labels()
            .map(|(_, labels)| labels.len())
            .collect();

        let total_images = dataset.images().len();
        let total_labels: usize = per_image.iter().sum();

        let (mean, std) = if per_image.is_empty() {
            (0.0, 0.0)
        } else {
            let n = per_image.len() as f64;
            let mean = total_labels as f64 / n;
            let variance = per_image
                .iter()
                .map(|&count| (count as f64 - mean).powi(2))
                .sum::<f64>()
                / n;
            (mean, variance.sqrt())
        };

        let empty_images = per_image.iter().filter(|&&count| count == 0).count();
        let empty_image_percentage = percentage(empty_images, total_images);

        let num_classes = dataset.classes().len();
        let mut counts = vec![0usize; num_classes];
        let mut unknown_labels = 0;
        for (_, labels) in dataset.iter_labels() {
            for label in labels {
                match counts.get_mut(label.class_id) {
                    Some(count) => *count += 1,
                    None => unknown_labels += 1,
                }
            }
        }
        if unknown_labels > 0 {
            warn!(
                "{} labels refer to classes missing from the manifest",
                unknown_labels
            );
        }

        let class_counts = dataset
            .classes()
            .iter()
            .zip(counts)
            .enumerate()
            .map(|(class_id, (name, count))| ClassCount {
                class_id,
                name: name.clone(),
                count,
                percentage: percentage(count, total_labels),
            })
            .sorted_by(|a, b| b.count.cmp(&a.count))
            .collect();

        Self {
            total_images,
            total_labels,
            mean_labels_per_image: mean,
            std_labels_per_image: std,
            empty_image_percentage,
            num_classes,
            class_counts,
            unknown_labels,
            name_width: DEFAULT_NAME_WIDTH,
        }
    }

    /// Set the column width used for class names in the report.
    pub fn with_name_width(mut self, width: usize) -> Self {
        self.name_width = width.max(4);
        self
    }

    /// Render per-class counts as horizontal text bars, in class order.
    ///
    /// The largest count spans `width` characters.
    pub fn bar_chart(&self, width: usize) -> String {
        let max = self
            .class_counts
            .iter()
            .map(|c| c.count)
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for class in self.class_counts.iter().sorted_by_key(|c| c.class_id) {
            let len = if max == 0 {
                0
            } else {
                (class.count * width).div_ceil(max)
            };
            out.push_str(&format!(
                "{:<name_width$} | {} {}\n",
                truncate_name(&class.name, self.name_width),
                "█".repeat(len),
                class.count,
                name_width = self.name_width,
            ));
        }
        out
    }
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Images: {}", self.total_images)?;
        writeln!(f, "Total BBoxes: {}", self.total_labels)?;
        writeln!(
            f,
            "Average BBoxes per Image: {:.2}",
            self.mean_labels_per_image
        )?;
        writeln!(
            f,
            "Std Dev of BBoxes per Image: {:.2}",
            self.std_labels_per_image
        )?;
        writeln!(
            f,
            "Percentage of Images with No BBoxes: {:.2}%",
            self.empty_image_percentage
        )?;
        writeln!(f, "Number of Classes: {}", self.num_classes)?;
        if self.unknown_labels > 0 {
            writeln!(f, "BBoxes with Unknown Class: {}", self.unknown_labels)?;
        }
        writeln!(f)?;
        writeln!(f, "BBoxes per Class:")?;
        writeln!(f)?;
        for class in &self.class_counts {
            writeln!(
                f,
                "{:<width$} : {:>5} ({:>6.2}%)",
                truncate_name(&class.name, self.name_width),
                class.count,
                class.percentage,
                width = self.name_width,
            )?;
        }
        Ok(())
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Shorten `name` to `max_len` characters, ending in `...` when cut.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() > max_len {
        let keep = max_len.saturating_sub(3);
        format!("{}...", name.chars().take(keep).collect::<String>())
    } else {
        name.to_owned()
    }
}
