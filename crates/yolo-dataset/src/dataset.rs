// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! The in-memory dataset index and image-level operations.

use crate::{DatasetLayout, Error, Label, LabelFile, manifest::Manifest};
use log::{info, warn};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    fs,
    path::{Path, PathBuf},
};

/// Sort direction for image listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// A loaded YOLO dataset.
///
/// Holds the class manifest, the sorted list of image file names, and the
/// labels of every image. Mutating operations update both this index and
/// the files on disk.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub(crate) layout: DatasetLayout,
    pub(crate) manifest: Manifest,
    pub(crate) images: Vec<String>,
    pub(crate) labels: BTreeMap<String, LabelFile>,
}

impl Dataset {
    pub(crate) fn from_parts(
        layout: DatasetLayout,
        manifest: Manifest,
        images: Vec<String>,
        labels: BTreeMap<String, LabelFile>,
    ) -> Self {
        Self {
            layout,
            manifest,
            images,
            labels,
        }
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn root(&self) -> &Path {
        &self.layout.root
    }

    pub fn classes(&self) -> &[String] {
        self.manifest.names()
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn contains_image(&self, image: &str) -> bool {
        self.labels.contains_key(image)
    }

    pub fn labels(&self, image: &str) -> Option<&[Label]> {
        self.labels.get(image).map(|file| file.labels.as_slice())
    }

    /// The full label file of an image, including lines that did not parse.
    pub fn label_file(&self, image: &str) -> Option<&LabelFile> {
        self.labels.get(image)
    }

    /// Iterate over `(image, labels)` pairs in image name order.
    pub fn iter_labels(&self) -> impl Iterator<Item = (&str, &[Label])> {
        self.labels
            .iter()
            .map(|(image, file)| (image.as_str(), file.labels.as_slice()))
    }

    pub fn image_path(&self, image: &str) -> PathBuf {
        self.layout.image_path(image)
    }

    pub fn label_path(&self, image: &str) -> PathBuf {
        self.layout.label_path(image)
    }

    pub fn class_name(&self, class_id: usize) -> Option<&str> {
        self.classes().get(class_id).map(String::as_str)
    }

    /// Resolve a class given either its exact name or its index.
    ///
    /// Names win over indices, so a class literally named `"3"` is found by
    /// name before index 3 is considered.
    pub fn resolve_class(&self, name_or_index: &str) -> Result<usize, Error> {
        if let Some(idx) = self.classes().iter().position(|c| c == name_or_index) {
            return Ok(idx);
        }
        match name_or_index.parse::<usize>() {
            Ok(idx) if idx < self.classes().len() => Ok(idx),
            _ => Err(Error::InvalidClass(name_or_index.to_owned())),
        }
    }

    pub(crate) fn check_class(&self, class_id: usize) -> Result<(), Error> {
        if class_id < self.classes().len() {
            Ok(())
        } else {
            Err(Error::InvalidClass(format!(
                "index {} (dataset has {} classes)",
                class_id,
                self.classes().len()
            )))
        }
    }

    pub(crate) fn check_image(&self, image: &str) -> Result<(), Error> {
        if self.contains_image(image) {
            Ok(())
        } else {
            Err(Error::UnknownImage(image.to_owned()))
        }
    }

    /// Images with at least one label of `class_id`, sorted by name.
    pub fn images_for_class(&self, class_id: usize, order: SortOrder) -> Vec<&str> {
        let mut images: Vec<&str> = self
            .labels
            .iter()
            .filter(|(_, file)| file.labels.iter().any(|l| l.class_id == class_id))
            .map(|(image, _)| image.as_str())
            .collect();
        if order == SortOrder::Descending {
            images.reverse();
        }
        images
    }

    /// Number of images containing each class, in class order.
    pub fn class_image_counts(&self) -> Vec<(&str, usize)> {
        self.classes()
            .iter()
            .enumerate()
            .map(|(class_id, name)| {
                let count = self
                    .labels
                    .values()
                    .filter(|file| file.labels.iter().any(|l| l.class_id == class_id))
                    .count();
                (name.as_str(), count)
            })
            .collect()
    }

    /// Apply `edit` to a copy of the label file of `image`, write the result
    /// and keep it only once the write succeeded.
    pub(crate) fn update_labels<T, F>(&mut self, image: &str, edit: F) -> Result<T, Error>
    where
        F: FnOnce(&mut LabelFile) -> Result<T, Error>,
    {
        let mut file = self
            .labels
            .get(image)
            .cloned()
            .ok_or_else(|| Error::UnknownImage(image.to_owned()))?;
        let result = edit(&mut file)?;

        fs::write(self.label_path(image), file.to_string())?;
        self.labels.insert(image.to_owned(), file);
        Ok(result)
    }

    /// Remove images from the dataset and delete their image and label files.
    ///
    /// Every name is checked before anything is deleted, so an unknown name
    /// leaves the dataset untouched.
    pub fn delete_images<S: AsRef<str>>(&mut self, names: &[S]) -> Result<usize, Error> {
        for name in names {
            self.check_image(name.as_ref())?;
        }

        let mut deleted = 0;
        for name in names {
            let name = name.as_ref();
            if self.labels.remove(name).is_none() {
                // Listed twice.
                continue;
            }
            self.images.retain(|image| image != name);

            remove_if_exists(&self.layout.image_path(name))?;
            remove_if_exists(&self.layout.label_path(name))?;
            deleted += 1;
        }

        info!("Deleted {} images", deleted);
        Ok(deleted)
    }

    /// Rename an image, keeping its extension.
    ///
    /// `new_base` is the new name without extension. The image file and its
    /// label file are renamed on disk and the index is re-keyed. Returns the
    /// new image name.
    pub fn rename_image(&mut self, old: &str, new_base: &str) -> Result<String, Error> {
        self.check_image(old)?;

        let new_base = new_base.trim();
        if new_base.is_empty() || new_base.contains(['/', '\\']) || new_base == ".." {
            return Err(Error::InvalidParameters(format!(
                "invalid image name '{}'",
                new_base
            )));
        }

        let new_name = match Path::new(old).extension() {
            Some(ext) => format!("{}.{}", new_base, ext.to_string_lossy()),
            None => new_base.to_owned(),
        };
        if new_name == old {
            return Ok(new_name);
        }
        if self.contains_image(&new_name) || self.layout.image_path(&new_name).exists() {
            return Err(Error::ImageExists(new_name));
        }

        let old_label = self.layout.label_path(old);
        let new_label = self.layout.label_path(&new_name);
        // Images sharing a stem would share a label file.
        if self
            .images
            .iter()
            .any(|image| image != old && self.layout.label_path(image) == new_label)
        {
            return Err(Error::ImageExists(new_name));
        }
        if old_label.exists() && old_label != new_label && new_label.exists() {
            warn!("Replacing orphan label file {:?}", new_label);
        }

        fs::rename(self.layout.image_path(old), self.layout.image_path(&new_name))?;
        if old_label.exists() && old_label != new_label {
            fs::rename(&old_label, &new_label)?;
        }

        if let Some(labels) = self.labels.remove(old) {
            self.labels.insert(new_name.clone(), labels);
        }
        if let Some(slot) = self.images.iter_mut().find(|image| *image == old) {
            *slot = new_name.clone();
        }
        self.images.sort();

        info!("Renamed image {} -> {}", old, new_name);
        Ok(new_name)
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} images, {} classes)",
            self.layout.root.display(),
            self.images.len(),
            self.classes().len()
        )
    }
}

/// Keep image names whose lowercase form contains `text` (case-insensitive).
pub fn filter_images<'a, I>(images: I, text: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = text.to_lowercase();
    images
        .into_iter()
        .filter(|image| image.to_lowercase().contains(&needle))
        .collect()
}

fn remove_if_exists(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
