// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Class renaming and merging.
//!
//! Renaming a class to an unused name only touches the manifest, since label
//! files refer to classes by index. Renaming a class to the name of another
//! existing class merges the two: labels move to the surviving class, the
//! old entry is removed from the manifest, and every higher index shifts
//! down by one in all label files so indices stay dense.

use crate::{Dataset, Error, LabelFile};
use log::{debug, info, warn};
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::PathBuf,
};

/// Result of [`Dataset::rename_class`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The new name equals the current name.
    Unchanged,
    /// The class was renamed in place.
    Renamed { class_id: usize },
    /// The class was merged into an existing class.
    Merged {
        /// Index of the surviving class after the merge.
        into: usize,
        /// Number of labels moved to the surviving class.
        relabeled: usize,
    },
}

/// A label file rewritten during a remap, with its content before the write.
struct Rewrite {
    path: PathBuf,
    previous: String,
}

/// Restore rewritten files after a failed remap. Failures are logged.
fn rollback(rewrites: &[Rewrite]) {
    for rewrite in rewrites.iter().rev() {
        if let Err(err) = fs::write(&rewrite.path, &rewrite.previous) {
            warn!("Failed to restore {}: {}", rewrite.path.display(), err);
        }
    }
}

/// Apply `map` to every label of `file`. Returns true if any class changed.
fn remap_file<F>(file: &mut LabelFile, map: &F) -> bool
where
    F: Fn(usize) -> usize,
{
    let mut dirty = false;
    for label in file.labels.iter_mut() {
        let mapped = map(label.class_id);
        if mapped != label.class_id {
            label.class_id = mapped;
            dirty = true;
        }
    }
    dirty
}

impl Dataset {
    /// Rename a class, merging it into an existing class of the same name.
    pub fn rename_class(&mut self, class_id: usize, new_name: &str) -> Result<RenameOutcome, Error> {
        self.check_class(class_id)?;

        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(Error::InvalidParameters(
                "class name must not be empty".to_owned(),
            ));
        }

        let old_name = self.classes()[class_id].clone();
        if old_name == new_name {
            return Ok(RenameOutcome::Unchanged);
        }

        match self.classes().iter().position(|c| c == new_name) {
            Some(target) => self.merge_class(class_id, target),
            None => {
                let mut manifest = self.manifest.clone();
                let mut names = manifest.names().to_vec();
                names[class_id] = new_name.to_owned();
                manifest.set_names(names);
                manifest.save()?;
                self.manifest = manifest;

                info!("Renamed class {} '{}' -> '{}'", class_id, old_name, new_name);
                Ok(RenameOutcome::Renamed { class_id })
            }
        }
    }

    /// Merge `source` into `target` and drop `source` from the class list.
    ///
    /// Label files are written first and the manifest last. If any write
    /// fails the label files already written are restored and the dataset is
    /// left as it was.
    fn merge_class(&mut self, source: usize, target: usize) -> Result<RenameOutcome, Error> {
        let into = if target > source { target - 1 } else { target };
        let relabeled = self
            .iter_labels()
            .flat_map(|(_, labels)| labels)
            .filter(|label| label.class_id == source)
            .count();

        let (labels, rewrites) = self.write_remapped(&|class_id| {
            if class_id == source {
                into
            } else if class_id > source {
                class_id - 1
            } else {
                class_id
            }
        })?;

        let mut manifest = self.manifest.clone();
        let mut names = manifest.names().to_vec();
        let removed = names.remove(source);
        manifest.set_names(names);
        if let Err(err) = manifest.save() {
            rollback(&rewrites);
            return Err(err);
        }

        self.labels = labels;
        self.manifest = manifest;
        info!(
            "Merged class '{}' into '{}' ({} labels moved)",
            removed,
            self.classes()[into],
            relabeled
        );
        Ok(RenameOutcome::Merged { into, relabeled })
    }

    /// Apply `map` to the class index of every label.
    ///
    /// Rewrites the label files whose content changed, including label files
    /// in `labels/` that belong to no loaded image, then updates the
    /// in-memory index. Returns the number of files rewritten. On a failed
    /// write the files already rewritten are restored.
    pub fn remap_classes<F>(&mut self, map: F) -> Result<usize, Error>
    where
        F: Fn(usize) -> usize,
    {
        let (labels, rewrites) = self.write_remapped(&map)?;
        self.labels = labels;
        Ok(rewrites.len())
    }

    /// Write remapped label files without touching `self`. Returns the
    /// remapped index together with the files written.
    fn write_remapped<F>(
        &self,
        map: &F,
    ) -> Result<(BTreeMap<String, LabelFile>, Vec<Rewrite>), Error>
    where
        F: Fn(usize) -> usize,
    {
        let mut labels = self.labels.clone();
        let mut rewrites = Vec::new();
        match self.write_remapped_files(map, &mut labels, &mut rewrites) {
            Ok(orphans) => {
                debug!(
                    "Remapped classes in {} label files ({} without images)",
                    rewrites.len(),
                    orphans
                );
                Ok((labels, rewrites))
            }
            Err(err) => {
                rollback(&rewrites);
                Err(err)
            }
        }
    }

    fn write_remapped_files<F>(
        &self,
        map: &F,
        labels: &mut BTreeMap<String, LabelFile>,
        rewrites: &mut Vec<Rewrite>,
    ) -> Result<usize, Error>
    where
        F: Fn(usize) -> usize,
    {
        for (image, file) in labels.iter_mut() {
            let previous = file.to_string();
            if remap_file(file, map) {
                let path = self.layout.label_path(image);
                fs::write(&path, file.to_string())?;
                rewrites.push(Rewrite { path, previous });
            }
        }

        let owned: HashSet<_> = self
            .images
            .iter()
            .map(|image| self.layout.label_path(image))
            .collect();

        let mut orphans = 0;
        for entry in fs::read_dir(&self.layout.labels_dir)? {
            let path = entry?.path();
            if owned.contains(&path)
                || !path.is_file()
                || path.extension().is_none_or(|ext| ext != "txt")
            {
                continue;
            }

            let previous = fs::read_to_string(&path)?;
            let mut file = LabelFile::parse(&previous, &path);
            if remap_file(&mut file, map) {
                fs::write(&path, file.to_string())?;
                rewrites.push(Rewrite { path, previous });
                orphans += 1;
            }
        }
        Ok(orphans)
    }
}
