// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Dataset discovery and loading.
//!
//! A YOLO dataset root is expected to contain:
//!
//! ```text
//! dataset/
//! ├── data.yaml
//! ├── images/
//! │   ├── 0001.jpg
//! │   └── 0002.png
//! └── labels/
//!     ├── 0001.txt
//!     └── 0002.txt
//! ```
//!
//! Images without a label file are loaded with an empty label list.

use crate::{
    Dataset, Error, LabelFile, Settings,
    manifest::{MANIFEST_FILE, Manifest},
};
use itertools::Itertools;
use log::{debug, info};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tokio::sync::mpsc::Sender;
use walkdir::WalkDir;

/// Loading progress, one step per image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Current number of completed items.
    pub current: usize,
    /// Total number of items to process.
    pub total: usize,
}

/// Locations of the parts of a dataset on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
    pub manifest_path: PathBuf,
}

impl DatasetLayout {
    /// Check that `root` holds a manifest plus image and label directories.
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();

        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(Error::MissingManifest(root));
        }

        let images_dir = root.join("images");
        if !images_dir.is_dir() {
            return Err(Error::MissingImages(images_dir));
        }

        let labels_dir = root.join("labels");
        if !labels_dir.is_dir() {
            return Err(Error::MissingLabels(labels_dir));
        }

        Ok(Self {
            root,
            images_dir,
            labels_dir,
            manifest_path,
        })
    }

    pub fn image_path(&self, image: &str) -> PathBuf {
        self.images_dir.join(image)
    }

    /// Label file for an image: `labels/<image stem>.txt`.
    pub fn label_path(&self, image: &str) -> PathBuf {
        let stem = Path::new(image)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| image.to_owned());
        self.labels_dir.join(format!("{}.txt", stem))
    }
}

/// List image file names directly inside `images_dir`, sorted by name.
pub fn list_images(images_dir: &Path, settings: &Settings) -> Result<Vec<String>, Error> {
    let mut images = Vec::new();
    for entry in WalkDir::new(images_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => Error::IoError(io),
            None => Error::InvalidParameters(format!(
                "cannot walk images directory {:?}",
                images_dir
            )),
        })?;

        if entry.file_type().is_file() && settings.is_image(entry.path()) {
            images.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(images.into_iter().sorted().collect())
}

/// Read a label file.
///
/// A missing file yields an empty [`LabelFile`]. Lines that cannot be parsed
/// are logged and kept as unparsed lines.
pub fn read_label_file(path: &Path) -> Result<LabelFile, Error> {
    if !path.exists() {
        return Ok(LabelFile::default());
    }

    let content = fs::read_to_string(path)?;
    Ok(LabelFile::parse(&content, path))
}

/// Builds the in-memory [`Dataset`] index from disk.
#[derive(Debug, Clone, Default)]
pub struct DatasetLoader {
    settings: Settings,
}

impl DatasetLoader {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Load a dataset on the calling thread.
    pub fn load<P: AsRef<Path>>(&self, root: P) -> Result<Dataset, Error> {
        self.load_with(root.as_ref(), |_| {})
    }

    /// Load a dataset on a blocking worker thread, reporting one
    /// [`Progress`] step per image on `progress`.
    pub async fn load_in_background(
        &self,
        root: PathBuf,
        progress: Option<Sender<Progress>>,
    ) -> Result<Dataset, Error> {
        let loader = self.clone();
        tokio::task::spawn_blocking(move || {
            loader.load_with(&root, |step| {
                if let Some(tx) = &progress {
                    // Receiver may have gone away; loading continues regardless.
                    let _ = tx.blocking_send(step);
                }
            })
        })
        .await?
    }

    fn load_with<F>(&self, root: &Path, mut on_progress: F) -> Result<Dataset, Error>
    where
        F: FnMut(Progress),
    {
        let layout = DatasetLayout::discover(root)?;
        let manifest = Manifest::load(&layout.manifest_path)?;
        let images = list_images(&layout.images_dir, &self.settings)?;

        let total = images.len();
        let mut labels = BTreeMap::new();
        for (idx, image) in images.iter().enumerate() {
            let file = read_label_file(&layout.label_path(image))?;
            debug!("{}: {} labels", image, file.labels.len());
            labels.insert(image.clone(), file);
            on_progress(Progress {
                current: idx + 1,
                total,
            });
        }

        info!(
            "Loaded {} images and {} classes from {:?}",
            total,
            manifest.names().len(),
            layout.root
        );

        Ok(Dataset::from_parts(layout, manifest, images, labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::DatasetFixture;
    use tempfile::TempDir;

    #[test]
    fn test_discover_missing_parts() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            DatasetLayout::discover(dir.path()),
            Err(Error::MissingManifest(_))
        ));

        fs::write(dir.path().join(MANIFEST_FILE), "names: [a]\n").unwrap();
        assert!(matches!(
            DatasetLayout::discover(dir.path()),
            Err(Error::MissingImages(_))
        ));

        fs::create_dir(dir.path().join("images")).unwrap();
        assert!(matches!(
            DatasetLayout::discover(dir.path()),
            Err(Error::MissingLabels(_))
        ));

        fs::create_dir(dir.path().join("labels")).unwrap();
        assert!(DatasetLayout::discover(dir.path()).is_ok());
    }

    #[test]
    fn test_label_path_uses_stem() {
        let layout = DatasetLayout {
            root: PathBuf::from("/data"),
            images_dir: PathBuf::from("/data/images"),
            labels_dir: PathBuf::from("/data/labels"),
            manifest_path: PathBuf::from("/data/data.yaml"),
        };
        assert_eq!(
            layout.label_path("frame.001.jpg"),
            PathBuf::from("/data/labels/frame.001.txt")
        );
        assert_eq!(
            layout.image_path("frame.001.jpg"),
            PathBuf::from("/data/images/frame.001.jpg")
        );
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let fixture = DatasetFixture::new(&["cat"])
            .image("b.jpg", "")
            .image("a.PNG", "")
            .build();
        fs::write(fixture.root().join("images/readme.txt"), "x").unwrap();
        fs::create_dir(fixture.root().join("images/nested.jpg")).unwrap();

        let images = list_images(&fixture.root().join("images"), &Settings::default()).unwrap();
        assert_eq!(images, vec!["a.PNG", "b.jpg"]);
    }

    #[test]
    fn test_read_label_file_keeps_bad_lines_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.txt");
        fs::write(&path, "0 0.5 0.5 0.1 0.1\n\nbad line\n1 0.1 0.1 0.2 0.1 0.2 0.2\n").unwrap();

        let file = read_label_file(&path).unwrap();
        assert_eq!(file.labels.len(), 2);
        assert_eq!(file.labels[1].class_id, 1);
        assert_eq!(file.unparsed_lines().collect::<Vec<_>>(), ["bad line"]);

        let missing = read_label_file(&dir.path().join("missing.txt")).unwrap();
        assert!(missing.labels.is_empty());
    }

    #[test]
    fn test_load_builds_index() {
        let fixture = DatasetFixture::new(&["cat", "dog"])
            .image("one.jpg", "0 0.5 0.5 0.2 0.2\n1 0.3 0.3 0.1 0.1\n")
            .image_without_labels("two.jpg")
            .build();

        let dataset = DatasetLoader::default().load(fixture.root()).unwrap();
        assert_eq!(dataset.classes(), ["cat", "dog"]);
        assert_eq!(dataset.images(), ["one.jpg", "two.jpg"]);
        assert_eq!(dataset.labels("one.jpg").unwrap().len(), 2);
        assert!(dataset.labels("two.jpg").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_in_background_reports_progress() {
        let fixture = DatasetFixture::new(&["cat"])
            .image("a.jpg", "0 0.5 0.5 0.2 0.2\n")
            .image("b.jpg", "")
            .image("c.jpg", "0 0.1 0.1 0.1 0.1\n")
            .build();

        let (tx, mut rx) = tokio::sync::mpsc::channel::<Progress>(8);
        let dataset = DatasetLoader::default()
            .load_in_background(fixture.root().to_path_buf(), Some(tx))
            .await
            .unwrap();
        assert_eq!(dataset.images().len(), 3);

        let mut steps = Vec::new();
        while let Some(step) = rx.recv().await {
            steps.push(step);
        }
        assert_eq!(steps.len(), 3);
        assert_eq!(steps.last(), Some(&Progress { current: 3, total: 3 }));
    }
}
