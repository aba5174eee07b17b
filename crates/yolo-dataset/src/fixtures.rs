// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Temporary on-disk datasets for unit tests.

use std::{fs, path::Path};
use tempfile::TempDir;

#[ctor::ctor]
fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

pub struct DatasetFixture {
    classes: Vec<String>,
    images: Vec<(String, Option<String>)>,
}

impl DatasetFixture {
    pub fn new(classes: &[&str]) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            images: Vec::new(),
        }
    }

    /// Add an image with the given label file content.
    pub fn image(mut self, name: &str, labels: &str) -> Self {
        self.images.push((name.to_owned(), Some(labels.to_owned())));
        self
    }

    /// Add an image that has no label file at all.
    pub fn image_without_labels(mut self, name: &str) -> Self {
        self.images.push((name.to_owned(), None));
        self
    }

    pub fn build(self) -> BuiltFixture {
        let dir = TempDir::new().expect("create temp dir");
        let root = dir.path();
        fs::create_dir(root.join("images")).expect("create images dir");
        fs::create_dir(root.join("labels")).expect("create labels dir");

        let names = self
            .classes
            .iter()
            .map(|c| format!("'{}'", c.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(", ");
        fs::write(
            root.join("data.yaml"),
            format!("train: images\nval: images\nnames: [{}]\n", names),
        )
        .expect("write data.yaml");

        for (name, labels) in &self.images {
            write_test_image(&root.join("images").join(name), 64, 48);
            if let Some(labels) = labels {
                let stem = Path::new(name).file_stem().unwrap().to_string_lossy();
                fs::write(root.join("labels").join(format!("{}.txt", stem)), labels)
                    .expect("write label file");
            }
        }

        BuiltFixture { dir }
    }
}

pub struct BuiltFixture {
    dir: TempDir,
}

impl BuiltFixture {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn read_labels(&self, stem: &str) -> String {
        fs::read_to_string(self.root().join("labels").join(format!("{}.txt", stem)))
            .expect("read label file")
    }

    pub fn read_manifest(&self) -> String {
        fs::read_to_string(self.root().join("data.yaml")).expect("read data.yaml")
    }
}

pub fn write_test_image(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([40, 120, 200]))
        .save(path)
        .expect("write test image");
}
