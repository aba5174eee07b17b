// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! End-to-end curation of an on-disk dataset through the public API.

use std::{fs, path::Path};
use tempfile::TempDir;
use yolo_dataset::{
    Box2d, DatasetLoader, DatasetStats, Error, Label, Manifest, NamesForm, Progress,
    RenameOutcome, Settings, SortOrder, filter_images,
};

#[ctor::ctor]
fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

fn write_image(path: &Path) {
    image::RgbImage::from_pixel(80, 60, image::Rgb([10, 200, 30]))
        .save(path)
        .unwrap();
}

/// Street scene dataset with a duplicated "person"/"pedestrian" class.
fn street_dataset() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("images")).unwrap();
    fs::create_dir(root.join("labels")).unwrap();
    fs::write(
        root.join("data.yaml"),
        "# street scenes\npath: ../street\ntrain: images\nval: images\nnc: 4\nnames:\n- person\n- car\n- pedestrian\n- bicycle\n",
    )
    .unwrap();

    let scenes = [
        ("scene_001.jpg", Some("0 0.5 0.5 0.1 0.3\n1 0.2 0.7 0.3 0.2\n")),
        ("scene_002.jpg", Some("2 0.4 0.5 0.1 0.3\n3 0.8 0.6 0.2 0.2\n")),
        ("scene_003.png", Some("2 0.6 0.5 0.1 0.3\n")),
        ("scene_004.jpg", None),
        ("notes.txt", None),
    ];
    for (name, labels) in scenes {
        let path = root.join("images").join(name);
        if name.ends_with(".txt") {
            fs::write(path, "not an image").unwrap();
            continue;
        }
        write_image(&path);
        if let Some(labels) = labels {
            let stem = name.split('.').next().unwrap();
            fs::write(root.join("labels").join(format!("{}.txt", stem)), labels).unwrap();
        }
    }
    dir
}

fn read_labels(root: &Path, stem: &str) -> String {
    fs::read_to_string(root.join("labels").join(format!("{}.txt", stem))).unwrap()
}

#[tokio::test]
async fn test_curation_workflow() {
    let dir = street_dataset();
    let root = dir.path();

    // Load with progress reporting.
    let (tx, mut rx) = tokio::sync::mpsc::channel::<Progress>(16);
    let collector = tokio::spawn(async move {
        let mut steps = Vec::new();
        while let Some(progress) = rx.recv().await {
            steps.push(progress);
        }
        steps
    });
    let mut dataset = DatasetLoader::new(Settings::default())
        .load_in_background(root.to_path_buf(), Some(tx))
        .await
        .unwrap();
    let steps = collector.await.unwrap();

    assert_eq!(
        dataset.images(),
        ["scene_001.jpg", "scene_002.jpg", "scene_003.png", "scene_004.jpg"]
    );
    assert_eq!(steps.len(), 4);
    assert_eq!(steps.last(), Some(&Progress { current: 4, total: 4 }));
    assert_eq!(
        dataset.classes(),
        ["person", "car", "pedestrian", "bicycle"]
    );

    // Annotate the unlabeled scene.
    let bbox = Box2d::new(0.3, 0.4, 0.2, 0.2);
    dataset
        .add_label("scene_004.jpg", Label::from_box(2, &bbox))
        .unwrap();
    assert_eq!(read_labels(root, "scene_004"), "2 0.3 0.4 0.2 0.2\n");

    // Merge "pedestrian" into "person"; "bicycle" shifts down.
    let outcome = dataset.rename_class(2, "person").unwrap();
    assert_eq!(outcome, RenameOutcome::Merged { into: 0, relabeled: 3 });
    assert_eq!(dataset.classes(), ["person", "car", "bicycle"]);
    assert_eq!(read_labels(root, "scene_002"), "0 0.4 0.5 0.1 0.3\n2 0.8 0.6 0.2 0.2\n");
    assert_eq!(read_labels(root, "scene_004"), "0 0.3 0.4 0.2 0.2\n");

    let manifest = Manifest::load(root.join("data.yaml")).unwrap();
    assert_eq!(manifest.form(), NamesForm::Sequence);
    assert_eq!(manifest.names(), ["person", "car", "bicycle"]);
    let raw = fs::read_to_string(root.join("data.yaml")).unwrap();
    assert!(raw.contains("nc: 3"));
    assert!(raw.contains("../street"));

    assert_eq!(
        dataset.images_for_class(0, SortOrder::Descending),
        ["scene_004.jpg", "scene_003.png", "scene_002.jpg", "scene_001.jpg"]
    );

    // Statistics reflect the merged classes.
    let stats = DatasetStats::compute(&dataset);
    assert_eq!(stats.total_images, 4);
    assert_eq!(stats.total_labels, 6);
    assert_eq!(stats.class_counts[0].name, "person");
    assert_eq!(stats.class_counts[0].count, 4);
    assert_eq!(stats.empty_image_percentage, 0.0);

    // Rename and delete images.
    let renamed = dataset.rename_image("scene_003.png", "crossing").unwrap();
    assert_eq!(renamed, "crossing.png");
    assert_eq!(read_labels(root, "crossing"), "0 0.6 0.5 0.1 0.3\n");

    let matches = filter_images(dataset.images().iter().map(String::as_str), "SCENE");
    assert_eq!(matches, ["scene_001.jpg", "scene_002.jpg", "scene_004.jpg"]);

    assert_eq!(dataset.delete_images(&["scene_001.jpg"]).unwrap(), 1);
    assert!(!root.join("images/scene_001.jpg").exists());
    assert!(!root.join("labels/scene_001.txt").exists());

    // A fresh load sees exactly what the session left on disk.
    let reloaded = DatasetLoader::default().load(root).unwrap();
    assert_eq!(
        reloaded.images(),
        ["crossing.png", "scene_002.jpg", "scene_004.jpg"]
    );
    assert_eq!(reloaded.classes(), ["person", "car", "bicycle"]);
    assert_eq!(reloaded.labels("scene_002.jpg").unwrap()[1].class_id, 2);
}

#[test]
fn test_load_rejects_incomplete_layout() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        DatasetLoader::default().load(dir.path()),
        Err(Error::MissingManifest(_))
    ));

    fs::write(dir.path().join("data.yaml"), "names: [a]\n").unwrap();
    assert!(matches!(
        DatasetLoader::default().load(dir.path()),
        Err(Error::MissingImages(_))
    ));

    fs::create_dir(dir.path().join("images")).unwrap();
    assert!(matches!(
        DatasetLoader::default().load(dir.path()),
        Err(Error::MissingLabels(_))
    ));

    fs::create_dir(dir.path().join("labels")).unwrap();
    let dataset = DatasetLoader::default().load(dir.path()).unwrap();
    assert!(dataset.images().is_empty());
    assert_eq!(dataset.classes(), ["a"]);
}

#[test]
fn test_custom_image_extensions() {
    let dir = street_dataset();
    let settings = Settings {
        image_extensions: vec!["PNG".to_owned()],
        ..Settings::default()
    };
    let dataset = DatasetLoader::new(settings).load(dir.path()).unwrap();
    assert_eq!(dataset.images(), ["scene_003.png"]);
}
