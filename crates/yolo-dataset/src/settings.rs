// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Layered application settings.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `settings.toml` in the user configuration directory
//! 3. An explicit settings file (for example from `--config`)
//! 4. `YOLO_DM_*` environment variables, e.g. `YOLO_DM_THUMBNAIL_SIZE=64` or
//!    `YOLO_DM_IMAGE_EXTENSIONS=png,jpg,jpeg,bmp`

use crate::Error;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// File extensions recognised as images, without the leading dot.
    pub image_extensions: Vec<String>,
    /// Edge length of generated thumbnails in pixels.
    pub thumbnail_size: u32,
    /// Edge length of rendered previews in pixels.
    pub preview_size: u32,
    /// Column width for class names in the statistics report.
    pub name_width: usize,
    /// Maximum bar length of the class chart.
    pub chart_width: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
            thumbnail_size: 40,
            preview_size: 400,
            name_width: 30,
            chart_width: 50,
        }
    }
}

impl Settings {
    /// Path of the per-user settings file, if a home directory is known.
    pub fn user_settings_path() -> Option<PathBuf> {
        ProjectDirs::from("ai", "EdgeFirst", "YOLO Dataset Manager")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Load settings from every source, with `path` taking priority over the
    /// per-user file.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        Self::load_from(Self::user_settings_path().as_deref(), path)
    }

    /// Load settings with an explicit per-user file in place of the one in
    /// the user configuration directory. The user file is optional, `path`
    /// is required when given.
    pub fn load_from(user_file: Option<&Path>, path: Option<&Path>) -> Result<Self, Error> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("image_extensions", defaults.image_extensions.clone())?
            .set_default("thumbnail_size", defaults.thumbnail_size as i64)?
            .set_default("preview_size", defaults.preview_size as i64)?
            .set_default("name_width", defaults.name_width as i64)?
            .set_default("chart_width", defaults.chart_width as i64)?;

        if let Some(user) = user_file {
            debug!("Checking user settings at {:?}", user);
            builder = builder.add_source(File::from(user).required(false));
        }

        if let Some(path) = path {
            debug!("Using settings file {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("YOLO_DM")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("image_extensions"),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        if settings.thumbnail_size == 0 || settings.preview_size == 0 {
            return Err(Error::InvalidParameters(
                "thumbnail_size and preview_size must be positive".to_owned(),
            ));
        }
        Ok(settings)
    }

    /// Returns true if `path` has one of the configured image extensions.
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.image_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}
