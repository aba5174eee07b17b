// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use std::path::PathBuf;

/// Error type for YOLO dataset operations.
///
/// Covers filesystem failures, manifest parsing problems, and the
/// consistency checks performed by the label editor and rename engine.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred during file operations.
    IoError(std::io::Error),
    /// The class manifest could not be parsed or serialized.
    YamlError(serde_yaml::Error),
    /// Configuration parsing or loading error.
    ConfigError(config::ConfigError),
    /// Image decoding or encoding error.
    ImageError(image::ImageError),
    /// Image header could not be read.
    ImageSizeError(imagesize::ImageError),
    /// Background loading task failed to complete.
    JoinError(tokio::task::JoinError),
    /// The dataset root has no `data.yaml`.
    MissingManifest(PathBuf),
    /// The dataset root has no `images/` directory.
    MissingImages(PathBuf),
    /// The dataset root has no `labels/` directory.
    MissingLabels(PathBuf),
    /// The manifest does not contain a usable `names` key.
    InvalidManifest(String),
    /// The image is not part of the loaded dataset.
    UnknownImage(String),
    /// An image with the requested name already exists.
    ImageExists(String),
    /// The class is not defined in the manifest.
    InvalidClass(String),
    /// A label index beyond the image's label list.
    LabelIndexOutOfRange { image: String, index: usize, len: usize },
    /// A label line could not be parsed.
    InvalidLabel(String),
    /// Invalid parameters provided to an operation.
    InvalidParameters(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::YamlError(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigError(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageError(err)
    }
}

impl From<imagesize::ImageError> for Error {
    fn from(err: imagesize::ImageError) -> Self {
        Error::ImageSizeError(err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::JoinError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::YamlError(e) => write!(f, "YAML error: {}", e),
            Error::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Error::ImageError(e) => write!(f, "Image error: {}", e),
            Error::ImageSizeError(e) => write!(f, "Image header error: {}", e),
            Error::JoinError(e) => write!(f, "Task join error: {}", e),
            Error::MissingManifest(p) => {
                write!(f, "data.yaml file not found in {}", p.display())
            }
            Error::MissingImages(p) => write!(f, "Images directory not found: {}", p.display()),
            Error::MissingLabels(p) => write!(f, "Labels directory not found: {}", p.display()),
            Error::InvalidManifest(s) => write!(f, "Invalid manifest: {}", s),
            Error::UnknownImage(s) => write!(f, "Unknown image: {}", s),
            Error::ImageExists(s) => write!(f, "Image already exists: {}", s),
            Error::InvalidClass(s) => write!(f, "Invalid class: {}", s),
            Error::LabelIndexOutOfRange { image, index, len } => write!(
                f,
                "Label index {} out of range for {} ({} labels)",
                index, image, len
            ),
            Error::InvalidLabel(s) => write!(f, "Invalid label: {}", s),
            Error::InvalidParameters(s) => write!(f, "Invalid parameters: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::YamlError(e) => Some(e),
            Error::ConfigError(e) => Some(e),
            Error::ImageError(e) => Some(e),
            Error::ImageSizeError(e) => Some(e),
            Error::JoinError(e) => Some(e),
            _ => None,
        }
    }
}
