// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! The `data.yaml` class manifest.
//!
//! Only the `names` key (and `nc`, when present) is interpreted. Every other
//! key is carried through untouched so training configuration such as
//! `train:` and `val:` paths survives a rename.

use crate::Error;
use log::debug;
use serde_yaml::{Mapping, Number, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// File name of the class manifest inside a dataset root.
pub const MANIFEST_FILE: &str = "data.yaml";

/// How the `names` key was written in the source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamesForm {
    /// `names: [a, b, c]`
    Sequence,
    /// `names: {0: a, 1: b, 2: c}`
    Mapping,
}

/// A parsed class manifest.
#[derive(Clone, Debug)]
pub struct Manifest {
    path: PathBuf,
    document: Mapping,
    names: Vec<String>,
    form: NamesForm,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingManifest(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let manifest = Self::parse(&content, path)?;
        debug!(
            "Loaded {} classes from {:?} ({:?} form)",
            manifest.names.len(),
            path,
            manifest.form
        );
        Ok(manifest)
    }

    /// Parse manifest content; `path` is where [`Manifest::save`] will write.
    pub fn parse(content: &str, path: &Path) -> Result<Self, Error> {
        let document = match serde_yaml::from_str::<Value>(content)? {
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(Error::InvalidManifest(
                    "top level must be a mapping".to_owned(),
                ));
            }
        };

        let (names, form) = match document.get("names") {
            Some(Value::Sequence(values)) => (
                values
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Result<Vec<_>, _>>()?,
                NamesForm::Sequence,
            ),
            Some(Value::Mapping(mapping)) => (names_from_mapping(mapping)?, NamesForm::Mapping),
            Some(_) => {
                return Err(Error::InvalidManifest(
                    "'names' must be a list or an index mapping".to_owned(),
                ));
            }
            None => return Err(Error::InvalidManifest("missing 'names' key".to_owned())),
        };

        Ok(Self {
            path: path.to_path_buf(),
            document,
            names,
            form,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn form(&self) -> NamesForm {
        self.form
    }

    pub fn set_names(&mut self, names: Vec<String>) {
        self.names = names;
    }

    /// Render the manifest with the current class names.
    pub fn to_yaml(&self) -> Result<String, Error> {
        let mut document = self.document.clone();

        let names = match self.form {
            NamesForm::Sequence => Value::Sequence(
                self.names
                    .iter()
                    .map(|name| Value::String(name.clone()))
                    .collect(),
            ),
            NamesForm::Mapping => Value::Mapping(
                self.names
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| {
                        (
                            Value::Number(Number::from(idx as u64)),
                            Value::String(name.clone()),
                        )
                    })
                    .collect(),
            ),
        };
        document.insert(Value::String("names".to_owned()), names);

        if document.contains_key("nc") {
            document.insert(
                Value::String("nc".to_owned()),
                Value::Number(Number::from(self.names.len() as u64)),
            );
        }

        Ok(serde_yaml::to_string(&Value::Mapping(document))?)
    }

    /// Write the manifest back to the file it was loaded from.
    pub fn save(&self) -> Result<(), Error> {
        fs::write(&self.path, self.to_yaml()?)?;
        debug!("Saved {} classes to {:?}", self.names.len(), self.path);
        Ok(())
    }
}

fn scalar_to_string(value: &Value) -> Result<String, Error> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::InvalidManifest(format!(
            "class name must be a scalar, found {:?}",
            other
        ))),
    }
}

/// Largest number of `class_{index}` placeholders a mapping may need.
const MAX_MISSING_CLASSES: usize = 1000;

/// Convert `{index: name}` into a dense list, filling gaps with `class_{index}`.
fn names_from_mapping(mapping: &Mapping) -> Result<Vec<String>, Error> {
    let mut entries = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let index = match key {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
        .and_then(|index| usize::try_from(index).ok())
        .ok_or_else(|| Error::InvalidManifest(format!("bad class index {:?}", key)))?;
        entries.push((index, scalar_to_string(value)?));
    }

    let Some(max_index) = entries.iter().map(|(index, _)| *index).max() else {
        return Ok(Vec::new());
    };
    if max_index >= entries.len() + MAX_MISSING_CLASSES {
        return Err(Error::InvalidManifest(format!(
            "class index {} leaves more than {} classes unnamed",
            max_index, MAX_MISSING_CLASSES
        )));
    }

    let mut names = vec![String::new(); max_index + 1];
    for (index, name) in entries {
        names[index] = name;
    }
    for (index, name) in names.iter_mut().enumerate() {
        if name.trim().is_empty() {
            *name = format!("class_{}", index);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sequence_names() {
        let manifest = Manifest::parse(
            "train: images\nnames: [cat, dog, 3]\n",
            Path::new("data.yaml"),
        )
        .unwrap();
        assert_eq!(manifest.names(), ["cat", "dog", "3"]);
        assert_eq!(manifest.form(), NamesForm::Sequence);
    }

    #[test]
    fn test_mapping_names_with_gap() {
        let manifest = Manifest::parse(
            "names:\n  0: cat\n  2: bird\n",
            Path::new("data.yaml"),
        )
        .unwrap();
        assert_eq!(manifest.names(), ["cat", "class_1", "bird"]);
        assert_eq!(manifest.form(), NamesForm::Mapping);
    }

    #[test]
    fn test_invalid_manifests() {
        let path = Path::new("data.yaml");
        assert!(matches!(
            Manifest::parse("train: images\n", path),
            Err(Error::InvalidManifest(_))
        ));
        assert!(matches!(
            Manifest::parse("names: cat\n", path),
            Err(Error::InvalidManifest(_))
        ));
        assert!(matches!(
            Manifest::parse("- a\n- b\n", path),
            Err(Error::InvalidManifest(_))
        ));
        assert!(matches!(
            Manifest::parse("names: [a, [b]]\n", path),
            Err(Error::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let result = Manifest::load(dir.path().join(MANIFEST_FILE));
        assert!(matches!(result, Err(Error::MissingManifest(_))));
    }

    #[test]
    fn test_save_preserves_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, "train: ../train/images\nnc: 2\nnames: [cat, dog]\n").unwrap();

        let mut manifest = Manifest::load(&path).unwrap();
        manifest.set_names(vec!["cat".into(), "dog".into(), "fox".into()]);
        manifest.save().unwrap();

        let reloaded = Manifest::load(&path).unwrap();
        assert_eq!(reloaded.names(), ["cat", "dog", "fox"]);

        let value: Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["train"].as_str(), Some("../train/images"));
        assert_eq!(value["nc"].as_u64(), Some(3));
    }

    #[test]
    fn test_save_keeps_mapping_form() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, "names:\n  0: cat\n  1: dog\n").unwrap();

        let mut manifest = Manifest::load(&path).unwrap();
        manifest.set_names(vec!["kitten".into(), "dog".into()]);
        manifest.save().unwrap();

        let value: Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["names"].is_mapping());
        assert_eq!(value["names"][0].as_str(), Some("kitten"));
        assert!(value.get("nc").is_none());
    }

    #[test]
    fn test_sparse_mapping_rejected() {
        let result = Manifest::parse(
            "names: {0: cat, 99999999999999: dog}\n",
            Path::new("data.yaml"),
        );
        assert!(matches!(result, Err(Error::InvalidManifest(_))));

        let result = Manifest::parse(
            "names: {0: cat, 18446744073709551615: dog}\n",
            Path::new("data.yaml"),
        );
        assert!(matches!(result, Err(Error::InvalidManifest(_))));

        let manifest =
            Manifest::parse("names: {0: cat, 500: dog}\n", Path::new("data.yaml")).unwrap();
        assert_eq!(manifest.names().len(), 501);
        assert_eq!(manifest.names()[250], "class_250");
    }
}
