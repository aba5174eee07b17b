// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Per-image label editing.
//!
//! Each edit is written to the image's label file before returning, creating
//! the file when the image had none.

use crate::{Dataset, Error, Label};
use log::debug;

impl Dataset {
    fn check_index(&self, image: &str, index: usize) -> Result<(), Error> {
        let len = self.labels(image).map(<[Label]>::len).unwrap_or(0);
        if index < len {
            Ok(())
        } else {
            Err(Error::LabelIndexOutOfRange {
                image: image.to_owned(),
                index,
                len,
            })
        }
    }

    /// Append a label to an image. Returns the index of the new label.
    pub fn add_label(&mut self, image: &str, label: Label) -> Result<usize, Error> {
        self.check_image(image)?;
        self.check_class(label.class_id)?;

        let index = self.update_labels(image, |file| {
            file.labels.push(label);
            Ok(file.labels.len() - 1)
        })?;
        debug!("{}: added label {}", image, index);
        Ok(index)
    }

    /// Remove the label at `index` and return it.
    pub fn delete_label(&mut self, image: &str, index: usize) -> Result<Label, Error> {
        self.check_image(image)?;
        self.check_index(image, index)?;

        let removed = self.update_labels(image, |file| Ok(file.remove(index)))?;
        debug!("{}: deleted label {}", image, index);
        Ok(removed)
    }

    /// Assign a different class to the label at `index`.
    pub fn change_label_class(
        &mut self,
        image: &str,
        index: usize,
        class_id: usize,
    ) -> Result<(), Error> {
        self.check_image(image)?;
        self.check_index(image, index)?;
        self.check_class(class_id)?;

        self.update_labels(image, |file| {
            file.labels[index].class_id = class_id;
            Ok(())
        })?;
        debug!("{}: label {} now class {}", image, index, class_id);
        Ok(())
    }

    /// Replace all labels of an image. Unparsed lines of the file are kept.
    pub fn set_labels(&mut self, image: &str, labels: Vec<Label>) -> Result<(), Error> {
        self.check_image(image)?;
        for label in &labels {
            self.check_class(label.class_id)?;
        }

        self.update_labels(image, |file| {
            file.labels = labels;
            Ok(())
        })
    }
}
