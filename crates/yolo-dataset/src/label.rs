// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! YOLO label lines.
//!
//! Each line of a label file holds a class index followed by normalized
//! coordinates. Four coordinates describe a box `cx cy w h`; a longer, even
//! list describes a polygon `x1 y1 x2 y2 ...`. Lines with any other shape
//! are kept so they survive a rewrite, but carry no geometry.
//!
//! Parsed labels remember their source line. A label whose coordinates were
//! not changed is written back with its original text, so rewriting a file
//! after an edit only alters the lines that were edited.

use crate::{Box2d, Error, Polygon};
use log::warn;
use std::{fmt, path::Path, str::FromStr};

/// Geometry carried by a [`Label`].
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Box2d(Box2d),
    Polygon(Polygon),
    Invalid,
}

/// A single object annotation from a label file.
///
/// Equality compares class and coordinates only.
#[derive(Clone, Debug)]
pub struct Label {
    pub class_id: usize,
    pub coords: Vec<f64>,
    source: Option<SourceLine>,
}

/// The line a label was parsed from, with the values it held then.
#[derive(Clone, Debug)]
struct SourceLine {
    text: String,
    class_id: usize,
    coords: Vec<f64>,
    /// Byte offset just past the class token.
    tail: usize,
}

impl Label {
    pub fn new(class_id: usize, coords: Vec<f64>) -> Self {
        Self {
            class_id,
            coords,
            source: None,
        }
    }

    /// Create a box label.
    pub fn from_box(class_id: usize, bbox: &Box2d) -> Self {
        Self::new(class_id, bbox.to_array().to_vec())
    }

    /// Create a polygon label.
    pub fn from_polygon(class_id: usize, polygon: &Polygon) -> Self {
        Self::new(
            class_id,
            polygon.points.iter().flat_map(|&(x, y)| [x, y]).collect(),
        )
    }

    /// Parse a single label line.
    ///
    /// Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, Error> {
        let mut parts = line.split_whitespace();
        let Some(class) = parts.next() else {
            return Ok(None);
        };
        let indent = line.len() - line.trim_start().len();
        let tail = indent + class.len();

        let class_id = class
            .parse::<usize>()
            .map_err(|_| Error::InvalidLabel(format!("bad class index '{}'", class)))?;

        let coords = parts
            .map(|value| {
                value
                    .parse::<f64>()
                    .map_err(|_| Error::InvalidLabel(format!("bad coordinate '{}'", value)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Self {
            class_id,
            source: Some(SourceLine {
                text: line.to_owned(),
                class_id,
                coords: coords.clone(),
                tail,
            }),
            coords,
        }))
    }

    pub fn shape(&self) -> Shape {
        match self.coords.len() {
            4 => Shape::Box2d(Box2d::new(
                self.coords[0],
                self.coords[1],
                self.coords[2],
                self.coords[3],
            )),
            n if n > 4 && n % 2 == 0 => Shape::Polygon(Polygon::from_flat(&self.coords)),
            _ => Shape::Invalid,
        }
    }

    /// The box to draw for this label, if it has geometry.
    pub fn bounding_box(&self) -> Option<Box2d> {
        match self.shape() {
            Shape::Box2d(bbox) => Some(bbox),
            Shape::Polygon(polygon) => Some(polygon.bounding_box()),
            Shape::Invalid => None,
        }
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self.shape(), Shape::Polygon(_))
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.class_id == other.class_id && self.coords == other.coords
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::parse(s)?.ok_or_else(|| Error::InvalidLabel("empty line".to_owned()))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = self.source.as_ref().filter(|s| s.coords == self.coords) {
            if source.class_id == self.class_id {
                return f.write_str(&source.text);
            }
            // Only the class changed: keep the coordinate text as written.
            return write!(f, "{}{}", self.class_id, &source.text[source.tail..]);
        }

        write!(f, "{}", self.class_id)?;
        for coord in &self.coords {
            write!(f, " {}", format_coord(*coord))?;
        }
        Ok(())
    }
}

/// Format a coordinate with at most six decimals and no trailing zeros.
fn format_coord(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "" | "-" | "-0" => "0".to_owned(),
        _ => text.to_owned(),
    }
}

/// Content of one label file.
///
/// Lines that fail to parse are not labels, but they are kept in place and
/// written back unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelFile {
    pub labels: Vec<Label>,
    /// Unparsed lines with the number of labels preceding each.
    unparsed: Vec<(usize, String)>,
}

impl LabelFile {
    pub fn new(labels: Vec<Label>) -> Self {
        Self {
            labels,
            unparsed: Vec::new(),
        }
    }

    /// Parse label file content. `source` is only used in log messages.
    pub fn parse(content: &str, source: &Path) -> Self {
        let mut file = Self::default();
        for (line_idx, line) in content.lines().enumerate() {
            match Label::parse(line) {
                Ok(Some(label)) => file.labels.push(label),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        "{}:{}: {}, keeping line unchanged",
                        source.display(),
                        line_idx + 1,
                        err
                    );
                    file.unparsed.push((file.labels.len(), line.to_owned()));
                }
            }
        }
        file
    }

    /// Lines that could not be parsed, in file order.
    pub fn unparsed_lines(&self) -> impl Iterator<Item = &str> {
        self.unparsed.iter().map(|(_, line)| line.as_str())
    }

    /// Remove the label at `index`; unparsed lines keep their neighbours.
    pub fn remove(&mut self, index: usize) -> Label {
        let removed = self.labels.remove(index);
        for (position, _) in self.unparsed.iter_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        removed
    }
}

impl fmt::Display for LabelFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut unparsed = self.unparsed.iter().peekable();
        for (idx, label) in self.labels.iter().enumerate() {
            while let Some((_, line)) = unparsed.next_if(|(position, _)| *position <= idx) {
                writeln!(f, "{}", line)?;
            }
            writeln!(f, "{}", label)?;
        }
        for (_, line) in unparsed {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
