// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Field chains from the payload root, used to locate decode failures.

use std::fmt;

/// One step in a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object field by wire name.
    Field(&'static str),
    /// Array element.
    Index(usize),
    /// Map entry with a payload-supplied key.
    Key(String),
}

impl From<&'static str> for PathSegment {
    fn from(s: &'static str) -> Self {
        Self::Field(s)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// Field chain from the root of a payload.
///
/// Renders as `outputStage.tasks[0].outputBuffers`; map keys render as
/// `queryMemoryReservations["q1"]`; the empty path renders as `$`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Segments from the root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// `true` when no segment has been pushed.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Copy of this path extended by `seg`.
    pub fn child(&self, seg: impl Into<PathSegment>) -> Self {
        let mut out = self.clone();
        out.push(seg.into());
        out
    }

    pub(crate) fn push(&mut self, seg: PathSegment) {
        self.segments.push(seg);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
                PathSegment::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for Path {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fields_indices_and_keys() {
        let path = Path::root()
            .child("outputStage")
            .child("tasks")
            .child(0)
            .child("outputBuffers")
            .child(PathSegment::Key("q1".into()));
        assert_eq!(path.to_string(), "outputStage.tasks[0].outputBuffers[\"q1\"]");
    }

    #[test]
    fn root_renders_as_dollar() {
        assert_eq!(Path::root().to_string(), "$");
        assert!(Path::root().is_root());
    }

    #[test]
    fn leading_index_has_no_separator() {
        let path: Path = [PathSegment::Index(2), PathSegment::Field("bufferId")]
            .into_iter()
            .collect();
        assert_eq!(path.to_string(), "[2].bufferId");
    }
}
