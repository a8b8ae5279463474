//! Attribute tags attachable to methods
//!
//! Tags carry analysis results as named, byte-encodable attributes so a
//! later emission stage can serialize them without knowing their shape.

use crate::error::{Error, Result};

/// Name under which the taint annotator stores its result tag
pub const TAINT_TAG_NAME: &str = "TaintTag";

/// A named attribute with an encodable payload
pub trait Tag {
    /// Name identifying the tag kind inside a container
    fn name(&self) -> &str;

    /// Encoded attribute payload
    fn value(&self) -> Vec<u8>;
}

/// Ordered collection of tags on one host (a method)
#[derive(Default)]
pub struct TagContainer {
    tags: Vec<Box<dyn Tag>>,
}

impl TagContainer {
    pub fn new() -> Self {
        Self { tags: Vec::new() }
    }

    /// Attach a tag
    pub fn add_tag(&mut self, tag: Box<dyn Tag>) {
        self.tags.push(tag);
    }

    /// Look up a tag by name
    pub fn get_tag(&self, name: &str) -> Option<&dyn Tag> {
        self.tags.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Drop the tag with the given name, if attached
    pub fn remove_tag(&mut self, name: &str) {
        self.tags.retain(|t| t.name() != name);
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.get_tag(name).is_some()
    }
}

/// Per-parameter taint flags recorded on a method.
///
/// `sensitive` and `compromised` always have the same length, one flag per
/// declared parameter. A parameter that is both sensitive and compromised
/// reaches a dangerous sink and gets reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaintTag {
    sensitive: Vec<bool>,
    compromised: Vec<bool>,
    visited: bool,
}

impl TaintTag {
    /// Create a tag for a method with `param_count` parameters, all flags
    /// cleared
    pub fn new(param_count: usize) -> Self {
        Self {
            sensitive: vec![false; param_count],
            compromised: vec![false; param_count],
            visited: false,
        }
    }

    pub fn param_count(&self) -> usize {
        self.sensitive.len()
    }

    /// Mark every parameter sensitive
    pub fn mark_all_sensitive(&mut self) {
        self.sensitive.fill(true);
    }

    pub fn sensitive(&self) -> &[bool] {
        &self.sensitive
    }

    pub fn compromised(&self) -> &[bool] {
        &self.compromised
    }

    /// Fold another compromised-flag array into this tag, element-wise OR.
    ///
    /// The arrays are paired per-parameter; a length mismatch is a
    /// programmer error and is never coerced.
    pub fn merge_compromised(&mut self, other: &[bool]) -> Result<()> {
        if other.len() != self.compromised.len() {
            return Err(Error::internal(format!(
                "failed to merge compromised flags: lengths are {} and {}",
                self.compromised.len(),
                other.len()
            )));
        }
        for (flag, &incoming) in self.compromised.iter_mut().zip(other) {
            *flag |= incoming;
        }
        Ok(())
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub fn set_visited(&mut self, visited: bool) {
        self.visited = visited;
    }
}

impl Tag for TaintTag {
    fn name(&self) -> &str {
        TAINT_TAG_NAME
    }

    /// One byte per parameter of the compromised array
    fn value(&self) -> Vec<u8> {
        self.compromised.iter().map(|&c| c as u8).collect()
    }
}
