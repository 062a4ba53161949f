//! An ordered batch of message parts

use crate::codec;
use crate::error::{Error, Result};
use crate::part::Part;

/// An ordered collection of [`Part`]s.
///
/// A batch is the unit persisted by the durable buffer and referenced by the
/// mapping interpreter. `Clone` deep-copies every part.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    parts: Vec<Part>,
}

impl Batch {
    /// Create a batch from a list of parts
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// Append a part to the batch
    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// The part at `index`, if present
    pub fn part(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    /// Mutable access to the part at `index`, if present
    pub fn part_mut(&mut self, index: usize) -> Option<&mut Part> {
        self.parts.get_mut(index)
    }

    /// Number of parts in the batch
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the batch has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Iterate over the parts in order
    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    /// Parse the part at `index` as a JSON document, failing with
    /// [`Error::PartNotExist`] when the index is out of range.
    pub fn structured(&self, index: usize) -> Result<serde_json::Value> {
        let part = self.part(index).ok_or(Error::PartNotExist {
            index,
            length: self.len(),
        })?;
        part.structured()
    }

    /// Serialise the batch into its wire format
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode_batch(self)
    }

    /// Deserialise a batch from its wire format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode_batch(bytes)
    }
}

impl FromIterator<Part> for Batch {
    fn from_iter<I: IntoIterator<Item = Part>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}
