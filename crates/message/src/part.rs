//! A single message part

use crate::error::Result;
use crate::metadata::Metadata;

/// One part of a message batch: opaque payload bytes plus metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Part {
    data: Vec<u8>,
    metadata: Metadata,
}

impl Part {
    /// Create a part from raw payload bytes
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            metadata: Metadata::new(),
        }
    }

    /// The raw payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Replace the raw payload bytes
    pub fn set_bytes(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    /// Parse the payload as a JSON document. The parse is not cached;
    /// callers that need memoisation layer it themselves.
    pub fn structured(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_slice(&self.data)?)
    }

    /// Replace the payload with the serialised form of a JSON document
    pub fn set_structured(&mut self, value: &serde_json::Value) -> Result<()> {
        self.data = serde_json::to_vec(value)?;
        Ok(())
    }

    /// The part's metadata
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable access to the part's metadata
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_round_trip() {
        let mut part = Part::new(b"{\"n\":2}".to_vec());
        let json = part.structured().unwrap();
        assert_eq!(json["n"], 2);

        part.set_structured(&serde_json::json!({"n": 3})).unwrap();
        assert_eq!(part.as_bytes(), b"{\"n\":3}");
    }

    #[test]
    fn test_structured_rejects_invalid_json() {
        let part = Part::new(b"not json".to_vec());
        assert!(part.structured().is_err());
    }
}
