//! Binary wire format for message batches
//!
//! Layout: a u32 part count, then per part a length-prefixed payload
//! followed by a u32 metadata pair count and length-prefixed key/value
//! strings. All integers are big-endian.

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::part::Part;

/// Serialise a batch into wire bytes
pub fn encode_batch(batch: &Batch) -> Vec<u8> {
    let mut output = Vec::new();
    output.extend_from_slice(&(batch.len() as u32).to_be_bytes());

    for part in batch.iter() {
        encode_bytes(&mut output, part.as_bytes());
        output.extend_from_slice(&(part.metadata().len() as u32).to_be_bytes());
        for (key, value) in part.metadata().iter() {
            encode_bytes(&mut output, key.as_bytes());
            encode_bytes(&mut output, value.as_bytes());
        }
    }

    output
}

/// Deserialise a batch from wire bytes
pub fn decode_batch(bytes: &[u8]) -> Result<Batch> {
    let mut cursor = 0;
    let part_count = decode_u32(bytes, &mut cursor)?;

    let mut batch = Batch::default();
    for _ in 0..part_count {
        let data = decode_bytes(bytes, &mut cursor)?.to_vec();
        let mut part = Part::new(data);

        let meta_count = decode_u32(bytes, &mut cursor)?;
        for _ in 0..meta_count {
            let key = decode_str(bytes, &mut cursor)?;
            let value = decode_str(bytes, &mut cursor)?;
            part.metadata_mut().insert(key, value);
        }

        batch.push(part);
    }

    if cursor != bytes.len() {
        return Err(Error::Decode(format!(
            "{} trailing bytes after batch",
            bytes.len() - cursor
        )));
    }

    Ok(batch)
}

fn encode_bytes(output: &mut Vec<u8>, bytes: &[u8]) {
    output.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    output.extend_from_slice(bytes);
}

fn decode_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32> {
    if *cursor + 4 > bytes.len() {
        return Err(Error::Decode("insufficient bytes for u32".to_string()));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(u32::from_be_bytes(buf))
}

fn decode_bytes<'a>(bytes: &'a [u8], cursor: &mut usize) -> Result<&'a [u8]> {
    let len = decode_u32(bytes, cursor)? as usize;
    if *cursor + len > bytes.len() {
        return Err(Error::Decode("insufficient bytes for field".to_string()));
    }
    let field = &bytes[*cursor..*cursor + len];
    *cursor += len;
    Ok(field)
}

fn decode_str(bytes: &[u8], cursor: &mut usize) -> Result<String> {
    let field = decode_bytes(bytes, cursor)?;
    String::from_utf8(field.to_vec()).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_with_metadata_and_empty_part() {
        let mut first = Part::new(b"{\"id\":1}".to_vec());
        first.metadata_mut().insert("topic", "orders");
        first.metadata_mut().insert("attempt", "2");
        let batch = Batch::new(vec![first, Part::new(Vec::new())]);

        let decoded = Batch::from_bytes(&batch.to_bytes()).unwrap();
        assert_eq!(decoded, batch);
    }

    #[test]
    fn test_empty_batch_round_trip() {
        let batch = Batch::default();
        let decoded = Batch::from_bytes(&batch.to_bytes()).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let batch = Batch::new(vec![Part::new(b"payload".to_vec())]);
        let bytes = batch.to_bytes();
        let err = Batch::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = Batch::default().to_bytes();
        bytes.push(0);
        let err = Batch::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
