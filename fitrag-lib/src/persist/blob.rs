//! Little-endian matrix blobs shared by the index and embedding artifacts.
//!
//! Layout:
//!
//! ```text
//! magic     [u8; 4]
//! version   u16
//! dimension u32
//! rows      u32
//! values    f32 * rows * dimension, row-major
//! ```

use crate::{Error, Result};

pub const BLOB_VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 4 + 4;

/// A decoded blob
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixBlob {
    pub dimension: usize,
    pub rows: usize,
    pub values: Vec<f32>,
}

/// Encode a row-major matrix.
pub fn encode_matrix(magic: &[u8; 4], dimension: usize, rows: usize, values: &[f32]) -> Result<Vec<u8>> {
    debug_assert_eq!(values.len(), dimension * rows);

    let dimension = u32::try_from(dimension)
        .map_err(|_| Error::InvalidInput(format!("dimension {dimension} does not fit the blob header")))?;
    let rows = u32::try_from(rows).map_err(|_| Error::InvalidInput(format!("{rows} rows do not fit the blob header")))?;

    let mut buffer = Vec::with_capacity(HEADER_LEN + std::mem::size_of_val(values));
    buffer.extend_from_slice(magic);
    buffer.extend_from_slice(&BLOB_VERSION.to_le_bytes());
    buffer.extend_from_slice(&dimension.to_le_bytes());
    buffer.extend_from_slice(&rows.to_le_bytes());
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    Ok(buffer)
}

/// Decode a matrix blob, checking magic, version and length.
pub fn decode_matrix(magic: &[u8; 4], bytes: &[u8]) -> Result<MatrixBlob> {
    let what = String::from_utf8_lossy(magic);
    if bytes.len() < HEADER_LEN {
        return Err(Error::CorruptIndex(format!("{what} blob too short ({} bytes)", bytes.len())));
    }
    if &bytes[0..4] != magic {
        return Err(Error::CorruptIndex(format!("{what} blob has invalid magic")));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != BLOB_VERSION {
        return Err(Error::CorruptIndex(format!("{what} blob has unsupported version {version}")));
    }
    let dimension = read_u32(&bytes[6..10]) as usize;
    let rows = read_u32(&bytes[10..14]) as usize;

    let body = &bytes[HEADER_LEN..];
    let expected = dimension
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::CorruptIndex(format!("{what} blob header overflows")))?;
    if body.len() != expected {
        return Err(Error::CorruptIndex(format!(
            "{what} blob holds {} value bytes, header declares {expected}",
            body.len()
        )));
    }

    let values = body
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(MatrixBlob { dimension, rows, values })
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
