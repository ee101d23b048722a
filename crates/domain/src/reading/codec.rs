//! Conversion between raw "read holding registers" payloads and register values.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{DomainError, Result};

/// Decode a register payload into unsigned big-endian 16-bit values, widened to `i64`.
///
/// An odd-length payload cannot hold a whole number of registers and is rejected
/// as [`DomainError::MalformedPayload`].
pub fn decode_registers(payload: &[u8]) -> Result<Vec<i64>> {
    if payload.len() % 2 != 0 {
        return Err(DomainError::MalformedPayload(format!(
            "payload length {} is not a multiple of two",
            payload.len()
        )));
    }

    Ok(payload
        .chunks_exact(2)
        .map(|pair| i64::from(u16::from_be_bytes([pair[0], pair[1]])))
        .collect())
}

/// Lay register words out the way they travel on the wire.
pub fn encode_registers(words: &[u16]) -> Bytes {
    let mut buf = BytesMut::with_capacity(words.len() * 2);
    for word in words {
        buf.put_u16(*word);
    }
    buf.freeze()
}
