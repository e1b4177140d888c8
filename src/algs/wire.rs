//! Fixed, little-endian wire format for field values.
//!
//! Halo cells and gathered sub-ranges travel as raw IEEE-754 doubles. Every
//! value is stored pre-LE so mixed-endian groups agree on the payload.

use bytemuck::{Pod, Zeroable};
use static_assertions::{assert_eq_align, assert_eq_size};
use std::mem::size_of;

use crate::wave_error::WaveError;

/// One `f64` on the wire.
#[repr(transparent)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireValue {
    pub bits_le: u64,
}

assert_eq_size!(WireValue, f64);
assert_eq_align!(WireValue, u64);

impl WireValue {
    pub fn new(v: f64) -> Self {
        Self {
            bits_le: v.to_bits().to_le(),
        }
    }
    pub fn get(&self) -> f64 {
        f64::from_bits(u64::from_le(self.bits_le))
    }
}

/// Bytes per encoded value.
pub const VALUE_BYTES: usize = size_of::<WireValue>();

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Encode a run of values for sending.
pub fn encode_values(values: &[f64]) -> Vec<u8> {
    let wire: Vec<WireValue> = values.iter().copied().map(WireValue::new).collect();
    bytemuck::cast_slice(&wire).to_vec()
}

/// Decode a payload received from `peer`. The payload may be unaligned.
pub fn decode_values(peer: usize, bytes: &[u8]) -> Result<Vec<f64>, WaveError> {
    if bytes.len() % VALUE_BYTES != 0 {
        return Err(WaveError::comm(
            peer,
            format!(
                "payload of {} bytes is not a whole number of values",
                bytes.len()
            ),
        ));
    }
    Ok(bytes
        .chunks_exact(VALUE_BYTES)
        .map(|chunk| bytemuck::pod_read_unaligned::<WireValue>(chunk).get())
        .collect())
}

/// Decode exactly `count` values, treating a missing or short payload as a
/// communication failure.
pub fn decode_exact(
    peer: usize,
    payload: Option<Vec<u8>>,
    count: usize,
) -> Result<Vec<f64>, WaveError> {
    let bytes = payload.ok_or_else(|| WaveError::comm(peer, "no payload received"))?;
    expect_exact_len(bytes.len(), count * VALUE_BYTES).map_err(|e| WaveError::comm(peer, e))?;
    decode_values(peer, &bytes)
}
