//! Binary telemetry record
//!
//! Fixed 24-byte little-endian layout emitted by the tracking process:
//!
//! ```text
//! ┌───────────────┬────────┬────────┬────────┬────────┐
//! │ timestamp i64 │ cx i32 │ cy i32 │ dx i32 │ dy i32 │
//! │ [0..8)        │ [8..12)│[12..16)│[16..20)│[20..24)│
//! └───────────────┴────────┴────────┴────────┴────────┘
//! ```
//!
//! Values are taken as-is. There is no magic byte or version field, so any
//! 24-byte datagram decodes successfully.

use serde::{Deserialize, Serialize};

use super::error::{TelemetryError, TelemetryResult};

/// Exact size of one encoded record
pub const RECORD_LEN: usize = 24;

const TIMESTAMP_OFFSET: usize = 0;
const LEFT_X_OFFSET: usize = 8;
const LEFT_Y_OFFSET: usize = 12;
const LEFT_DX_OFFSET: usize = 16;
const LEFT_DY_OFFSET: usize = 20;

/// One decoded eye-tracking sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Producer timestamp (microseconds, producer-defined epoch)
    pub timestamp_micros: i64,
    /// Left iris center X in pixels
    pub left_x: i32,
    /// Left iris center Y in pixels
    pub left_y: i32,
    /// Left iris displacement X
    pub left_delta_x: i32,
    /// Left iris displacement Y
    pub left_delta_y: i32,
}

impl TelemetrySample {
    pub fn new(
        timestamp_micros: i64,
        left_x: i32,
        left_y: i32,
        left_delta_x: i32,
        left_delta_y: i32,
    ) -> Self {
        Self {
            timestamp_micros,
            left_x,
            left_y,
            left_delta_x,
            left_delta_y,
        }
    }

    /// Decode a datagram payload.
    ///
    /// Fails with [`TelemetryError::MalformedRecord`] unless `bytes` is
    /// exactly [`RECORD_LEN`] long.
    pub fn decode(bytes: &[u8]) -> TelemetryResult<Self> {
        let record: &[u8; RECORD_LEN] =
            bytes
                .try_into()
                .map_err(|_| TelemetryError::MalformedRecord {
                    len: bytes.len(),
                    expected: RECORD_LEN,
                })?;

        Ok(Self {
            timestamp_micros: i64::from_le_bytes(field(record, TIMESTAMP_OFFSET)),
            left_x: i32::from_le_bytes(field(record, LEFT_X_OFFSET)),
            left_y: i32::from_le_bytes(field(record, LEFT_Y_OFFSET)),
            left_delta_x: i32::from_le_bytes(field(record, LEFT_DX_OFFSET)),
            left_delta_y: i32::from_le_bytes(field(record, LEFT_DY_OFFSET)),
        })
    }

    /// Encode into the wire layout
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[TIMESTAMP_OFFSET..LEFT_X_OFFSET].copy_from_slice(&self.timestamp_micros.to_le_bytes());
        buf[LEFT_X_OFFSET..LEFT_Y_OFFSET].copy_from_slice(&self.left_x.to_le_bytes());
        buf[LEFT_Y_OFFSET..LEFT_DX_OFFSET].copy_from_slice(&self.left_y.to_le_bytes());
        buf[LEFT_DX_OFFSET..LEFT_DY_OFFSET].copy_from_slice(&self.left_delta_x.to_le_bytes());
        buf[LEFT_DY_OFFSET..RECORD_LEN].copy_from_slice(&self.left_delta_y.to_le_bytes());
        buf
    }
}

/// Copy `N` bytes starting at `offset` (`offset + N <= RECORD_LEN`)
fn field<const N: usize>(record: &[u8; RECORD_LEN], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&record[offset..offset + N]);
    out
}
