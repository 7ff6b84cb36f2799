//! Fixed-layout OPC-N2 frames.
//!
//! Each frame type knows its request byte and its exact length. [`crate::Opcn2::read_frame`]
//! drives the bus for any [`Frame`], so the PM and histogram reads share one code path.
//!
//! Histogram byte map:
//!
//! | Offset | Field |
//! |---|---|
//! | 0..32  | 16 bins, `u16` each |
//! | 32..36 | bin 1/3/5/7 mass time-of-flight, raw byte / 3 |
//! | 36..40 | sample flow rate, `f32` |
//! | 40..44 | temperature or pressure, `u32` |
//! | 44..48 | sampling period, `f32` |
//! | 48..50 | checksum, `u16` |
//! | 50..62 | PM1, PM2.5, PM10 (4 bytes each) |
//!
//! The serial number (`0x10`) and information string (`0x3F`) are 60 bytes of ASCII text.

use crate::codec::{f32_from_bytes, u16_from_bytes, u32_from_bytes};
use crate::types::{HistogramFrame, InfoString, PmFrame, SerialNumber, BIN_COUNT, TEXT_LEN};

/// Length in bytes of the largest frame.
pub const MAX_FRAME_LEN: usize = HistogramFrame::LEN;

/// A buffer handed to a decoder did not have the frame's fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameLengthError {
    pub expected: usize,
    pub actual: usize,
}

/// A fixed-length frame returned by one sensor read command.
pub trait Frame: Sized {
    /// Request byte sent before reading the frame.
    const COMMAND: u8;
    /// Number of bytes clocked out after the request.
    const LEN: usize;

    /// Decode a raw frame. `raw` must be exactly [`Self::LEN`] bytes long.
    fn decode(raw: &[u8]) -> Result<Self, FrameLengthError>;
}

fn check_len<F: Frame>(raw: &[u8]) -> Result<(), FrameLengthError> {
    if raw.len() == F::LEN {
        Ok(())
    } else {
        Err(FrameLengthError {
            expected: F::LEN,
            actual: raw.len(),
        })
    }
}

fn quad(raw: &[u8], at: usize) -> [u8; 4] {
    [raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]
}

// Only valid after `check_len`.
fn pm_at(raw: &[u8], at: usize) -> PmFrame {
    PmFrame {
        pm1: quad(raw, at),
        pm2_5: quad(raw, at + 4),
        pm10: quad(raw, at + 8),
    }
}

fn mtof(raw: u8) -> f32 {
    raw as f32 / 3.0
}

impl Frame for PmFrame {
    const COMMAND: u8 = 0x32;
    const LEN: usize = 12;

    fn decode(raw: &[u8]) -> Result<Self, FrameLengthError> {
        check_len::<Self>(raw)?;
        Ok(pm_at(raw, 0))
    }
}

impl Frame for HistogramFrame {
    const COMMAND: u8 = 0x30;
    const LEN: usize = 62;

    fn decode(raw: &[u8]) -> Result<Self, FrameLengthError> {
        check_len::<Self>(raw)?;

        let mut bins = [0u16; BIN_COUNT];
        for (i, bin) in bins.iter_mut().enumerate() {
            *bin = u16_from_bytes(raw[2 * i], raw[2 * i + 1]);
        }
        let [s0, s1, s2, s3] = quad(raw, 36);
        let [t0, t1, t2, t3] = quad(raw, 40);
        let [p0, p1, p2, p3] = quad(raw, 44);

        Ok(HistogramFrame {
            bins,
            bin1_mtof: mtof(raw[32]),
            bin3_mtof: mtof(raw[33]),
            bin5_mtof: mtof(raw[34]),
            bin7_mtof: mtof(raw[35]),
            sample_flow_rate: f32_from_bytes(s0, s1, s2, s3),
            temp_or_pressure: u32_from_bytes(t0, t1, t2, t3),
            sampling_period: f32_from_bytes(p0, p1, p2, p3),
            checksum: u16_from_bytes(raw[48], raw[49]),
            pm: pm_at(raw, 50),
        })
    }
}

fn text(raw: &[u8]) -> [u8; TEXT_LEN] {
    let mut bytes = [0u8; TEXT_LEN];
    bytes.copy_from_slice(raw);
    bytes
}

impl Frame for SerialNumber {
    const COMMAND: u8 = 0x10;
    const LEN: usize = TEXT_LEN;

    fn decode(raw: &[u8]) -> Result<Self, FrameLengthError> {
        check_len::<Self>(raw)?;
        Ok(SerialNumber(text(raw)))
    }
}

impl Frame for InfoString {
    const COMMAND: u8 = 0x3F;
    const LEN: usize = TEXT_LEN;

    fn decode(raw: &[u8]) -> Result<Self, FrameLengthError> {
        check_len::<Self>(raw)?;
        Ok(InfoString(text(raw)))
    }
}

/// Decode a 12-byte particulate-mass frame.
pub fn decode_pm(raw: &[u8]) -> Result<PmFrame, FrameLengthError> {
    PmFrame::decode(raw)
}

/// Decode a 62-byte histogram frame.
pub fn decode_histogram(raw: &[u8]) -> Result<HistogramFrame, FrameLengthError> {
    HistogramFrame::decode(raw)
}
