//! Wiring, SPI mode and protocol timing.

use embedded_hal::spi::{Mode, Phase, Polarity};

/// SPI mode of the OPC-N2: clock idles low, data captured on the first edge.
pub const MODE: Mode = Mode {
    polarity: Polarity::IdleLow,
    phase: Phase::CaptureOnFirstTransition,
};

/// Header pins carrying the SPI signals.
///
/// The driver never reads these. They describe the wiring for the code that opens the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pins {
    pub clk: u8,
    pub miso: u8,
    pub mosi: u8,
    pub ss: u8,
}

impl Pins {
    /// Pmod header. Pins 0, 1, 4 and 5 have pull-downs and support SPI.
    pub const PMOD: Pins = Pins {
        clk: 1,
        miso: 0,
        mosi: 4,
        ss: 5,
    };

    /// Arduino header, digital pins IO10-IO13.
    pub const ARDUINO: Pins = Pins {
        clk: 13,
        miso: 12,
        mosi: 11,
        ss: 10,
    };
}

/// How frame bytes are clocked out after the request byte.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadMode {
    /// One transfer for the whole frame.
    #[default]
    Bulk,
    /// One transfer per byte with a short gap in between.
    Bytewise,
}

/// Delays of the sensor protocol.
///
/// The defaults are dictated by the sensor and must not be shortened on real hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Between the two bytes of a power command [ms]
    pub command_gap_ms: u32,
    /// Before the second power-on attempt [ms]
    pub retry_ms: u32,
    /// Device reset wait before the third power-on attempt and between power-off attempts [ms]
    pub reset_ms: u32,
    /// After a frame request byte [ms]
    pub frame_settle_ms: u32,
    /// Between bytes in [`ReadMode::Bytewise`] [μs]
    pub byte_gap_us: u32,
    /// After the bus is configured [ms]
    pub setup_settle_ms: u32,
    /// After each half of a power cycle [ms]
    pub reset_pause_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            command_gap_ms: 10,
            retry_ms: 15_000,
            reset_ms: 65_000,
            frame_settle_ms: 12,
            byte_gap_us: 4,
            setup_settle_ms: 10,
            reset_pause_ms: 2_000,
        }
    }
}

/// Sensor configuration.
///
/// `pins` and `mode` are wiring data for whoever opens the SPI device; the driver itself only
/// uses `read_mode` and `timing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub pins: Pins,
    pub mode: Mode,
    pub read_mode: ReadMode,
    pub timing: Timing,
}

impl Config {
    /// Wiring of the older Arduino-header firmware, which also read frames byte by byte.
    pub fn arduino() -> Self {
        Self {
            pins: Pins::ARDUINO,
            read_mode: ReadMode::Bytewise,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pins: Pins::PMOD,
            mode: MODE,
            read_mode: ReadMode::Bulk,
            timing: Timing::default(),
        }
    }
}
