use crate::checksum::histogram_checksum;
use crate::codec::{f32_from_bytes, words_from_bytes};

/// Number of histogram bins reported by the OPC-N2.
pub const BIN_COUNT: usize = 16;

/// Logical power state of the fan and laser.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum DeviceState {
    /// Assumed at power-up.
    #[default]
    Off = 0,
    On = 1,
}

impl DeviceState {
    /// Register representation: 0 for off, 1 for on.
    pub const fn as_word(self) -> u16 {
        self as u16
    }
}

/// OPC-N2 particulate-mass frame.
///
/// The mass values are kept in the sensor's 4-byte little-endian form so that they can be
/// forwarded to the host untouched. Use the `*_f32` accessors for the float view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PmFrame {
    /// Mass Concentration PM1.0 [μg/m³], raw bytes
    pub pm1: [u8; 4],
    /// Mass Concentration PM2.5 [μg/m³], raw bytes
    pub pm2_5: [u8; 4],
    /// Mass Concentration PM10 [μg/m³], raw bytes
    pub pm10: [u8; 4],
}

impl PmFrame {
    pub fn pm1_f32(&self) -> f32 {
        as_f32(self.pm1)
    }

    pub fn pm2_5_f32(&self) -> f32 {
        as_f32(self.pm2_5)
    }

    pub fn pm10_f32(&self) -> f32 {
        as_f32(self.pm10)
    }

    /// The three values as low/high register word pairs: pm1, pm2_5, pm10.
    pub fn to_words(&self) -> [u16; 6] {
        let [pm1_lo, pm1_hi] = words_from_bytes(self.pm1);
        let [pm2_5_lo, pm2_5_hi] = words_from_bytes(self.pm2_5);
        let [pm10_lo, pm10_hi] = words_from_bytes(self.pm10);
        [pm1_lo, pm1_hi, pm2_5_lo, pm2_5_hi, pm10_lo, pm10_hi]
    }
}

fn as_f32(b: [u8; 4]) -> f32 {
    f32_from_bytes(b[0], b[1], b[2], b[3])
}

/// OPC-N2 histogram frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HistogramFrame {
    /// Particle counts per size bin
    pub bins: [u16; BIN_COUNT],
    /// Bin 1 mass time-of-flight [μs]
    pub bin1_mtof: f32,
    /// Bin 3 mass time-of-flight [μs]
    pub bin3_mtof: f32,
    /// Bin 5 mass time-of-flight [μs]
    pub bin5_mtof: f32,
    /// Bin 7 mass time-of-flight [μs]
    pub bin7_mtof: f32,
    /// Sample flow rate [ml/s]
    pub sample_flow_rate: f32,
    /// Temperature [°C] [×10] or pressure [Pa], depending on the sensor's multiplexing
    pub temp_or_pressure: u32,
    /// Sampling period [s]
    pub sampling_period: f32,
    /// Low 16 bits of the sum of all bins, as sent by the sensor
    pub checksum: u16,
    pub pm: PmFrame,
}

impl HistogramFrame {
    /// Sum of all bin counts, truncated to 16 bits like the sensor's checksum.
    pub fn bin_sum(&self) -> u16 {
        histogram_checksum(&self.bins)
    }

    /// Whether the transmitted checksum matches the received bins.
    pub fn checksum_valid(&self) -> bool {
        self.bin_sum() == self.checksum
    }

    /// `temp_or_pressure` read as a temperature.
    pub fn temperature_celsius(&self) -> f32 {
        self.temp_or_pressure as f32 / 10.0
    }

    /// `temp_or_pressure` read as a pressure.
    pub fn pressure_pa(&self) -> u32 {
        self.temp_or_pressure
    }
}

/// Length of the serial number and information strings.
pub const TEXT_LEN: usize = 60;

const FIRMWARE_TAG: &str = "FirmwareVer=";

/// Serial number string, e.g. `OPC-N2 123456789`. Only firmware 18 and later answer it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialNumber(pub [u8; TEXT_LEN]);

impl SerialNumber {
    /// The serial number without padding, or `None` if the sensor sent non-UTF-8 bytes.
    pub fn as_str(&self) -> Option<&str> {
        trimmed(&self.0)
    }
}

/// Information string, e.g. `OPC-N2 FirmwareVer=OPC-018.2....................BD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InfoString(pub [u8; TEXT_LEN]);

impl InfoString {
    pub fn as_str(&self) -> Option<&str> {
        trimmed(&self.0)
    }

    /// Text between `FirmwareVer=` and the dot padding, e.g. `OPC-018.2`.
    pub fn firmware_version(&self) -> Option<&str> {
        let info = self.as_str()?;
        let start = info.find(FIRMWARE_TAG)? + FIRMWARE_TAG.len();
        let len = info[start..].find("...")?;
        Some(&info[start..start + len])
    }
}

fn trimmed(bytes: &[u8]) -> Option<&str> {
    core::str::from_utf8(bytes)
        .ok()
        .map(|s| s.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
}
