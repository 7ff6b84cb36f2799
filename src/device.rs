use embedded_hal::delay::DelayNs;

use crate::bus::Transport;
use crate::config::{Config, ReadMode};
use crate::error::Error;
use crate::frame::{Frame, MAX_FRAME_LEN};
use crate::power::PowerController;
use crate::types::{DeviceState, HistogramFrame, InfoString, PmFrame, SerialNumber};

/// Byte clocked out while reading frame data.
const READ_FILLER: u8 = 0x00;

/// First response byte of a sensor that is ready for a command.
const READY: u8 = 0xF3;

const PING_COMMAND: u8 = 0xCF;
const FAN_POWER_COMMAND: u8 = 0x42;
const FAN_COMMAND: u8 = 0x03;
const FAN_ON: u8 = 0x04;
const FAN_OFF: u8 = 0x05;

/// OPC-N2 driver.
pub struct Opcn2<T, D> {
    bus: T,
    delay: D,
    config: Config,
    power: PowerController,
}

impl<T, D> Opcn2<T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Creates a new driver over an opened transport. The sensor is assumed to be off.
    pub fn new(bus: T, delay: D, config: Config) -> Self {
        Self {
            bus,
            delay,
            config,
            power: PowerController::new(config.timing),
        }
    }

    /// Let the freshly configured bus settle before the first command.
    pub fn setup(&mut self) {
        self.delay.delay_ms(self.config.timing.setup_settle_ms);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> DeviceState {
        self.power.state()
    }

    pub fn power(&self) -> &PowerController {
        &self.power
    }

    /// See [`PowerController::power_on`].
    pub fn power_on(&mut self) -> Result<DeviceState, Error<T::Error>> {
        self.power.power_on(&mut self.bus, &mut self.delay)
    }

    /// See [`PowerController::power_off`].
    pub fn power_off(&mut self) -> Result<DeviceState, Error<T::Error>> {
        self.power.power_off(&mut self.bus, &mut self.delay)
    }

    /// Power cycle the sensor, pausing after each half.
    pub fn reset(&mut self) -> Result<DeviceState, Error<T::Error>> {
        info!("resetting OPC");
        self.power_off()?;
        self.delay.delay_ms(self.config.timing.reset_pause_ms);
        let state = self.power_on()?;
        self.delay.delay_ms(self.config.timing.reset_pause_ms);
        Ok(state)
    }

    /// Check that the sensor answers on the bus.
    pub fn ping(&mut self) -> Result<bool, Error<T::Error>> {
        Ok(self.bus.exchange(PING_COMMAND)? == READY)
    }

    /// Set the fan power level. Returns whether the sensor acknowledged it.
    pub fn set_fan_power(&mut self, level: u8) -> Result<bool, Error<T::Error>> {
        let ready = self.bus.exchange(FAN_POWER_COMMAND)?;
        self.delay.delay_ms(self.config.timing.command_gap_ms);
        let echo = self.bus.exchange(0x00)?;
        let done = self.bus.exchange(level)?;

        let acknowledged = ready == READY && echo == FAN_POWER_COMMAND && done == 0x00;
        if !acknowledged {
            warn!("fan power level {} rejected", level);
        }
        Ok(acknowledged)
    }

    /// Switch only the fan. The laser and the tracked [`DeviceState`] are left alone.
    pub fn set_fan(&mut self, on: bool) -> Result<bool, Error<T::Error>> {
        let ready = self.bus.exchange(FAN_COMMAND)?;
        self.delay.delay_ms(self.config.timing.command_gap_ms);
        let echo = self.bus.exchange(if on { FAN_ON } else { FAN_OFF })?;

        let acknowledged = ready == READY && echo == FAN_COMMAND;
        if !acknowledged {
            warn!("fan switch rejected");
        }
        Ok(acknowledged)
    }

    /// Release the bus handle. Calling this more than once has no further effect.
    pub fn close_bus(&mut self) {
        self.bus.close();
    }

    pub fn device_count(&self) -> u16 {
        self.bus.device_count()
    }

    /// Read the particulate-mass frame.
    pub fn read_pm(&mut self) -> Result<PmFrame, Error<T::Error>> {
        self.read_frame()
    }

    /// Read the histogram frame.
    pub fn read_histogram(&mut self) -> Result<HistogramFrame, Error<T::Error>> {
        self.read_frame()
    }

    /// Read the serial number string.
    pub fn serial_number(&mut self) -> Result<SerialNumber, Error<T::Error>> {
        self.read_frame()
    }

    /// Read the information string, which carries the firmware version.
    pub fn info_string(&mut self) -> Result<InfoString, Error<T::Error>> {
        self.read_frame()
    }

    /// Request a frame, wait for the sensor to prepare it and clock it out.
    ///
    /// There is no retry: a failing transfer is returned immediately. Frames longer than
    /// [`MAX_FRAME_LEN`] are refused before anything is sent.
    pub fn read_frame<F: Frame>(&mut self) -> Result<F, Error<T::Error>> {
        if F::LEN > MAX_FRAME_LEN {
            return Err(Error::FrameLength {
                expected: F::LEN,
                actual: MAX_FRAME_LEN,
            });
        }

        debug!("requesting frame {=u8:#x}", F::COMMAND);
        self.bus.exchange(F::COMMAND)?;
        self.delay.delay_ms(self.config.timing.frame_settle_ms);

        let mut raw = [0u8; MAX_FRAME_LEN];
        let raw = &mut raw[..F::LEN];
        match self.config.read_mode {
            ReadMode::Bulk => {
                let filler = [READ_FILLER; MAX_FRAME_LEN];
                self.bus.transfer(raw, &filler[..F::LEN])?;
            }
            ReadMode::Bytewise => {
                for byte in raw.iter_mut() {
                    *byte = self.bus.exchange(READ_FILLER)?;
                    self.delay.delay_us(self.config.timing.byte_gap_us);
                }
            }
        }

        Ok(F::decode(raw)?)
    }

    /// Destroys the driver and returns the transport and delay.
    pub fn release(self) -> (T, D) {
        (self.bus, self.delay)
    }
}
