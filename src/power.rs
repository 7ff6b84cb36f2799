//! Fan and laser power control.
//!
//! Both transitions send a 2-byte command, one byte per transfer with a short gap, and expect
//! `0xF3 0x03` back. A failed power-on is retried after 15 s, then again after the 65 s device
//! reset time, and after the third failure the bus is closed. A failed power-off waits for the
//! reset time and is retried with no attempt limit.

use embedded_hal::delay::DelayNs;

use crate::bus::Transport;
use crate::config::Timing;
use crate::error::Error;
use crate::types::DeviceState;

pub const ON_COMMAND: [u8; 2] = [0x03, 0x00];
pub const OFF_COMMAND: [u8; 2] = [0x03, 0x01];
/// Response to both power commands.
pub const ACKNOWLEDGE: [u8; 2] = [0xF3, 0x03];

/// Number of power-on attempts before the bus is closed.
pub const POWER_ON_ATTEMPTS: u32 = 3;

/// Owner of the sensor's [`DeviceState`]. The bus and delay are borrowed per transition.
#[derive(Debug, Clone)]
pub struct PowerController {
    state: DeviceState,
    timing: Timing,
    last_attempts: u32,
}

impl PowerController {
    /// The sensor is assumed to be off at power-up.
    pub fn new(timing: Timing) -> Self {
        Self {
            state: DeviceState::Off,
            timing,
            last_attempts: 0,
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Number of handshakes issued by the last power transition.
    pub fn last_attempts(&self) -> u32 {
        self.last_attempts
    }

    /// Turn the fan and laser on.
    ///
    /// Returns [`DeviceState::Off`] with the bus closed if all attempts were rejected. Transport
    /// errors abort the transition and leave the state unchanged.
    pub fn power_on<T: Transport, D: DelayNs>(
        &mut self,
        bus: &mut T,
        delay: &mut D,
    ) -> Result<DeviceState, Error<T::Error>> {
        self.last_attempts = 0;
        while self.state == DeviceState::Off {
            self.last_attempts += 1;
            let attempt = self.last_attempts;
            debug!("power on, attempt {}", attempt);

            if self.handshake(bus, delay, ON_COMMAND)? {
                self.state = DeviceState::On;
                info!("OPC powered on after {} attempt(s)", attempt);
                break;
            }

            match attempt {
                n if n >= POWER_ON_ATTEMPTS => {
                    warn!("power on failed after {} attempts, closing bus", attempt);
                    bus.close();
                    break;
                }
                1 => {
                    warn!("power on rejected, retrying in {} ms", self.timing.retry_ms);
                    delay.delay_ms(self.timing.retry_ms);
                }
                _ => {
                    warn!("power on rejected, waiting {} ms for reset", self.timing.reset_ms);
                    delay.delay_ms(self.timing.reset_ms);
                }
            }
        }
        Ok(self.state)
    }

    /// Turn the fan and laser off.
    ///
    /// Retries after every rejected handshake until the sensor acknowledges. An unreachable
    /// sensor keeps this call blocked.
    pub fn power_off<T: Transport, D: DelayNs>(
        &mut self,
        bus: &mut T,
        delay: &mut D,
    ) -> Result<DeviceState, Error<T::Error>> {
        self.last_attempts = 0;
        while self.state == DeviceState::On {
            self.last_attempts += 1;
            debug!("power off, attempt {}", self.last_attempts);

            if self.handshake(bus, delay, OFF_COMMAND)? {
                self.state = DeviceState::Off;
                info!("OPC powered off");
            } else {
                warn!("power off rejected, waiting {} ms for reset", self.timing.reset_ms);
                delay.delay_ms(self.timing.reset_ms);
            }
        }
        Ok(self.state)
    }

    fn handshake<T: Transport, D: DelayNs>(
        &self,
        bus: &mut T,
        delay: &mut D,
        command: [u8; 2],
    ) -> Result<bool, Error<T::Error>> {
        let first = bus.exchange(command[0])?;
        delay.delay_ms(self.timing.command_gap_ms);
        let second = bus.exchange(command[1])?;
        trace!("handshake response {=u8:#x} {=u8:#x}", first, second);
        Ok([first, second] == ACKNOWLEDGE)
    }
}

impl Default for PowerController {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}
