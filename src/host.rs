//! Host side of the mailbox protocol.
//!
//! [`Host`] posts an opcode, checks every [`POLL_INTERVAL_MS`] until the bridge clears the
//! command word and turns the result slots back into values.

use embedded_hal::delay::DelayNs;

use crate::codec::f32_from_words;
use crate::dispatch::BIN_SLOT;
use crate::mailbox::{Mailbox, Opcode, COMMAND_IDLE};
use crate::types::{DeviceState, BIN_COUNT};

/// PM values as floats.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PmReading {
    /// Mass Concentration PM1.0 [μg/m³]
    pub pm1: f32,
    /// Mass Concentration PM2.5 [μg/m³]
    pub pm2_5: f32,
    /// Mass Concentration PM10 [μg/m³]
    pub pm10: f32,
}

impl PmReading {
    /// Decode slots 0..6 of a mailbox.
    pub fn from_mailbox<M: Mailbox + ?Sized>(mailbox: &M) -> Self {
        Self {
            pm1: f32_from_words(mailbox.data(0), mailbox.data(1)),
            pm2_5: f32_from_words(mailbox.data(2), mailbox.data(3)),
            pm10: f32_from_words(mailbox.data(4), mailbox.data(5)),
        }
    }
}

/// Histogram as forwarded by the bridge: PM values and raw bin counts.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HistogramReading {
    pub pm: PmReading,
    /// Particle counts per size bin
    pub bins: [u16; BIN_COUNT],
}

impl HistogramReading {
    /// Decode slots 0..22 of a mailbox.
    pub fn from_mailbox<M: Mailbox + ?Sized>(mailbox: &M) -> Self {
        let mut bins = [0u16; BIN_COUNT];
        for (i, bin) in bins.iter_mut().enumerate() {
            *bin = mailbox.data(BIN_SLOT + i);
        }
        Self {
            pm: PmReading::from_mailbox(mailbox),
            bins,
        }
    }
}

/// The bridge did not finish the command within the host's timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout(pub Opcode);

/// Time between two checks of the mailbox [ms].
pub const POLL_INTERVAL_MS: u32 = 10;

pub struct Host<M, D> {
    mailbox: M,
    delay: D,
    timeout_ms: u32,
}

impl<M: Mailbox, D: DelayNs> Host<M, D> {
    /// `timeout_ms` bounds the wait for each command. A power-on that needs all three attempts
    /// keeps the bridge busy for about 80 s.
    pub fn new(mailbox: M, delay: D, timeout_ms: u32) -> Self {
        Self {
            mailbox,
            delay,
            timeout_ms,
        }
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    /// Post `opcode` and wait until the bridge clears the command word.
    pub fn execute(&mut self, opcode: Opcode) -> Result<(), Timeout> {
        self.mailbox.set_command(opcode.word());
        if self.wait_until(|m| m.command() == COMMAND_IDLE) {
            Ok(())
        } else {
            Err(Timeout(opcode))
        }
    }

    pub fn power_on(&mut self) -> Result<(), Timeout> {
        self.execute(Opcode::PowerOn)
    }

    pub fn power_off(&mut self) -> Result<(), Timeout> {
        self.execute(Opcode::PowerOff)
    }

    pub fn close(&mut self) -> Result<(), Timeout> {
        self.execute(Opcode::Close)
    }

    pub fn read_pm(&mut self) -> Result<PmReading, Timeout> {
        self.execute(Opcode::ReadPm)?;
        Ok(PmReading::from_mailbox(&self.mailbox))
    }

    pub fn read_histogram(&mut self) -> Result<HistogramReading, Timeout> {
        self.execute(Opcode::ReadHistogram)?;
        Ok(HistogramReading::from_mailbox(&self.mailbox))
    }

    pub fn device_count(&mut self) -> Result<u16, Timeout> {
        self.execute(Opcode::NumDevices)?;
        Ok(self.mailbox.data(0))
    }

    /// Read the power state.
    ///
    /// The bridge answers `ReadState` without clearing the command word, so this is the one
    /// place where the host writes a result slot: slot 0 is preset to a value the bridge never
    /// writes, completion is seen when it changes, and the command word is cleared here.
    pub fn state(&mut self) -> Result<DeviceState, Timeout> {
        const PENDING: u16 = u16::MAX;

        self.mailbox.set_data(0, PENDING);
        self.mailbox.set_command(Opcode::ReadState.word());
        if !self.wait_until(|m| m.data(0) != PENDING) {
            return Err(Timeout(Opcode::ReadState));
        }

        let word = self.mailbox.data(0);
        self.mailbox.set_command(COMMAND_IDLE);
        Ok(if word == DeviceState::On.as_word() {
            DeviceState::On
        } else {
            DeviceState::Off
        })
    }

    /// Destroys the client and returns the mailbox and delay.
    pub fn release(self) -> (M, D) {
        (self.mailbox, self.delay)
    }

    fn wait_until(&mut self, mut done: impl FnMut(&M) -> bool) -> bool {
        let mut waited: u32 = 0;
        loop {
            if done(&self.mailbox) {
                return true;
            }
            if waited >= self.timeout_ms {
                return false;
            }
            self.delay.delay_ms(POLL_INTERVAL_MS);
            waited = waited.saturating_add(POLL_INTERVAL_MS);
        }
    }
}
