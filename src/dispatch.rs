//! The bridge's control loop.
//!
//! Result layout:
//!
//! | Opcode | Slots |
//! |---|---|
//! | `ReadPm` | 0..6: pm1 lo/hi, pm2_5 lo/hi, pm10 lo/hi |
//! | `ReadHistogram` | 0..6 as above from the embedded PM values, 6..22: bins 0..15 |
//! | `NumDevices` | 0: device count |
//! | `ReadState` | 0: 0 off, 1 on |
//!
//! `ReadState` does not clear the command word. Hosts clear it themselves after reading slot 0.
//!
//! A command that fails on the bus writes no results. Its command word is cleared so the host
//! is not left waiting, and the bridge keeps serving commands.

use embedded_hal::delay::DelayNs;

use crate::bus::Transport;
use crate::device::Opcn2;
use crate::error::Error;
use crate::mailbox::{Mailbox, Opcode, COMMAND_IDLE, COMMAND_POSTED};
use crate::types::{HistogramFrame, PmFrame, BIN_COUNT};

/// First slot of the histogram bins.
pub const BIN_SLOT: usize = 6;

/// What a processed command word turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Completed(Opcode),
    /// Not a known opcode. The word was cleared without side effects.
    Ignored(u32),
}

/// Pack a PM frame into its six result slots.
pub fn pack_pm(pm: &PmFrame) -> [u16; 6] {
    pm.to_words()
}

/// Pack a histogram frame into its twenty-two result slots.
pub fn pack_histogram(hist: &HistogramFrame) -> [u16; BIN_SLOT + BIN_COUNT] {
    let mut words = [0u16; BIN_SLOT + BIN_COUNT];
    words[..BIN_SLOT].copy_from_slice(&pack_pm(&hist.pm));
    words[BIN_SLOT..].copy_from_slice(&hist.bins);
    words
}

pub struct Dispatcher<T, D, M> {
    opc: Opcn2<T, D>,
    mailbox: M,
}

impl<T, D, M> Dispatcher<T, D, M>
where
    T: Transport,
    D: DelayNs,
    M: Mailbox,
{
    pub fn new(opc: Opcn2<T, D>, mailbox: M) -> Self {
        Self { opc, mailbox }
    }

    pub fn opc(&self) -> &Opcn2<T, D> {
        &self.opc
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    pub fn mailbox_mut(&mut self) -> &mut M {
        &mut self.mailbox
    }

    /// Process forever.
    pub fn run(&mut self) -> ! {
        loop {
            // failures are logged and dropped by `poll`
            let _ = self.step();
        }
    }

    /// Wait for the next command and process it.
    pub fn step(&mut self) -> Result<Option<Outcome>, Error<T::Error>> {
        self.wait_for_command();
        self.poll()
    }

    /// Spin until the host posts a command.
    pub fn wait_for_command(&mut self) {
        while self.mailbox.command() & COMMAND_POSTED == 0 {
            core::hint::spin_loop();
        }
    }

    /// Process the posted command, if any.
    ///
    /// On a bus error nothing is written, the command word is cleared and the error returned.
    pub fn poll(&mut self) -> Result<Option<Outcome>, Error<T::Error>> {
        let word = self.mailbox.command();
        if word & COMMAND_POSTED == 0 {
            return Ok(None);
        }

        let Some(opcode) = Opcode::from_word(word) else {
            debug!("ignoring unknown command {=u32:#x}", word);
            self.mailbox.set_command(COMMAND_IDLE);
            return Ok(Some(Outcome::Ignored(word)));
        };

        trace!("command {}", opcode);
        match self.execute(opcode) {
            Ok(true) => self.mailbox.set_command(COMMAND_IDLE),
            Ok(false) => {}
            Err(e) => {
                warn!("command {} failed on the bus, dropping it", opcode);
                self.mailbox.set_command(COMMAND_IDLE);
                return Err(e);
            }
        }
        Ok(Some(Outcome::Completed(opcode)))
    }

    /// Run one command. Returns whether its command word should be cleared.
    fn execute(&mut self, opcode: Opcode) -> Result<bool, Error<T::Error>> {
        match opcode {
            Opcode::Config => {}
            Opcode::PowerOn => {
                self.opc.power_on()?;
            }
            Opcode::PowerOff => {
                self.opc.power_off()?;
            }
            Opcode::Close => self.opc.close_bus(),
            Opcode::ReadPm => {
                let pm = self.opc.read_pm()?;
                self.mailbox.write_slots(0, &pack_pm(&pm));
            }
            Opcode::ReadHistogram => {
                let hist = self.opc.read_histogram()?;
                if !hist.checksum_valid() {
                    warn!(
                        "histogram checksum mismatch: sent {=u16:#x}, bins sum to {=u16:#x}",
                        hist.checksum,
                        hist.bin_sum()
                    );
                }
                self.mailbox.write_slots(0, &pack_histogram(&hist));
            }
            Opcode::NumDevices => {
                let count = self.opc.device_count();
                self.mailbox.set_data(0, count);
            }
            Opcode::ReadState => {
                self.mailbox.set_data(0, self.opc.state().as_word());
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn release(self) -> (Opcn2<T, D>, M) {
        (self.opc, self.mailbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SpiTransport;
    use crate::codec::{f32_to_bytes, u32_from_bytes};
    use crate::config::Config;
    use crate::mailbox::MemoryMailbox;
    use crate::power::{ACKNOWLEDGE, OFF_COMMAND, ON_COMMAND};
    use crate::testing::{frame_read, handshake, FailingBus, RecordingDelay};
    use crate::types::DeviceState;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    type MockDispatcher = Dispatcher<SpiTransport<SpiMock<u8>>, RecordingDelay, MemoryMailbox>;

    fn dispatcher(expectations: &[SpiTransaction<u8>]) -> MockDispatcher {
        let opc = Opcn2::new(
            SpiTransport::new(SpiMock::new(expectations)),
            RecordingDelay::default(),
            Config::default(),
        );
        Dispatcher::new(opc, MemoryMailbox::new())
    }

    fn post(d: &mut MockDispatcher, op: Opcode) -> Option<Outcome> {
        d.mailbox_mut().set_command(op.word());
        d.poll().unwrap()
    }

    fn finish(d: MockDispatcher) {
        let (opc, _) = d.release();
        let (bus, _) = opc.release();
        bus.release().done();
    }

    fn histogram_bytes() -> Vec<u8> {
        let mut raw = vec![0u8; 62];
        for i in 0..16 {
            raw[2 * i] = i as u8 + 1;
        }
        raw[48..50].copy_from_slice(&136u16.to_le_bytes());
        raw[50..54].copy_from_slice(&f32_to_bytes(1.0));
        raw[54..58].copy_from_slice(&f32_to_bytes(2.0));
        raw[58..62].copy_from_slice(&f32_to_bytes(3.0));
        raw
    }

    #[test]
    fn idle_mailbox() {
        let mut d = dispatcher(&[]);
        assert_eq!(d.poll(), Ok(None));
        d.mailbox_mut().set_command(0x2);
        assert_eq!(d.poll(), Ok(None));
        assert_eq!(d.mailbox().command(), 0x2);
        finish(d);
    }

    #[test]
    fn config_is_a_no_op() {
        let mut d = dispatcher(&[]);
        assert_eq!(
            post(&mut d, Opcode::Config),
            Some(Outcome::Completed(Opcode::Config))
        );
        assert_eq!(d.mailbox(), &MemoryMailbox::new());
        finish(d);
    }

    #[test]
    fn read_pm_registers() {
        let raw = [0x11, 0x22, 0x33, 0x44, 5, 6, 7, 8, 9, 10, 11, 12];
        let mut d = dispatcher(&frame_read(0x32, &raw));

        post(&mut d, Opcode::ReadPm);

        let data = d.mailbox().data;
        let [b0, b1] = data[0].to_le_bytes();
        let [b2, b3] = data[1].to_le_bytes();
        assert_eq!(u32_from_bytes(b0, b1, b2, b3), 0x4433_2211);
        assert_eq!(&data[..6], &[0x2211, 0x4433, 0x0605, 0x0807, 0x0A09, 0x0C0B]);
        assert!(data[6..].iter().all(|w| *w == 0));
        assert_eq!(d.mailbox().command(), COMMAND_IDLE);
        finish(d);
    }

    #[test]
    fn read_histogram_registers() {
        let mut d = dispatcher(&frame_read(0x30, &histogram_bytes()));

        post(&mut d, Opcode::ReadHistogram);

        let data = d.mailbox().data;
        assert_eq!(&data[0..2], &crate::codec::words_from_bytes(f32_to_bytes(1.0)));
        assert_eq!(&data[4..6], &crate::codec::words_from_bytes(f32_to_bytes(3.0)));
        let bins: Vec<u16> = (1..=16).collect();
        assert_eq!(&data[BIN_SLOT..], bins.as_slice());
        assert_eq!(d.mailbox().command(), COMMAND_IDLE);
        finish(d);
    }

    #[test]
    fn bad_checksum_is_still_forwarded() {
        let mut raw = histogram_bytes();
        raw[48] = 0;
        raw[49] = 0;
        let mut d = dispatcher(&frame_read(0x30, &raw));

        post(&mut d, Opcode::ReadHistogram);
        assert_eq!(d.mailbox().data[BIN_SLOT], 1);
        assert_eq!(d.mailbox().command(), COMMAND_IDLE);
        finish(d);
    }

    #[test]
    fn power_cycle_and_state() {
        let mut expectations = handshake(ON_COMMAND, ACKNOWLEDGE);
        expectations.extend(handshake(OFF_COMMAND, ACKNOWLEDGE));
        let mut d = dispatcher(&expectations);

        post(&mut d, Opcode::PowerOn);
        assert_eq!(d.opc().state(), DeviceState::On);
        assert_eq!(d.mailbox().command(), COMMAND_IDLE);

        post(&mut d, Opcode::ReadState);
        assert_eq!(d.mailbox().data[0], 1);
        // READ_STATE leaves the command word posted
        assert_eq!(d.mailbox().command(), Opcode::ReadState.word());

        post(&mut d, Opcode::PowerOff);
        assert_eq!(d.opc().state(), DeviceState::Off);

        post(&mut d, Opcode::ReadState);
        assert_eq!(d.mailbox().data[0], 0);
        finish(d);
    }

    #[test]
    fn close_and_count_devices() {
        let mut d = dispatcher(&[]);

        post(&mut d, Opcode::NumDevices);
        assert_eq!(d.mailbox().data[0], 1);

        post(&mut d, Opcode::Close);
        assert_eq!(d.mailbox().command(), COMMAND_IDLE);
        post(&mut d, Opcode::NumDevices);
        assert_eq!(d.mailbox().data[0], 0);
        finish(d);
    }

    #[test]
    fn unknown_opcode_is_ignored() {
        let mut d = dispatcher(&[]);
        d.mailbox_mut().write_slots(0, &[7; 22]);
        d.mailbox_mut().set_command(0x11);

        assert_eq!(d.poll(), Ok(Some(Outcome::Ignored(0x11))));
        assert_eq!(d.mailbox().command(), COMMAND_IDLE);
        assert!(d.mailbox().data.iter().all(|w| *w == 7));
        finish(d);
    }

    #[test]
    fn read_failure_clears_command() {
        let opc = Opcn2::new(
            FailingBus::default(),
            RecordingDelay::default(),
            Config::default(),
        );
        let mut d = Dispatcher::new(opc, MemoryMailbox::new());
        d.mailbox_mut().set_command(Opcode::ReadPm.word());

        assert_eq!(d.poll(), Err(Error::Bus(())));
        assert_eq!(d.mailbox().command(), COMMAND_IDLE);
        assert!(d.mailbox().data.iter().all(|w| *w == 0));

        d.mailbox_mut().set_command(Opcode::ReadHistogram.word());
        assert_eq!(d.step(), Err(Error::Bus(())));
        assert_eq!(d.mailbox().command(), COMMAND_IDLE);
    }

    #[test]
    fn keeps_serving_after_read_on_closed_bus() {
        let mut d = dispatcher(&[]);

        d.mailbox_mut().set_command(Opcode::Close.word());
        assert_eq!(d.step(), Ok(Some(Outcome::Completed(Opcode::Close))));

        d.mailbox_mut().write_slots(0, &[7; 6]);
        d.mailbox_mut().set_command(Opcode::ReadPm.word());
        assert_eq!(d.step(), Err(Error::BusClosed));
        assert_eq!(d.mailbox().command(), COMMAND_IDLE);
        assert_eq!(&d.mailbox().data[..6], &[7; 6]);

        d.mailbox_mut().set_command(Opcode::ReadState.word());
        assert_eq!(d.step(), Ok(Some(Outcome::Completed(Opcode::ReadState))));
        assert_eq!(d.mailbox().data[0], DeviceState::Off.as_word());
        finish(d);
    }

    #[test]
    fn pack_histogram_layout() {
        let mut hist = HistogramFrame::default();
        hist.pm.pm10 = [1, 2, 3, 4];
        hist.bins[15] = 0xBEEF;
        let words = pack_histogram(&hist);
        assert_eq!(words[4], 0x0201);
        assert_eq!(words[5], 0x0403);
        assert_eq!(words[21], 0xBEEF);
    }
}
