//! Shared test doubles.

use embedded_hal::delay::DelayNs;
use embedded_hal_mock::eh1::spi::Transaction as SpiTransaction;

use crate::bus::Transport;
use crate::error::Error;

/// One single-byte SPI device transaction.
pub(crate) fn exchange(write: u8, read: u8) -> Vec<SpiTransaction<u8>> {
    transfer(vec![write], vec![read])
}

/// One multi-byte SPI device transaction.
pub(crate) fn transfer(write: Vec<u8>, read: Vec<u8>) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(write, read),
        SpiTransaction::transaction_end(),
    ]
}

/// A power handshake answered with `response`.
pub(crate) fn handshake(command: [u8; 2], response: [u8; 2]) -> Vec<SpiTransaction<u8>> {
    let mut t = exchange(command[0], response[0]);
    t.extend(exchange(command[1], response[1]));
    t
}

/// Request byte followed by a bulk read answered with `frame`.
pub(crate) fn frame_read(command: u8, frame: &[u8]) -> Vec<SpiTransaction<u8>> {
    let mut t = exchange(command, 0x00);
    t.extend(transfer(vec![0x00; frame.len()], frame.to_vec()));
    t
}

/// Records every requested delay in nanoseconds.
#[derive(Debug, Default)]
pub(crate) struct RecordingDelay {
    pub(crate) delays_ns: Vec<u64>,
}

impl RecordingDelay {
    pub(crate) fn total_ms(&self) -> u64 {
        self.delays_ns.iter().sum::<u64>() / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ns.push(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.delays_ns.push(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ns.push(u64::from(ms) * 1_000_000);
    }
}

pub(crate) const fn ms(ms: u64) -> u64 {
    ms * 1_000_000
}

/// A transport whose transfers always fail.
#[derive(Debug, Default)]
pub(crate) struct FailingBus {
    pub(crate) transfers: usize,
}

impl Transport for FailingBus {
    type Error = ();

    fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Error<()>> {
        self.transfers += 1;
        Err(Error::Bus(()))
    }

    fn close(&mut self) {}

    fn is_open(&self) -> bool {
        true
    }

    fn device_count(&self) -> u16 {
        1
    }
}
