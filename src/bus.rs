use embedded_hal::spi::SpiDevice;

use crate::error::Error;

/// Synchronous full-duplex byte transport to the sensor.
pub trait Transport {
    type Error;

    /// Clock out `write` while filling `read`. Both slices have the same length.
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Error<Self::Error>>;

    /// Invalidate the handle. Further transfers fail with [`Error::BusClosed`].
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Number of devices attached through this transport.
    fn device_count(&self) -> u16;

    /// Send one byte and return the byte clocked in at the same time.
    fn exchange(&mut self, byte: u8) -> Result<u8, Error<Self::Error>> {
        let mut read = [0u8];
        self.transfer(&mut read, &[byte])?;
        Ok(read[0])
    }
}

/// [`Transport`] over an `embedded-hal` SPI device.
pub struct SpiTransport<SPI> {
    spi: SPI,
    open: bool,
}

impl<SPI: SpiDevice> SpiTransport<SPI> {
    /// Take ownership of an opened and configured SPI device.
    pub fn new(spi: SPI) -> Self {
        Self { spi, open: true }
    }

    /// Give the SPI device back, whether or not the transport was closed.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> Transport for SpiTransport<SPI> {
    type Error = SPI::Error;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Error<Self::Error>> {
        if !self.open {
            return Err(Error::BusClosed);
        }
        self.spi.transfer(read, write).map_err(Error::Bus)
    }

    fn close(&mut self) {
        if self.open {
            debug!("closing SPI bus");
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn device_count(&self) -> u16 {
        u16::from(self.open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::exchange;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    #[test]
    fn exchange_single_byte() {
        let expectations = exchange(0x03, 0xF3);
        let mut bus = SpiTransport::new(SpiMock::new(&expectations));
        assert_eq!(bus.exchange(0x03), Ok(0xF3));
        bus.release().done();
    }

    #[test]
    fn close_is_idempotent() {
        let expectations: Vec<SpiTransaction<u8>> = vec![];
        let mut bus = SpiTransport::new(SpiMock::new(&expectations));
        assert!(bus.is_open());
        assert_eq!(bus.device_count(), 1);
        bus.close();
        bus.close();
        assert!(!bus.is_open());
        assert_eq!(bus.device_count(), 0);
        assert_eq!(bus.exchange(0x32), Err(Error::BusClosed));
        bus.release().done();
    }
}
