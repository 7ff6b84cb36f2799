//! Shared command/result channel between the host and the bridge.
//!
//! The host writes an opcode into the command word. Every opcode has its low bit set, which is
//! the only busy signal the bridge polls for. When the bridge is done it writes the results into
//! the data slots and clears the command word. Only the host writes the command word, and only
//! the bridge writes data slots and clears it. [`crate::Host::state`] is the exception, see there.

/// Command word value meaning idle/done.
pub const COMMAND_IDLE: u32 = 0x0;

/// Bit set in every posted command.
pub const COMMAND_POSTED: u32 = 0x1;

/// Minimum number of 16-bit data slots: 6 for PM values and 16 for histogram bins.
pub const MAILBOX_DATA_SLOTS: usize = 22;

/// Memory-mapped command word and result registers.
pub trait Mailbox {
    fn command(&self) -> u32;

    fn set_command(&mut self, word: u32);

    fn data(&self, slot: usize) -> u16;

    fn set_data(&mut self, slot: usize, word: u16);

    /// Write consecutive slots starting at `first`.
    fn write_slots(&mut self, first: usize, words: &[u16]) {
        for (i, word) in words.iter().enumerate() {
            self.set_data(first + i, *word);
        }
    }
}

/// Host command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum Opcode {
    /// Pin roles are fixed, nothing to do.
    Config = 0x1,
    PowerOn = 0x3,
    PowerOff = 0x5,
    /// Close the SPI bus.
    Close = 0x7,
    /// Read the PM frame into slots 0..6.
    ReadPm = 0x9,
    /// Read the histogram frame: PM into slots 0..6, bins into slots 6..22.
    ReadHistogram = 0xB,
    /// Number of attached SPI devices into slot 0.
    NumDevices = 0xD,
    /// Power state (0 off, 1 on) into slot 0.
    ReadState = 0xF,
}

impl Opcode {
    pub fn from_word(word: u32) -> Option<Self> {
        Some(match word {
            0x1 => Opcode::Config,
            0x3 => Opcode::PowerOn,
            0x5 => Opcode::PowerOff,
            0x7 => Opcode::Close,
            0x9 => Opcode::ReadPm,
            0xB => Opcode::ReadHistogram,
            0xD => Opcode::NumDevices,
            0xF => Opcode::ReadState,
            _ => return None,
        })
    }

    pub const fn word(self) -> u32 {
        self as u32
    }
}

/// A mailbox held in ordinary memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMailbox {
    pub command: u32,
    pub data: [u16; MAILBOX_DATA_SLOTS],
}

impl MemoryMailbox {
    pub const fn new() -> Self {
        Self {
            command: COMMAND_IDLE,
            data: [0; MAILBOX_DATA_SLOTS],
        }
    }
}

impl Default for MemoryMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox for MemoryMailbox {
    fn command(&self) -> u32 {
        self.command
    }

    fn set_command(&mut self, word: u32) {
        self.command = word;
    }

    fn data(&self, slot: usize) -> u16 {
        self.data[slot]
    }

    fn set_data(&mut self, slot: usize, word: u16) {
        self.data[slot] = word;
    }
}

impl<M: Mailbox + ?Sized> Mailbox for &mut M {
    fn command(&self) -> u32 {
        (**self).command()
    }

    fn set_command(&mut self, word: u32) {
        (**self).set_command(word)
    }

    fn data(&self, slot: usize) -> u16 {
        (**self).data(slot)
    }

    fn set_data(&mut self, slot: usize, word: u16) {
        (**self).set_data(slot, word)
    }
}
