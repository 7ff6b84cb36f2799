//! Little-endian conversions between sensor bytes, integers, floats and 16-bit register words.
//!
//! Byte 0 is always the least significant byte, matching the sensor's wire order and the
//! mailbox memory layout.

/// Combine two bytes into a 16-bit unsigned integer.
pub const fn u16_from_bytes(low: u8, high: u8) -> u16 {
    u16::from_le_bytes([low, high])
}

/// Combine four bytes into a 32-bit unsigned integer, `b3` most significant.
pub const fn u32_from_bytes(b0: u8, b1: u8, b2: u8, b3: u8) -> u32 {
    u32::from_le_bytes([b0, b1, b2, b3])
}

/// Rebuild an IEEE-754 binary32 value from its bit pattern, `b0` least significant.
pub fn f32_from_bytes(b0: u8, b1: u8, b2: u8, b3: u8) -> f32 {
    f32::from_bits(u32_from_bytes(b0, b1, b2, b3))
}

/// Inverse of [`f32_from_bytes`].
pub fn f32_to_bytes(f: f32) -> [u8; 4] {
    f.to_bits().to_le_bytes()
}

/// Inverse of [`u32_from_bytes`].
pub const fn u32_to_bytes(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Inverse of [`u16_from_bytes`], `[low, high]`.
pub const fn u16_to_bytes(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Split four bytes into a low/high register word pair, low word first.
pub const fn words_from_bytes(bytes: [u8; 4]) -> [u16; 2] {
    [
        u16_from_bytes(bytes[0], bytes[1]),
        u16_from_bytes(bytes[2], bytes[3]),
    ]
}

/// Reassemble the four bytes carried by a low/high register word pair.
pub const fn bytes_from_words(low: u16, high: u16) -> [u8; 4] {
    let [b0, b1] = u16_to_bytes(low);
    let [b2, b3] = u16_to_bytes(high);
    [b0, b1, b2, b3]
}

/// Read a float forwarded as a low/high register word pair.
pub fn f32_from_words(low: u16, high: u16) -> f32 {
    let [b0, b1, b2, b3] = bytes_from_words(low, high);
    f32_from_bytes(b0, b1, b2, b3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_little_endian() {
        assert_eq!(u16_from_bytes(0x34, 0x12), 0x1234);
    }

    #[test]
    fn u32_little_endian() {
        assert_eq!(u32_from_bytes(0x78, 0x56, 0x34, 0x12), 0x1234_5678);
        assert_eq!(
            u32_to_bytes(u32_from_bytes(0xDE, 0xAD, 0xBE, 0xEF)),
            [0xDE, 0xAD, 0xBE, 0xEF]
        );
    }

    #[test]
    fn float_one() {
        assert_eq!(f32_from_bytes(0x00, 0x00, 0x80, 0x3F), 1.0);
        assert_eq!(f32_to_bytes(1.0), [0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn float_through_register_words() {
        // 123.45 == 0x42F6E666
        let [lo, hi] = words_from_bytes(f32_to_bytes(123.45));
        assert_eq!(lo, 0xE666);
        assert_eq!(hi, 0x42F6);
        assert_eq!(f32_from_words(lo, hi), 123.45);
    }

    #[test]
    fn nan_bit_pattern_survives() {
        let bytes = [0x01, 0x00, 0xC0, 0x7F];
        let f = f32_from_bytes(bytes[0], bytes[1], bytes[2], bytes[3]);
        assert!(f.is_nan());
        assert_eq!(f32_to_bytes(f), bytes);
    }

    #[test]
    fn float_bytes_round_trip() {
        // every byte value in every position, plus a walk over mixed patterns
        for b in 0..=u8::MAX {
            for pos in 0..4 {
                let mut bytes = [0x5A; 4];
                bytes[pos] = b;
                let f = f32_from_bytes(bytes[0], bytes[1], bytes[2], bytes[3]);
                assert_eq!(f32_to_bytes(f), bytes);
            }
        }
        let mut pattern: u32 = 0x1234_5678;
        for _ in 0..10_000 {
            pattern = pattern.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let bytes = pattern.to_le_bytes();
            let f = f32_from_bytes(bytes[0], bytes[1], bytes[2], bytes[3]);
            assert_eq!(f32_to_bytes(f), bytes);
            let [lo, hi] = words_from_bytes(bytes);
            assert_eq!(bytes_from_words(lo, hi), bytes);
        }
    }
}
