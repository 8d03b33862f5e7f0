//! Image ids
//!
//! A placeholder cell can carry at most 8 bits of id in its third diacritic
//! and 8 more in its foreground colour (256-colour mode), so ids are 16 bits
//! wide. On the wire the diacritic byte is the most significant byte of the
//! 32-bit id and the colour byte is the least significant one.

use rand::Rng;
use std::fmt;

/// Identifies one transmitted image to the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId {
    upper: u8,
    lower: u8,
}

impl ImageId {
    pub fn new(upper: u8, lower: u8) -> Self {
        Self { upper, lower }
    }

    /// Draw an id uniformly at random. Ids of live placements are not
    /// checked for collisions; zero is skipped because the protocol treats
    /// `i=0` as "no id".
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let bits: u16 = rng.gen();
            if bits != 0 {
                return Self::from_bits(bits);
            }
        }
    }

    pub fn from_bits(bits: u16) -> Self {
        Self {
            upper: (bits >> 8) as u8,
            lower: bits as u8,
        }
    }

    pub fn bits(&self) -> u16 {
        (u16::from(self.upper) << 8) | u16::from(self.lower)
    }

    /// Byte encoded by the third diacritic of each cell
    pub fn upper(&self) -> u8 {
        self.upper
    }

    /// Byte encoded by the foreground colour of each row
    pub fn lower(&self) -> u8 {
        self.lower
    }

    /// Value sent as the `i` key
    pub fn protocol_value(&self) -> u32 {
        (u32::from(self.upper) << 24) | u32::from(self.lower)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.protocol_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_value_layout() {
        let id = ImageId::new(0xAB, 0x12);
        assert_eq!(id.protocol_value(), 0xAB00_0012);
        assert_eq!(id.bits(), 0xAB12);
        assert_eq!(ImageId::from_bits(0xAB12), id);
    }

    #[test]
    fn test_random_ids_are_never_zero() {
        for _ in 0..1000 {
            assert_ne!(ImageId::random().bits(), 0);
        }
    }
}
