use bitflags::bitflags;

bitflags! {
    /// UEFI variable attribute bits stored in the 4-byte prefix of every variable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Attributes: u32 {
        const NON_VOLATILE = 0x0000_0001;
        const BOOTSERVICE_ACCESS = 0x0000_0002;
        const RUNTIME_ACCESS = 0x0000_0004;
        const HARDWARE_ERROR_RECORD = 0x0000_0008;
        const AUTHENTICATED_WRITE_ACCESS = 0x0000_0010;
        const TIME_BASED_AUTHENTICATED_WRITE_ACCESS = 0x0000_0020;
        const APPEND_WRITE = 0x0000_0040;

        // Bits outside the named set are carried through untouched.
        const _ = !0;
    }
}

impl Attributes {
    /// `NON_VOLATILE | BOOTSERVICE_ACCESS | RUNTIME_ACCESS`, used when a writer gives none.
    pub const DEFAULT_BITS: u32 = 0x7;
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes::from_bits_retain(Self::DEFAULT_BITS)
    }
}

impl From<u32> for Attributes {
    fn from(bits: u32) -> Self {
        Attributes::from_bits_retain(bits)
    }
}

/// Parse an attribute word written either as `0x`-prefixed hex or as decimal.
pub fn parse_attribute_bits(text: &str) -> Option<u32> {
    let text = text.trim();
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_nv_bs_rt() {
        let attrs = Attributes::default();
        assert_eq!(attrs.bits(), 0x7);
        assert!(attrs.contains(
            Attributes::NON_VOLATILE | Attributes::BOOTSERVICE_ACCESS | Attributes::RUNTIME_ACCESS
        ));
        assert!(!attrs.contains(Attributes::APPEND_WRITE));
    }

    #[test]
    fn unknown_bits_survive() {
        let attrs = Attributes::from(0x1000_0001);
        assert_eq!(attrs.bits(), 0x1000_0001);
        assert!(attrs.contains(Attributes::NON_VOLATILE));
    }

    #[test]
    fn parses_hex_and_decimal() {
        assert_eq!(parse_attribute_bits("0x27"), Some(0x27));
        assert_eq!(parse_attribute_bits("0X7"), Some(7));
        assert_eq!(parse_attribute_bits(" 6 "), Some(6));
        assert_eq!(parse_attribute_bits("0xZZ"), None);
        assert_eq!(parse_attribute_bits("seven"), None);
    }
}
