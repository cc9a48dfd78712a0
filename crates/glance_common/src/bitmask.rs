//! Single-byte flag helpers for entity data bitmasks.

/// Returns `mask` with `flag` switched on or off.
pub fn set_flag(mask: u8, flag: u8, enable: bool) -> u8 {
    if enable {
        mask | flag
    } else {
        mask & !flag
    }
}

pub fn has_flag(mask: u8, flag: u8) -> bool {
    mask & flag != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mask = set_flag(0, 1 << 5, true);
        assert_eq!(mask, 0b0010_0000);
        assert!(has_flag(mask, 1 << 5));
        assert!(!has_flag(mask, 1 << 6));

        let mask = set_flag(mask | 1 << 6, 1 << 5, false);
        assert_eq!(mask, 0b0100_0000);
    }
}
