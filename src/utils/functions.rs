//! Helper functions for encoding and decoding embroidery commands
//!
//! Utilities for packing metadata (thread index, needle number, order) into
//! the upper 24 bits of u32 command values, and extracting it again.

use crate::core::constants::*;

/// Encode a thread change command with optional thread, needle and order
/// information
///
/// Values are stored as `index + 1` so 0 can represent "not specified".
///
/// # Example
///
/// ```
/// use stitchwise::utils::functions::encode_thread_change;
/// use stitchwise::core::constants::*;
///
/// let cmd = encode_thread_change(NEEDLE_SET, None, Some(2), None);
/// assert_eq!(cmd & COMMAND_MASK, NEEDLE_SET);
/// ```
pub fn encode_thread_change(
    command: u32,
    thread: Option<u8>,
    needle: Option<u8>,
    order: Option<u8>,
) -> u32 {
    let thread_val = thread.map_or(0, |t| t.wrapping_add(1) as u32);
    let needle_val = needle.map_or(0, |n| n.wrapping_add(1) as u32);
    let order_val = order.map_or(0, |o| o.wrapping_add(1) as u32);

    (command & COMMAND_MASK) | (order_val << 24) | (needle_val << 16) | (thread_val << 8)
}

/// Decode an embroidery command into (command, thread, needle, order)
pub fn decode_embroidery_command(command: u32) -> (u32, Option<u8>, Option<u8>, Option<u8>) {
    let flag = command & COMMAND_MASK;

    let decode = |field: u32| -> Option<u8> {
        if field == 0 {
            None
        } else {
            Some((field - 1) as u8)
        }
    };

    let thread = decode((command & THREAD_MASK) >> 8);
    let needle = decode((command & NEEDLE_MASK) >> 16);
    let order = decode((command & ORDER_MASK) >> 24);

    (flag, thread, needle, order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let cmd = encode_thread_change(NEEDLE_SET, Some(3), Some(7), Some(1));
        let (flag, thread, needle, order) = decode_embroidery_command(cmd);
        assert_eq!(flag, NEEDLE_SET);
        assert_eq!(thread, Some(3));
        assert_eq!(needle, Some(7));
        assert_eq!(order, Some(1));
    }

    #[test]
    fn test_decode_bare_command() {
        let (flag, thread, needle, order) = decode_embroidery_command(COLOR_CHANGE);
        assert_eq!(flag, COLOR_CHANGE);
        assert_eq!(thread, None);
        assert_eq!(needle, None);
        assert_eq!(order, None);
    }

    #[test]
    fn test_needle_zero_is_not_none() {
        let cmd = encode_thread_change(NEEDLE_SET, None, Some(0), None);
        let (_, _, needle, _) = decode_embroidery_command(cmd);
        assert_eq!(needle, Some(0));
    }
}
