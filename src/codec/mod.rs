//! Binary encoding of rules.
//!
//! - `BitCursor`: byte-aligned bit fields over a buffer
//! - `pack`/`unpack`: the persisted rule record
//!
//! A cursor lives for exactly one `pack` or `unpack` call; there is no
//! shared codec state.

pub mod cursor;
pub mod format;

pub use cursor::BitCursor;
pub use format::{pack, packed_size, unpack, when_do_len, COMMAND_LEN, HEADER_LEN};
