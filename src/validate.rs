// SPDX-License-Identifier: BSD-3-Clause

//! Payload feasibility checks against a negotiated peer integer width.
//!
//! `data1` always travels on the wire as a full 64-bit two's-complement value (see the design
//! notes on why the negotiated width never actually changes field widths); `W` only bounds which
//! values either side is willing to emit. This module applies identically to an outbound request
//! on the client and an outbound response on the server.

use crate::Payload;

/// Upper bound (exclusive) on the magnitude of a signed value that fits in a genuine `w`-byte
/// two's-complement integer: `|data1| < 2^(8w-1)`.
fn signed_bound(w: u8) -> i128 {
    1i128 << (8 * w as u32 - 1)
}

/// Upper bound (exclusive) for an unsigned `w`-byte quantity: `2^(8w)`.
fn unsigned_bound(w: u8) -> u128 {
    1u128 << (8 * w as u32)
}

/// Checks whether `payload` may be sent given the negotiated integer width `w` (in bytes).
///
/// `w` is expected to be in `1..=8`; a width of `0` or greater than `8` is treated as always
/// failing, since no peer on this protocol ever negotiates such a width.
pub fn feasible(payload: &Payload, w: u8) -> bool {
    if !(1..=8).contains(&w) {
        return false;
    }

    if (payload.data1 as i128).abs() >= signed_bound(w) {
        return false;
    }

    let len = payload.data2.len();
    if len >= crate::wire::MAX_DATA2_LEN {
        return false;
    }
    if (len as u128) >= unsigned_bound(w) {
        return false;
    }

    true
}
