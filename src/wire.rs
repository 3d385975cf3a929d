// SPDX-License-Identifier: BSD-3-Clause

//! Typed big-endian read/write primitives shared by the client and server sides of a session.
//!
//! Every primitive here loops via `Read::read_exact`/`Write::write_all` rather than a single
//! `read`/`write` call, so a TCP stream handing back fewer bytes than requested is never mistaken
//! for a complete field (see the source's partial-read bug documented alongside this spec).

use std::io::{self, Read, Write};

/// Fixed size of the NUL-terminated name buffer sent by `find`. Wasteful but wire-stable; do not
/// shrink it, existing peers depend on this exact framing.
pub const NAME_BUF_LEN: usize = 1024;

/// Sentinel `id` carried on the wire by `find` when no matching function is registered.
pub const NOT_FOUND_ID: u32 = 0xFFFF_FFFF;

/// Hard cap on `data2_len`, independent of negotiated integer width.
pub const MAX_DATA2_LEN: usize = 100_000;

pub const OPCODE_FIND: [u8; 5] = *b"find\0";
pub const OPCODE_CALL: [u8; 5] = *b"call\0";
pub const OPCODE_CLOSE: [u8; 5] = *b"clos\0";

pub fn read_u8(stream: &mut impl Read) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    stream.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn write_u8(stream: &mut impl Write, value: u8) -> io::Result<()> {
    stream.write_all(&[value])
}

pub fn read_u32(stream: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

pub fn write_u32(stream: &mut impl Write, value: u32) -> io::Result<()> {
    stream.write_all(&value.to_be_bytes())
}

pub fn read_i64(stream: &mut impl Read) -> io::Result<i64> {
    let mut buf = [0u8; 8];
    stream.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

pub fn write_i64(stream: &mut impl Write, value: i64) -> io::Result<()> {
    stream.write_all(&value.to_be_bytes())
}

/// Reads exactly `len` opaque bytes.
pub fn read_exact_vec(stream: &mut impl Read, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads the fixed-size, 5-byte opcode tag. Returns it verbatim; the caller matches against
/// `OPCODE_FIND`/`OPCODE_CALL`/`OPCODE_CLOSE`.
pub fn read_opcode(stream: &mut impl Read) -> io::Result<[u8; 5]> {
    let mut buf = [0u8; 5];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// Encodes `name` into a [`NAME_BUF_LEN`]-byte NUL-terminated buffer for `find`. The name must
/// already have been validated to fit (length checked by the caller); the remainder of the
/// buffer past the NUL is left zeroed, matching the source's uninitialized-but-ignored tail.
pub fn encode_name_buf(name: &str) -> [u8; NAME_BUF_LEN] {
    let mut buf = [0u8; NAME_BUF_LEN];
    let bytes = name.as_bytes();
    buf[..bytes.len()].copy_from_slice(bytes);
    buf
}

/// Decodes a NUL-terminated name out of a raw [`NAME_BUF_LEN`]-byte buffer.
pub fn decode_name_buf(buf: &[u8; NAME_BUF_LEN]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
