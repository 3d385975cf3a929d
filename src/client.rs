// SPDX-License-Identifier: BSD-3-Clause

//! The client stub: connect, look up a function by name, call it, and close.

use std::io::Write;
use std::net::TcpStream;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::registry::valid_name;
use crate::validate;
use crate::wire::{self, OPCODE_CALL, OPCODE_CLOSE, OPCODE_FIND};
use crate::Payload;

/// This client's native signed-integer width in bytes, advertised during the handshake.
const CLIENT_INT_WIDTH: u8 = 4;

/// An opaque, client-side token binding a remote function name to its server-assigned id. Valid
/// from a successful [`Client::find`] until the owning [`Client`] is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    id: u32,
}

impl Handle {
    pub fn id(&self) -> u32 {
        self.id
    }
}

/// A connection to an RPC server. Handshakes lazily on the first [`Client::find`] call; every
/// later `find`/`call` on the same `Client` reuses the already-negotiated width.
pub struct Client {
    stream: TcpStream,
    server_width: Option<u8>,
}

impl Client {
    /// Connects to `host:port`. Returns [`Error::Init`] on any connect failure.
    pub fn init_client(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).map_err(Error::Init)?;
        Ok(Self {
            stream,
            server_width: None,
        })
    }

    fn ensure_handshake(&mut self) -> std::io::Result<u8> {
        if let Some(w) = self.server_width {
            return Ok(w);
        }

        let server_width = wire::read_u8(&mut self.stream)?;
        wire::write_u8(&mut self.stream, CLIENT_INT_WIDTH)?;
        self.server_width = Some(server_width);
        Ok(server_width)
    }

    /// Looks up `name` on the server. Returns [`Error::NotFound`] if the server has nothing
    /// registered under that name, or [`Error::InvalidArgument`] if `name` itself is not valid
    /// (empty, or containing a non-printable byte) — checked locally, without touching the wire.
    pub fn find(&mut self, name: &str) -> Result<Handle> {
        if !valid_name(name) {
            return Err(Error::InvalidArgument(
                "function name must be 1-1000 bytes of printable ASCII",
            ));
        }

        self.ensure_handshake()?;

        self.stream.write_all(&OPCODE_FIND)?;
        let name_buf = wire::encode_name_buf(name);
        self.stream.write_all(&name_buf)?;

        let id = wire::read_u32(&mut self.stream)?;
        debug!("find({name:?}) -> {id}");

        if id == wire::NOT_FOUND_ID {
            return Err(Error::NotFound);
        }

        Ok(Handle { id })
    }

    /// Calls the function bound to `handle` with `payload`, returning its response.
    ///
    /// `payload` is validated against the server's advertised integer width before anything is
    /// written to the wire; a failing payload yields [`Error::Overflow`] without touching the
    /// transport.
    pub fn call(&mut self, handle: Handle, payload: Payload) -> Result<Payload> {
        let w = self.server_width.unwrap_or(CLIENT_INT_WIDTH);
        if !validate::feasible(&payload, w) {
            return Err(Error::Overflow);
        }

        self.stream.write_all(&OPCODE_CALL)?;
        wire::write_u32(&mut self.stream, handle.id)?;
        wire::write_i64(&mut self.stream, payload.data1)?;
        wire::write_u32(&mut self.stream, payload.data2_len())?;
        if !payload.data2.is_empty() {
            self.stream.write_all(&payload.data2)?;
        }

        let found = wire::read_u8(&mut self.stream)?;
        if found == 0 {
            return Err(Error::NotFound);
        }

        let valid = wire::read_u8(&mut self.stream)?;
        if valid == 0 {
            return Err(Error::InvalidResponse);
        }

        let data1 = wire::read_i64(&mut self.stream)?;
        let data2_len = wire::read_u32(&mut self.stream)?;
        let data2 = if data2_len == 0 {
            Vec::new()
        } else {
            wire::read_exact_vec(&mut self.stream, data2_len as usize)?
        };

        Ok(Payload::new(data1, data2))
    }

    /// Sends `clos\0` and releases the connection. Consuming `self` ensures the socket cannot be
    /// used again after close, which is the Rust analogue of the language-neutral API's
    /// `close_client` + subsequent "do not use this handle" contract.
    pub fn close_client(mut self) -> Result<()> {
        trace!("closing client connection");
        self.stream.write_all(&OPCODE_CLOSE)?;
        Ok(())
    }
}
