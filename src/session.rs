// SPDX-License-Identifier: BSD-3-Clause

//! The server-side per-connection state machine: handshake, then a loop reading 5-byte opcodes
//! until the peer sends `clos\0` or the transport fails.

use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::registry::Registry;
use crate::validate;
use crate::wire::{self, OPCODE_CALL, OPCODE_CLOSE, OPCODE_FIND};
use crate::Payload;

/// This server's native signed-integer width in bytes, advertised during the handshake and used
/// for all of this server's own outbound validation. Matches the original implementation's use of
/// the host's native `int` width.
pub const SERVER_INT_WIDTH: u8 = 4;

/// One accepted connection, running independently on its own thread from accept to `clos` or
/// transport failure. Holds no state shared with any other session; the only shared resource is
/// the read-only [`Registry`].
pub struct Session {
    stream: TcpStream,
    registry: Arc<Registry>,
    /// The client's reported integer width from the handshake. Recorded for possible future use;
    /// this server always validates against its own [`SERVER_INT_WIDTH`].
    #[allow(dead_code)]
    peer_width: u8,
}

impl Session {
    /// Runs the handshake and opcode loop on `stream` until the session ends. `stream` is an
    /// owned value moved into the spawning thread's closure by the caller ([`crate::server`]), not
    /// shared through a locked slot.
    pub fn run(mut stream: TcpStream, registry: Arc<Registry>) {
        let peer_width = match Self::handshake(&mut stream) {
            Ok(w) => w,
            Err(e) => {
                warn!("handshake failed: {e}");
                return;
            }
        };

        let mut session = Session {
            stream,
            registry,
            peer_width,
        };

        session.serve();
    }

    fn handshake(stream: &mut TcpStream) -> std::io::Result<u8> {
        wire::write_u8(stream, SERVER_INT_WIDTH)?;
        wire::read_u8(stream)
    }

    fn serve(&mut self) {
        loop {
            let opcode = match wire::read_opcode(&mut self.stream) {
                Ok(op) => op,
                Err(e) => {
                    debug!("session ending: {e}");
                    return;
                }
            };

            if opcode == OPCODE_FIND {
                if self.handle_find().is_err() {
                    return;
                }
            } else if opcode == OPCODE_CALL {
                if self.handle_call().is_err() {
                    return;
                }
            } else if opcode == OPCODE_CLOSE {
                trace!("session closed by peer");
                return;
            } else {
                // Unknown opcode: discard and retry reading another, matching the source's
                // lenient policy (see the design notes on this choice).
                warn!("ignoring unrecognized opcode {opcode:?}");
            }
        }
    }

    fn handle_find(&mut self) -> std::io::Result<()> {
        let buf: [u8; wire::NAME_BUF_LEN] =
            wire::read_exact_vec(&mut self.stream, wire::NAME_BUF_LEN)?
                .try_into()
                .expect("read_exact_vec returns exactly the requested length");
        let name = wire::decode_name_buf(&buf);

        let id = self.registry.find_by_name(&name);
        debug!("find({name:?}) -> {id:?}");

        match id {
            Some(id) => wire::write_u32(&mut self.stream, id),
            None => wire::write_u32(&mut self.stream, wire::NOT_FOUND_ID),
        }
    }

    fn handle_call(&mut self) -> std::io::Result<()> {
        let id = wire::read_u32(&mut self.stream)?;

        let found = self.registry.contains_id(id);
        wire::write_u8(&mut self.stream, found as u8)?;
        if !found {
            return Ok(());
        }

        let request = self.read_payload()?;

        // The registry's read path never mutates state, so a shared `Arc<Registry>` needs no
        // lock here; only registration (which happens before `serve_all`) ever writes to it.
        let response = self.registry.call_by_id(id, request).flatten();

        let valid = response
            .as_ref()
            .is_some_and(|p| validate::feasible(p, SERVER_INT_WIDTH));

        wire::write_u8(&mut self.stream, valid as u8)?;
        if !valid {
            return Ok(());
        }

        let response = response.expect("checked Some above");
        wire::write_i64(&mut self.stream, response.data1)?;
        wire::write_u32(&mut self.stream, response.data2_len())?;
        if !response.data2.is_empty() {
            self.stream.write_all(&response.data2)?;
        }
        Ok(())
    }

    fn read_payload(&mut self) -> std::io::Result<Payload> {
        let data1 = wire::read_i64(&mut self.stream)?;
        let data2_len = wire::read_u32(&mut self.stream)?;
        let data2 = if data2_len == 0 {
            Vec::new()
        } else {
            wire::read_exact_vec(&mut self.stream, data2_len as usize)?
        };
        Ok(Payload::new(data1, data2))
    }
}
