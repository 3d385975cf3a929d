// SPDX-License-Identifier: BSD-3-Clause

//! The server side: owns the listening socket and the [`Registry`], and spawns one thread per
//! accepted connection.

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::registry::{Handler, Registry};
use crate::session::Session;

/// Owns the listening endpoint and the function [`Registry`].
///
/// Registration must complete before [`Server::serve_all`] is called: the registry is not
/// thread-safe to mutate, and once serving begins it is shared read-only with every session
/// thread via an `Arc`.
pub struct Server {
    listener: TcpListener,
    registry: Registry,
}

impl Server {
    /// Binds a listening socket on `port` across all interfaces. Std's `TcpListener` binds an
    /// IPv6 dual-stack socket on most platforms when bound to `::`, matching this protocol's
    /// AF_INET6 listening socket.
    ///
    /// Returns [`Error::Init`] on bind failure; this is the only fallible step of server startup.
    pub fn init_server(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("::", port)).map_err(Error::Init)?;
        Ok(Self {
            listener,
            registry: Registry::new(),
        })
    }

    /// Registers `handler` under `name`. Fails with [`Error::InvalidArgument`] if `name` is empty
    /// or contains any byte outside printable ASCII; a re-registration of an existing name
    /// replaces its handler and keeps its id.
    pub fn register(&mut self, name: &str, handler: Handler) -> Result<()> {
        if self.registry.register(name, handler) {
            Ok(())
        } else {
            Err(Error::InvalidArgument(
                "function name must be non-empty printable ASCII",
            ))
        }
    }

    /// Accepts connections forever, spawning an independent session thread for each one.
    ///
    /// Each accepted [`std::net::TcpStream`] is moved into its session thread's closure as an
    /// owned value, so the accept loop can immediately accept the next connection without racing
    /// a shared handoff slot (the bug this design deliberately avoids; see the design notes).
    /// Accept failures are logged and do not stop the loop; only a fatal error during `init_server`
    /// aborts startup.
    pub fn serve_all(self) -> ! {
        let registry = Arc::new(self.registry);

        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!("accepted connection from {peer}");
                    let registry = Arc::clone(&registry);
                    thread::spawn(move || Session::run(stream, registry));
                }
                Err(e) => {
                    warn!("accept failed: {e}");
                }
            }
        }
    }
}
