// SPDX-License-Identifier: BSD-3-Clause

use std::collections::HashMap;

use crate::Payload;

/// An RPC handler is a capability: given a request [`Payload`], it returns a response payload,
/// or `None` to signal that the request could not be answered (treated as a response validation
/// failure by the session). Handlers are invoked inline on whichever session's thread received
/// the call, so they must be safe to run concurrently across sessions.
pub type Handler = Box<dyn Fn(Payload) -> Option<Payload> + Send + Sync>;

/// A single registered function: its stable `id`, and the handler capability currently bound to
/// its name.
struct FunctionEntry {
    name: String,
    handler: Handler,
}

/// The server's table of named handlers.
///
/// Entries are addressed by `id` (assigned as the pre-insert entry count, so ids are stable and
/// monotonically non-decreasing across distinct names) and by `name` (for `find`). Re-registering
/// an existing name keeps its original id and replaces only the handler.
///
/// Not thread-safe: registration must complete before [`crate::server::Server::serve_all`] starts
/// accepting connections. The read path (`find_by_name`/`find_by_id`) never mutates state, so once
/// serving begins, sessions may call it without synchronization.
#[derive(Default)]
pub struct Registry {
    entries: Vec<FunctionEntry>,
    by_name: HashMap<String, u32>,
}

/// Upper bound on a function name's length in bytes (spec: "1-1000 bytes"), independent of the
/// 1024-byte wire buffer `find` uses to transmit it.
pub const MAX_NAME_LEN: usize = 1000;

/// A name is valid if it is 1-1000 bytes long and every byte is printable 7-bit ASCII
/// (0x20-0x7E).
pub fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`. If `name` is already registered, its handler is replaced
    /// in place and its id is preserved; otherwise a new entry is appended with id equal to the
    /// prior entry count.
    ///
    /// Returns `false` (and leaves the registry unchanged) if `name` is empty or contains any
    /// byte outside printable ASCII.
    pub fn register(&mut self, name: &str, handler: Handler) -> bool {
        if !valid_name(name) {
            return false;
        }

        if let Some(&id) = self.by_name.get(name) {
            self.entries[id as usize].handler = handler;
            return true;
        }

        let id = self.entries.len() as u32;
        self.entries.push(FunctionEntry {
            name: name.to_string(),
            handler,
        });
        self.by_name.insert(name.to_string(), id);
        true
    }

    /// Looks up the id of a registered function by exact name match.
    pub fn find_by_name(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Invokes the handler registered at `id`, if any.
    pub fn call_by_id(&self, id: u32, payload: Payload) -> Option<Option<Payload>> {
        self.entries.get(id as usize).map(|entry| (entry.handler)(payload))
    }

    /// True if some entry is registered at `id`. Used by the session to answer the "function
    /// found" indicator before reading the request payload.
    pub fn contains_id(&self, id: u32) -> bool {
        (id as usize) < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
