// SPDX-License-Identifier: BSD-3-Clause

use std::fmt;

/// The possible errors that can arise from registering, finding, or calling a function through
/// this RPC subsystem.
#[derive(Debug)]
pub enum Error {
    /// A name, payload, or argument failed a validation rule before anything was sent.
    InvalidArgument(&'static str),

    /// A socket read or write failed, or the peer closed the connection mid-exchange.
    Io(std::io::Error),

    /// `find` could not locate a function with the given name, or `call` targeted an id the
    /// server no longer (or never did) recognize.
    NotFound,

    /// The handler produced no payload, or one that failed the server's own validation.
    InvalidResponse,

    /// The request payload does not fit in the negotiated integer width, or exceeds the
    /// 100,000-byte cap on `data2`.
    Overflow,

    /// Binding the listening socket, or connecting to the server, failed.
    Init(std::io::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(why) => write!(f, "invalid argument: {why}"),
            Self::Io(e) => write!(f, "transport error: {e}"),
            Self::NotFound => write!(f, "function not found"),
            Self::InvalidResponse => write!(f, "invalid response"),
            Self::Overflow => write!(f, "payload too large for negotiated integer width"),
            Self::Init(e) => write!(f, "initialization error: {e}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
