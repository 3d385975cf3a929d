// SPDX-License-Identifier: BSD-3-Clause

//! A small demo binary exercising the library end to end. Not part of the protocol contract
//! (see the crate's top-level documentation); just a convenience for manual testing. Argument
//! parsing and dispatch live in [`rpc_protocol::cli`] so they can be driven from tests too.

use clap::Parser;

use rpc_protocol::cli::{run, Cli};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    run(Cli::parse())
}
