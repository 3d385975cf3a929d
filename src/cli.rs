// SPDX-License-Identifier: BSD-3-Clause

//! The argument-parsing and dispatch logic behind the `rpc-demo` binary.
//!
//! This lives in the library, not the binary, so it can be driven directly from tests the same
//! way the teacher crate's own `rpcbind` tests call `rpcbind::server::main` and
//! `rpcbind::client::*` instead of shelling out to a binary.

use clap::{Parser, Subcommand};

use crate::{Client, Payload, Server};

#[derive(Parser)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a server on `--port` with a couple of illustrative handlers registered.
    Serve {
        #[arg(long)]
        port: u16,
    },
    /// Connect to a running server, find a function by name, and call it once.
    Call {
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(long)]
        port: u16,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        data1: i64,
        /// Optional request payload body, as hex (e.g. `616263`).
        #[arg(long)]
        data2_hex: Option<String>,
    },
}

/// Runs a parsed [`Cli`] invocation. `Command::Serve` never returns on success; `Command::Call`
/// prints its response and returns.
pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Serve { port } => serve(port),
        Command::Call {
            host,
            port,
            name,
            data1,
            data2_hex,
        } => {
            let data2 = match data2_hex {
                Some(hex) => decode_hex(&hex)?,
                None => Vec::new(),
            };
            let response = call(&host, port, &name, data1, data2)?;
            println!(
                "data1={} data2={}",
                response.data1,
                encode_hex(&response.data2)
            );
            Ok(())
        }
    }
}

/// Binds `port` with a couple of illustrative handlers registered, then serves forever.
pub fn serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut server = Server::init_server(port)?;

    server.register("echo", Box::new(Some))?;
    server.register(
        "double",
        Box::new(|p: Payload| Some(Payload::new(p.data1 * 2, Vec::new()))),
    )?;

    println!("listening on port {port}");
    server.serve_all();
}

/// Connects to `host:port`, finds `name`, calls it once with `(data1, data2)`, closes the
/// connection, and returns the response payload.
pub fn call(
    host: &str,
    port: u16,
    name: &str,
    data1: i64,
    data2: Vec<u8>,
) -> Result<Payload, Box<dyn std::error::Error>> {
    let mut client = Client::init_client(host, port)?;
    let handle = client.find(name)?;
    let response = client.call(handle, Payload::new(data1, data2))?;
    client.close_client()?;
    Ok(response)
}

pub fn decode_hex(s: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if s.len() % 2 != 0 {
        return Err("hex payload must have an even number of digits".into());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.into()))
        .collect()
}

pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
