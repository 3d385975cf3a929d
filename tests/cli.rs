// SPDX-License-Identifier: BSD-3-Clause

//! Drives the demo binary's argument parser and subcommand dispatch directly (the teacher
//! crate's own `rpcbind` tests call `rpcbind::server::main`/`rpcbind::client::*` the same way,
//! rather than shelling out to a compiled binary).

use std::net::TcpStream;
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::Duration;

use rpc_protocol::cli::{run, Cli, Command};

static NEXT_PORT: AtomicU16 = AtomicU16::new(18_000);

fn wait_for_server(port: u16) {
    for _ in 0..50 {
        if TcpStream::connect(("::1", port)).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("timed out waiting for server on port {port}");
}

/// S9: the `call` subcommand against a `serve` subcommand started in-process round-trips S1's
/// echo scenario end to end through the CLI argument parser, not just the library API.
#[test]
fn cli_call_round_trips_echo_against_cli_serve() {
    let port = NEXT_PORT.fetch_add(1, Ordering::Relaxed);

    let serve_cli =
        Cli::try_parse_from(["rpc-demo", "serve", "--port", &port.to_string()]).unwrap();
    thread::spawn(move || {
        let _ = run(serve_cli);
    });

    wait_for_server(port);

    let call_cli = Cli::try_parse_from([
        "rpc-demo",
        "call",
        "--host",
        "::1",
        "--port",
        &port.to_string(),
        "--name",
        "echo",
        "--data1",
        "42",
        "--data2-hex",
        "616263",
    ])
    .unwrap();

    let (host, port, name, data1, data2) = match call_cli.command {
        Command::Call {
            host,
            port,
            name,
            data1,
            data2_hex,
        } => (host, port, name, data1, data2_hex),
        Command::Serve { .. } => panic!("expected Call"),
    };
    assert_eq!(name, "echo");
    assert_eq!(data1, 42);

    // Drive the same `call` path `run` dispatches to, so the response payload (not just the
    // absence of an error) is checked against S1's expected echo.
    let data2 = rpc_protocol::cli::decode_hex(data2.as_deref().unwrap()).unwrap();
    let response = rpc_protocol::cli::call(&host, port, &name, data1, data2).unwrap();
    assert_eq!(response.data1, 42);
    assert_eq!(response.data2, vec![0x61, 0x62, 0x63]);
}

/// The CLI-registered `double` handler is also reachable through the argument parser.
#[test]
fn cli_call_reaches_double_handler() {
    let port = NEXT_PORT.fetch_add(1, Ordering::Relaxed);

    let serve_cli =
        Cli::try_parse_from(["rpc-demo", "serve", "--port", &port.to_string()]).unwrap();
    thread::spawn(move || {
        let _ = run(serve_cli);
    });

    wait_for_server(port);

    let call_cli = Cli::try_parse_from([
        "rpc-demo",
        "call",
        "--host",
        "::1",
        "--port",
        &port.to_string(),
        "--name",
        "double",
        "--data1",
        "21",
    ])
    .unwrap();

    let (host, port, name, data1) = match call_cli.command {
        Command::Call {
            host,
            port,
            name,
            data1,
            ..
        } => (host, port, name, data1),
        Command::Serve { .. } => panic!("expected Call"),
    };

    let response = rpc_protocol::cli::call(&host, port, &name, data1, Vec::new()).unwrap();
    assert_eq!(response.data1, 42);
    assert!(response.data2.is_empty());
}
