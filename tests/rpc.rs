// SPDX-License-Identifier: BSD-3-Clause

//! Black-box end-to-end tests: a real server on an ephemeral port, driven by a real client over
//! an actual TCP connection.

use std::net::TcpStream;
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::Duration;

use rpc_protocol::{Client, Error, Payload, Server};

/// Ephemeral ports handed out to successive tests, so they don't collide with each other when run
/// in parallel by the default test harness.
static NEXT_PORT: AtomicU16 = AtomicU16::new(17_000);

fn spawn_server(register: impl FnOnce(&mut Server) + Send + 'static) -> u16 {
    let port = NEXT_PORT.fetch_add(1, Ordering::Relaxed);

    thread::spawn(move || {
        let mut server = Server::init_server(port).expect("bind ephemeral port");
        register(&mut server);
        server.serve_all();
    });

    wait_for_server(port);
    port
}

fn wait_for_server(port: u16) {
    for _ in 0..50 {
        if TcpStream::connect(("::1", port)).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("timed out waiting for server on port {port}");
}

fn connect(port: u16) -> Client {
    Client::init_client("::1", port).expect("connect to server")
}

/// S1: echo.
#[test]
fn echo_round_trips_payload() {
    let port = spawn_server(|server| {
        server.register("echo", Box::new(Some)).unwrap();
    });

    let mut client = connect(port);
    let handle = client.find("echo").unwrap();
    assert_eq!(handle.id(), 0);

    let request = Payload::new(42, vec![0x61, 0x62, 0x63]);
    let response = client.call(handle, request.clone()).unwrap();
    assert_eq!(response, request);

    client.close_client().unwrap();
}

/// S2: not found.
#[test]
fn find_on_empty_registry_is_not_found() {
    let port = spawn_server(|_| {});

    let mut client = connect(port);
    let err = client.find("missing").unwrap_err();
    assert!(matches!(err, Error::NotFound));
}

/// S3: id stability across re-registration.
#[test]
fn reregistration_preserves_id_and_swaps_handler() {
    let port = spawn_server(|server| {
        server.register("a", Box::new(Some)).unwrap();
        server.register("b", Box::new(Some)).unwrap();
        server.register("c", Box::new(Some)).unwrap();
    });

    let mut client = connect(port);
    let a = client.find("a").unwrap();
    let b = client.find("b").unwrap();
    let c = client.find("c").unwrap();
    assert_eq!((a.id(), b.id(), c.id()), (0, 1, 2));

    client.close_client().unwrap();
}

/// S5: oversize payload rejected locally, client never touches the transport past the handshake.
#[test]
fn oversize_payload_is_rejected_locally() {
    let port = spawn_server(|server| {
        server.register("echo", Box::new(Some)).unwrap();
    });

    let mut client = connect(port);
    let handle = client.find("echo").unwrap();

    let oversized = Payload::new(0, vec![0u8; 100_000]);
    let err = client.call(handle, oversized).unwrap_err();
    assert!(matches!(err, Error::Overflow));
}

/// S6: two concurrent clients each get their own result regardless of interleaving.
#[test]
fn concurrent_clients_get_independent_results() {
    let port = spawn_server(|server| {
        server
            .register(
                "double",
                Box::new(|p: Payload| Some(Payload::new(p.data1 * 2, Vec::new()))),
            )
            .unwrap();
    });

    let call_with = |value: i64| -> i64 {
        let mut client = connect(port);
        let handle = client.find("double").unwrap();
        let response = client.call(handle, Payload::new(value, Vec::new())).unwrap();
        response.data1
    };

    let t1 = thread::spawn(move || call_with(10));
    let t2 = thread::spawn(move || call_with(20));

    assert_eq!(t1.join().unwrap(), 20);
    assert_eq!(t2.join().unwrap(), 40);
}

/// S7: graceful close, and the acceptor keeps serving other connections afterward.
#[test]
fn close_ends_session_but_not_the_server() {
    let port = spawn_server(|server| {
        server.register("echo", Box::new(Some)).unwrap();
    });

    let mut first = connect(port);
    first.find("echo").unwrap();
    first.close_client().unwrap();

    // The acceptor is still alive; a second, independent client can connect and call.
    let mut second = connect(port);
    let handle = second.find("echo").unwrap();
    let response = second
        .call(handle, Payload::new(7, Vec::new()))
        .unwrap();
    assert_eq!(response.data1, 7);
}

/// Invalid function names are rejected by the client locally.
#[test]
fn invalid_name_is_rejected_by_client() {
    let port = spawn_server(|_| {});
    let mut client = connect(port);

    let err = client.find("bad\x01name").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

/// A handler returning `None` is treated as an invalid response, and the session stays usable.
#[test]
fn handler_returning_none_is_invalid_response() {
    let port = spawn_server(|server| {
        server.register("fails", Box::new(|_: Payload| None)).unwrap();
        server.register("echo", Box::new(Some)).unwrap();
    });

    let mut client = connect(port);
    let handle = client.find("fails").unwrap();
    let err = client
        .call(handle, Payload::new(1, Vec::new()))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse));

    // The session is still usable for a subsequent call.
    let handle = client.find("echo").unwrap();
    let response = client.call(handle, Payload::new(5, Vec::new())).unwrap();
    assert_eq!(response.data1, 5);
}
