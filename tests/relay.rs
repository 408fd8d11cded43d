//! Relay client against a local HTTP server answering with scripted statuses.

use std::{
    io::{BufRead, BufReader, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
    time::Duration,
};

use swctl::power::{self, PowerControl, Relay};
use swctl::Error;

/// Serve one connection per scripted body and return the request lines seen.
fn serve(bodies: Vec<&'static str>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let host = listener.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for body in bodies {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            requests.push(request_line.trim_end().to_string());
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();
        }
        requests
    });

    (host, handle)
}

#[test]
fn reads_the_power_state() {
    let (host, server) = serve(vec![r#"{"ison":true,"source":"http"}"#]);
    let relay = Relay::new(&host).unwrap();

    assert!(relay.is_on().unwrap());
    assert_eq!(server.join().unwrap(), vec!["GET /relay/0 HTTP/1.1"]);
}

#[test]
fn switching_requires_confirmation() {
    let (host, server) = serve(vec![r#"{"ison":false}"#, r#"{"ison":false}"#]);
    let relay = Relay::new(&host).unwrap();

    relay.set_on(false).unwrap();
    match relay.set_on(true) {
        Err(Error::RelayState { turn }) => assert_eq!(turn, "on"),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(
        server.join().unwrap(),
        vec![
            "GET /relay/0?turn=off HTTP/1.1",
            "GET /relay/0?turn=on HTTP/1.1"
        ]
    );
}

#[test]
fn reboot_cycles_a_powered_relay() {
    let (host, server) = serve(vec![
        r#"{"ison":true}"#,
        r#"{"ison":false}"#,
        r#"{"ison":true}"#,
    ]);
    let relay = Relay::new(&host).unwrap();

    power::reboot(&relay, Duration::from_millis(10)).unwrap();
    assert_eq!(
        server.join().unwrap(),
        vec![
            "GET /relay/0 HTTP/1.1",
            "GET /relay/0?turn=off HTTP/1.1",
            "GET /relay/0?turn=on HTTP/1.1"
        ]
    );
}

#[test]
fn malformed_answer_is_an_error() {
    let (host, server) = serve(vec![r#"{"power":"on"}"#]);
    let relay = Relay::new(&host).unwrap();

    assert!(matches!(relay.is_on(), Err(Error::Http(_))));
    server.join().unwrap();
}

#[test]
fn unreachable_relay_fails_the_reboot() {
    // Bind then drop to get a port nobody listens on.
    let host = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let relay = Relay::new(&host).unwrap();

    let err = power::reboot(&relay, Duration::from_millis(10)).unwrap_err();
    assert!(err.to_string().starts_with("failed to check the power state"));
}
