use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Instant;

use rpvscp::transport::telnet::{run_session, Handshake, State, READ_TIMEOUT};
use rpvscp::Error;

const HEARTBEAT: &str = "3,20,9,,0,0,-,0x0,0xff,0xff";
const TEMPERATURE: &str = "3,10,6,,0,0,-,0x48,0x32,0x31,0x2e,0x35,0x30";

#[test]
fn test_single_event_script() {
    let mut handshake = Handshake::new("admin", "secret", vec![HEARTBEAT.to_string()]);
    let replies: Vec<Option<String>> = ["+OK", "+OK", "+OK - Success.", "+OK - Success."]
        .iter()
        .map(|line| handshake.on_line(line).unwrap())
        .collect();
    assert_eq!(
        replies,
        vec![
            Some("user admin".to_string()),
            Some("pass secret".to_string()),
            Some(format!("send {}", HEARTBEAT)),
            Some("quit".to_string()),
        ]
    );
    assert_eq!(handshake.state(), State::Closed);
    assert_eq!(handshake.rejected(), 0);
}

#[test]
fn test_rejected_send_continues() {
    let events = vec![HEARTBEAT.to_string(), TEMPERATURE.to_string()];
    let mut handshake = Handshake::new("admin", "secret", events);
    handshake.on_line("+OK").unwrap();
    handshake.on_line("+OK").unwrap();
    assert_eq!(handshake.on_line("+OK").unwrap(), Some(format!("send {}", HEARTBEAT)));
    assert_eq!(
        handshake.on_line("-ERR - Invalid event.").unwrap(),
        Some(format!("send {}", TEMPERATURE))
    );
    assert_eq!(handshake.state(), State::AwaitQuitAck);
    assert_eq!(handshake.on_line("+OK").unwrap().as_deref(), Some("quit"));
    assert_eq!(handshake.rejected(), 1);
}

#[test]
fn test_user_rejected() {
    let mut handshake = Handshake::new("nobody", "secret", vec![HEARTBEAT.to_string()]);
    handshake.on_line("+OK").unwrap();
    assert!(matches!(handshake.on_line("-ERR"), Err(Error::Telnet(_))));
    assert!(handshake.is_finished());
}

/// Accepts one connection, answers every line but `quit` with
/// `reply(line)` and returns what the client wrote.
fn scripted_server<F>(reply: F) -> (u16, thread::JoinHandle<Vec<String>>)
where
    F: Fn(&str) -> Option<&'static str> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"Welcome to the VSCP daemon\r\n+OK - Success.\r\n").unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut received = Vec::new();
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap_or(0) > 0 {
            let command = line.trim_end().to_string();
            line.clear();
            if command == "quit" {
                received.push(command);
                break;
            }
            if let Some(answer) = reply(&command) {
                stream.write_all(answer.as_bytes()).unwrap();
                stream.write_all(b"\r\n").unwrap();
            }
            received.push(command);
        }
        received
    });
    (port, handle)
}

#[test]
fn test_session_over_tcp() {
    let (port, server) = scripted_server(|command| {
        if command.starts_with("send 3,10") {
            Some("-ERR - Invalid event.")
        } else {
            Some("+OK - Success.")
        }
    });

    let report = run_session(
        "127.0.0.1",
        port,
        "admin",
        "secret",
        vec![HEARTBEAT.to_string(), TEMPERATURE.to_string()],
    )
    .unwrap();
    assert_eq!(report.sent, 2);
    assert_eq!(report.rejected, 1);

    assert_eq!(
        server.join().unwrap(),
        vec![
            "user admin".to_string(),
            "pass secret".to_string(),
            format!("send {}", HEARTBEAT),
            format!("send {}", TEMPERATURE),
            "quit".to_string(),
        ]
    );
}

#[test]
fn test_session_with_bad_password() {
    let (port, server) = scripted_server(|command| {
        if command.starts_with("pass ") {
            Some("-ERR - Invalid password.")
        } else {
            Some("+OK")
        }
    });

    let result = run_session("127.0.0.1", port, "admin", "wrong", vec![HEARTBEAT.to_string()]);
    assert!(matches!(result, Err(Error::Telnet(_))));
    assert_eq!(server.join().unwrap(), vec!["user admin".to_string(), "pass wrong".to_string()]);
}

#[test]
fn test_session_times_out_on_silent_server() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut sink = Vec::new();
        let _ = stream.read_to_end(&mut sink);
    });

    let started = Instant::now();
    let result = run_session("127.0.0.1", port, "admin", "secret", vec![HEARTBEAT.to_string()]);
    match result {
        Err(Error::Telnet(message)) => {
            assert!(message.contains("timed out"), "{}", message);
            assert!(message.contains("AwaitLoginAck"), "{}", message);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(started.elapsed() >= READ_TIMEOUT);
    server.join().unwrap();
}

#[test]
fn test_session_reports_closed_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"Welcome to the VSCP daemon\r\n+OK - Success.\r\n").unwrap();
        let mut line = String::new();
        BufReader::new(&stream).read_line(&mut line).unwrap();
        line.trim_end().to_string()
    });

    let result = run_session("127.0.0.1", port, "admin", "secret", vec![HEARTBEAT.to_string()]);
    match result {
        Err(Error::Telnet(message)) => {
            assert!(message.contains("connection closed"), "{}", message);
            assert!(message.contains("AwaitPasswordAck"), "{}", message);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(server.join().unwrap(), "user admin");
}
