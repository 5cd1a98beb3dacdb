//! Client side of the VSCP daemon control channel.
//!
//! The session is a fixed expect/response script: wait for the greeting,
//! log in, send every queued event and quit. [`Handshake`] holds the script
//! state; [`run_session`] drives it over a blocking TCP stream.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 9598;
pub const READ_TIMEOUT: Duration = Duration::from_secs(2);

const ACK: &str = "+OK";
const NACK: &str = "-ERR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the server greeting.
    AwaitLoginAck,
    /// `user` sent.
    AwaitPasswordAck,
    /// `pass` (for `next == 0`) or the previous `send` is outstanding.
    AwaitSendAck { next: usize },
    /// The last `send` is outstanding.
    AwaitQuitAck,
    Closed,
    Aborted,
}

#[derive(Debug)]
pub struct Handshake {
    user: String,
    password: String,
    events: Vec<String>,
    state: State,
    rejected: usize,
}

impl Handshake {
    /// `events` are Level I lines without the `send ` command.
    pub fn new(user: impl Into<String>, password: impl Into<String>, events: Vec<String>) -> Self {
        Handshake {
            user: user.into(),
            password: password.into(),
            events,
            state: State::AwaitLoginAck,
            rejected: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Number of `send` commands answered with `-ERR`.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Closed | State::Aborted)
    }

    /// Feed one line from the server. Returns the command to write next, if
    /// any. Lines that are neither an ack nor a nack are ignored.
    pub fn on_line(&mut self, line: &str) -> Result<Option<String>> {
        let line = line.trim();
        let ack = line.starts_with(ACK);
        let nack = line.starts_with(NACK);
        if !ack && !nack {
            return Ok(None);
        }

        match self.state {
            State::AwaitLoginAck | State::AwaitPasswordAck | State::AwaitSendAck { next: 0 } if nack => {
                self.state = State::Aborted;
                Err(Error::Telnet(format!("login rejected: {}", line)))
            }
            State::AwaitLoginAck => {
                self.state = State::AwaitPasswordAck;
                Ok(Some(format!("user {}", self.user)))
            }
            State::AwaitPasswordAck => {
                self.state = State::AwaitSendAck { next: 0 };
                Ok(Some(format!("pass {}", self.password)))
            }
            State::AwaitSendAck { next } => {
                if nack {
                    self.reject(next - 1, line);
                }
                Ok(Some(self.send_or_quit(next)))
            }
            State::AwaitQuitAck => {
                if nack {
                    self.reject(self.events.len() - 1, line);
                }
                self.state = State::Closed;
                Ok(Some("quit".to_string()))
            }
            State::Closed | State::Aborted => Ok(None),
        }
    }

    /// The server went away or stopped answering.
    pub fn abort(&mut self) {
        if self.state != State::Closed {
            self.state = State::Aborted;
        }
    }

    fn send_or_quit(&mut self, next: usize) -> String {
        match self.events.get(next) {
            Some(event) => {
                self.state = if next + 1 == self.events.len() {
                    State::AwaitQuitAck
                } else {
                    State::AwaitSendAck { next: next + 1 }
                };
                format!("send {}", event)
            }
            None => {
                self.state = State::Closed;
                "quit".to_string()
            }
        }
    }

    fn reject(&mut self, index: usize, line: &str) {
        self.rejected += 1;
        tracing::warn!("event {} rejected: {}", self.events[index], line);
    }
}

/// Outcome of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub sent: usize,
    pub rejected: usize,
}

/// Log in at `host:port`, send `events` one by one and quit.
pub fn run_session(host: &str, port: u16, user: &str, password: &str, events: Vec<String>) -> Result<SessionReport> {
    let address = (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| Error::Telnet(format!("cannot resolve {}", host)))?;
    let mut stream = TcpStream::connect_timeout(&address, READ_TIMEOUT)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    tracing::debug!("connected to {}", address);

    let sent = events.len();
    let mut handshake = Handshake::new(user, password, events);
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    while !handshake.is_finished() {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                let state = handshake.state();
                handshake.abort();
                return Err(Error::Telnet(format!("connection closed in state {:?}", state)));
            }
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                let state = handshake.state();
                handshake.abort();
                return Err(Error::Telnet(format!("timed out in state {:?}", state)));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::trace!("<< {}", line.trim_end());

        if let Some(command) = handshake.on_line(&line)? {
            if command.starts_with("pass ") {
                tracing::trace!(">> pass ********");
            } else {
                tracing::trace!(">> {}", command);
            }
            stream.write_all(command.as_bytes())?;
            stream.write_all(b"\n")?;
            stream.flush()?;
        }
    }

    Ok(SessionReport {
        sent,
        rejected: handshake.rejected(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_lines_are_ignored() {
        let mut handshake = Handshake::new("admin", "secret", vec![]);
        assert_eq!(handshake.on_line("Welcome to the VSCP daemon\r\n").unwrap(), None);
        assert_eq!(handshake.state(), State::AwaitLoginAck);
    }

    #[test]
    fn test_no_events_quits_after_login() {
        let mut handshake = Handshake::new("admin", "secret", vec![]);
        handshake.on_line("+OK").unwrap();
        handshake.on_line("+OK").unwrap();
        assert_eq!(handshake.on_line("+OK - Success.").unwrap().as_deref(), Some("quit"));
        assert_eq!(handshake.state(), State::Closed);
    }

    #[test]
    fn test_password_rejected_is_terminal() {
        let mut handshake = Handshake::new("admin", "wrong", vec!["3,20,9,,0,0,-".to_string()]);
        handshake.on_line("+OK").unwrap();
        handshake.on_line("+OK").unwrap();
        assert!(handshake.on_line("-ERR - Invalid password.").is_err());
        assert_eq!(handshake.state(), State::Aborted);
        assert_eq!(handshake.on_line("+OK").unwrap(), None);
    }

    #[test]
    fn test_abort_after_close_keeps_closed() {
        let mut handshake = Handshake::new("admin", "secret", vec![]);
        handshake.on_line("+OK").unwrap();
        handshake.on_line("+OK").unwrap();
        handshake.on_line("+OK").unwrap();
        handshake.abort();
        assert_eq!(handshake.state(), State::Closed);
    }
}
