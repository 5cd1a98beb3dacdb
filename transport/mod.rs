pub mod mqtt;
pub mod telnet;

pub use mqtt::{publish_all, Publication};
pub use telnet::{run_session, Handshake, SessionReport, State};
