//! Level I text form used by the `send` command of the control channel:
//! `priority,class,type,datetime,timestamp,obid,guid[,0xNN]*`

use crate::vscp::event::VscpEvent;

/// Render `event` as one line, without the trailing newline.
pub fn encode_line(event: &VscpEvent) -> String {
    let guid = if event.guid.is_null() {
        "-".to_string()
    } else {
        event.guid.to_string()
    };

    let mut line = format!(
        "{},{},{},{},{},{},{}",
        event.priority.value(),
        event.class.code(),
        event.vscp_type.code(),
        event.datetime.as_deref().unwrap_or(""),
        event.timestamp.value(),
        event.obid,
        guid
    );
    for byte in event.data.as_slice().iter().filter(|b| **b != b'\r' && **b != b'\n') {
        line.push_str(&format!(",{:#x}", byte));
    }
    line
}
