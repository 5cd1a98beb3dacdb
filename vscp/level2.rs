//! Level II JSON form published over MQTT, and topic templating.

use serde::Serialize;

use crate::error::Result;
use crate::vscp::event::VscpEvent;
use crate::vscp::guid::Guid;

/// Extra measurement block carried next to the raw event fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementInfo {
    pub value: f64,
    pub unit: u8,
    pub sensorindex: u8,
    pub zone: u8,
    pub subzone: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Document<'a> {
    vscp_head: u16,
    vscp_ob_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    vscp_date_time: Option<&'a str>,
    vscp_time_stamp: u32,
    vscp_class: u16,
    vscp_type: u16,
    vscp_guid: String,
    vscp_data: &'a [u8],
    #[serde(skip_serializing_if = "Option::is_none")]
    vscp_note: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    measurement: Option<&'a MeasurementInfo>,
}

pub fn to_json(event: &VscpEvent, note: Option<&str>, measurement: Option<&MeasurementInfo>) -> Result<String> {
    let document = Document {
        vscp_head: event.head(),
        vscp_ob_id: event.obid,
        vscp_date_time: event.datetime.as_deref(),
        vscp_time_stamp: event.timestamp.value(),
        vscp_class: event.class.code(),
        vscp_type: event.vscp_type.code(),
        vscp_guid: event.guid.to_string(),
        vscp_data: event.data.as_slice(),
        vscp_note: note,
        measurement,
    };
    Ok(serde_json::to_string(&document)?)
}

/// Substitute `{xguid}`, `{xclass}`, `{xtype}` and `{xsensorindex}`.
pub fn render_topic(template: &str, guid: &Guid, vscp_class: u16, vscp_type: u16, sensor_index: u8) -> String {
    template
        .replace("{xguid}", &guid.to_string())
        .replace("{xclass}", &vscp_class.to_string())
        .replace("{xtype}", &vscp_type.to_string())
        .replace("{xsensorindex}", &sensor_index.to_string())
}
