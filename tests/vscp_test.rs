use rpvscp::mac::MacAddress;
use rpvscp::vscp::level1::encode_line;
use rpvscp::vscp::level2::{render_topic, to_json};
use rpvscp::vscp::measurement::{level1_string_payload, StringMeasurement};
use rpvscp::vscp::{Guid, GuidBuilder, GuidPrefix, GuidSource, MeasurementType, Priority, VscpClass, VscpEvent};
use serde_json::Value;

const SEQUENTIAL: &str = "00:01:02:03:04:05:06:07:08:09:0A:0B:0C:0D:0E:0F";

#[test]
fn test_topic_template() {
    let guid: Guid = SEQUENTIAL.parse().unwrap();
    assert_eq!(
        render_topic("vscp/{xguid}/{xclass}/{xtype}/{xsensorindex}", &guid, 1040, 6, 2),
        format!("vscp/{}/1040/6/2", SEQUENTIAL)
    );
}

#[test]
fn test_level1_temperature_line() {
    let event = VscpEvent::new(VscpClass::Measurement, MeasurementType::Temperature.into(), Guid::NULL)
        .unwrap()
        .with_data(&level1_string_payload(1, 0, "21.50"))
        .unwrap();
    assert_eq!(encode_line(&event), "3,10,6,,0,0,-,0x48,0x32,0x31,0x2e,0x35,0x30");
}

#[test]
fn test_level1_priority_field() {
    let event = VscpEvent::new(VscpClass::Measurement, MeasurementType::Temperature.into(), Guid::NULL)
        .unwrap()
        .with_priority(Priority::LOWEST);
    assert_eq!(encode_line(&event), "7,10,6,,0,0,-");
}

#[test]
fn test_guid_text_round_trip() {
    let lower: Guid = SEQUENTIAL.to_lowercase().parse().unwrap();
    assert_eq!(lower.to_string(), SEQUENTIAL);
    assert_eq!(lower.to_string().parse::<Guid>().unwrap(), lower);
}

#[test]
fn test_builder_keeps_explicit_guid() {
    let guid: Guid = SEQUENTIAL.parse().unwrap();
    let builder = GuidBuilder::new(GuidSource::Explicit(guid));
    assert_eq!(builder.build(5), guid);

    let suffixed = builder.apply_suffix_to_explicit_guid(true).build(0x0105);
    assert_eq!(suffixed.to_string(), "00:01:02:03:04:05:06:07:08:09:0A:0B:0C:0D:01:05");
}

#[test]
fn test_builder_from_mac() {
    let mac: MacAddress = "b8:27:eb:12:34:56".parse().unwrap();
    let builder = GuidBuilder::new(GuidSource::Mac {
        prefix: GuidPrefix::Ethernet,
        mac,
    });
    assert_eq!(builder.build(3).to_string(), "FF:FF:FF:FF:FF:FF:FF:FE:B8:27:EB:12:34:56:00:03");
    assert_ne!(builder.build(3), builder.build(4));
}

#[test]
fn test_level2_document_without_extras() {
    let guid: Guid = SEQUENTIAL.parse().unwrap();
    let measurement = StringMeasurement::new(2, 0, 0, 1, "21.50");
    let event = VscpEvent::new(VscpClass::MeasurementStr, MeasurementType::Temperature.into(), guid)
        .unwrap()
        .with_data(&measurement.payload())
        .unwrap();

    let value: Value = serde_json::from_str(&to_json(&event, None, None).unwrap()).unwrap();
    assert_eq!(value["vscpClass"], 1040);
    assert_eq!(value["vscpType"], 6);
    assert_eq!(value["vscpGuid"], SEQUENTIAL);
    assert_eq!(value["vscpData"].as_array().unwrap().len(), 9);
    assert!(value.get("vscpNote").is_none());
    assert!(value.get("measurement").is_none());
    assert!(value.get("vscpDateTime").is_none());
}
