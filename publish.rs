//! Turns a calibrated reading into Level II string measurements for MQTT.

use crate::compensation::{adjusted_pressure, altitude, dewpoint};
use crate::error::Result;
use crate::settings::{Barometer, Measurement, Settings};
use crate::structs::Reading;
use crate::transport::mqtt::{qos, Publication};
use crate::vscp::level2::{self, MeasurementInfo};
use crate::vscp::measurement::{format_fixed, StringMeasurement};
use crate::vscp::{GuidBuilder, MeasurementType, VscpClass, VscpEvent};

const UNIT_DEFAULT: u8 = 0;
const UNIT_CELSIUS: u8 = 1;

pub struct MeasurementPublisher<'a> {
    settings: &'a Settings,
    guids: GuidBuilder,
    chip: &'static str,
}

impl<'a> MeasurementPublisher<'a> {
    /// `chip` ends up in the default notes, e.g. "Temperature from BME280".
    pub fn new(settings: &'a Settings, guids: GuidBuilder, chip: &'static str) -> Self {
        MeasurementPublisher { settings, guids, chip }
    }

    /// Temperature, pressure, adjusted pressure and altitude always; humidity
    /// and dewpoint when the chip has a humidity sensor; gas resistance when
    /// the heater produced a valid sample. BME280 and BMP280 pressures are
    /// published in hPa, BME680 pressures in Pa.
    pub fn for_reading(&self, reading: &Reading, barometer: &Barometer) -> Result<Vec<Publication>> {
        let m = &self.settings.measurement;
        let temperature = reading.temperature() - barometer.temp_corr;
        let pressure = reading.pressure();
        tracing::info!("temperature: {:.2} C, pressure: {:.2} hPa", temperature, pressure);

        let mut publications = Vec::new();
        let mut push = |publication: Option<Publication>| {
            if let Some(publication) = publication {
                publications.push(publication);
            }
        };

        push(self.publication(
            MeasurementType::Temperature,
            &m.temperature,
            "Temperature",
            UNIT_CELSIUS,
            temperature,
            format_fixed(temperature, 2),
        )?);

        if let Some(humidity) = reading.humidity() {
            tracing::info!("humidity: {:.2} %", humidity);
            push(self.publication(
                MeasurementType::Humidity,
                &m.humidity,
                "Humidity",
                UNIT_DEFAULT,
                humidity,
                format_fixed(humidity, 0),
            )?);
        }

        let scale = pressure_scale(reading);
        let scaled = pressure * scale;
        push(self.publication(
            MeasurementType::Pressure,
            &m.pressure,
            "Pressure",
            UNIT_DEFAULT,
            round2(scaled),
            format_fixed(scaled, 2),
        )?);

        let adjusted = adjusted_pressure(pressure, barometer.height_at_location) * scale;
        push(self.publication(
            MeasurementType::Pressure,
            &m.pressure_adj,
            "Sea level pressure",
            UNIT_DEFAULT,
            round2(adjusted),
            format_fixed(adjusted, 2),
        )?);

        let height = altitude(pressure, barometer.sea_level_pressure);
        push(self.publication(
            MeasurementType::Length,
            &m.altitude,
            "Altitude",
            UNIT_DEFAULT,
            round2(height),
            format_fixed(height, 2),
        )?);

        if let Some(humidity) = reading.humidity() {
            let dew = dewpoint(temperature, humidity);
            push(self.publication(
                MeasurementType::Dewpoint,
                &m.dewpoint,
                "Dewpoint",
                UNIT_CELSIUS,
                dew,
                format_fixed(dew, 2),
            )?);
        }

        if let Some(gas) = reading.gas_resistance() {
            tracing::info!("gas resistance: {:.0} ohm", gas);
            push(self.publication(
                MeasurementType::ElectricalResistance,
                &m.gas,
                "Gas resistance",
                UNIT_DEFAULT,
                gas,
                format_fixed(gas, 0),
            )?);
        }

        Ok(publications)
    }

    /// `None` when the topic template renders empty.
    fn publication(
        &self,
        kind: MeasurementType,
        measurement: &Measurement,
        label: &str,
        unit: u8,
        value: f64,
        text: String,
    ) -> Result<Option<Publication>> {
        let vscp = &self.settings.vscp;
        let guid = self.guids.build(measurement.id);
        let payload = StringMeasurement::new(measurement.sensorindex, vscp.zone, vscp.subzone, unit, text).terminated();
        let event = VscpEvent::new(VscpClass::MeasurementStr, kind.into(), guid)?.with_data(&payload.payload())?;

        let note = match &measurement.note {
            Some(note) => note.clone(),
            None => format!("{} from {}", label, self.chip),
        };
        let info = MeasurementInfo {
            value,
            unit,
            sensorindex: measurement.sensorindex,
            zone: vscp.zone,
            subzone: vscp.subzone,
        };

        let topic = level2::render_topic(
            &self.settings.mqtt.topic,
            &guid,
            event.class.code(),
            event.vscp_type.code(),
            measurement.sensorindex,
        );
        if topic.is_empty() {
            tracing::debug!("empty topic, not publishing {}", note);
            return Ok(None);
        }

        Ok(Some(Publication {
            topic,
            qos: qos(measurement.qos),
            payload: level2::to_json(&event, Some(&note), Some(&info))?,
        }))
    }
}

/// Factor from hPa to the unit the chip's measurements are published in.
fn pressure_scale(reading: &Reading) -> f64 {
    match reading {
        Reading::Bme680WithGas { .. } => 100.0,
        Reading::Bme280Full(_) | Reading::Bmp280PressureOnly { .. } => 1.0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
