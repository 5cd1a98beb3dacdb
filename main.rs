use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rppal::i2c::I2c;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rpvscp::bh1750::{self, Bh1750};
use rpvscp::bme280::{self, Bme280};
use rpvscp::bme680::{self, Bme680, HeaterProfile};
use rpvscp::bus;
use rpvscp::events;
use rpvscp::host;
use rpvscp::publish::MeasurementPublisher;
use rpvscp::sensorpuck;
use rpvscp::settings::Settings;
use rpvscp::transport::{self, telnet};
use rpvscp::vscp::level1;
use rpvscp::vscp::measurement::StringMeasurement;
use rpvscp::vscp::{Guid, GuidBuilder, GuidPrefix, GuidSource, VscpEvent, VscpType};

#[derive(Parser)]
#[command(about = "Read sensors and forward the readings as VSCP events")]
struct Cli {
    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Configuration file (default: configs/default.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

/// Control channel login.
#[derive(Args)]
struct Session {
    host: String,
    user: String,
    password: String,
    /// VSCP daemon control port
    #[arg(long, default_value_t = telnet::DEFAULT_PORT)]
    port: u16,
}

#[derive(Subcommand)]
enum Command {
    /// Read a BME280 or BMP280 and publish the measurements over MQTT
    Bme280 {
        /// I2C address
        #[arg(long, default_value_t = bme280::DEFAULT_ADDRESS)]
        address: u16,
    },
    /// Read a BME680 and publish the measurements over MQTT
    Bme680,
    /// Send the BH1750 illuminance as a string measurement
    Bh1750 {
        #[command(flatten)]
        session: Session,
        guid: Option<Guid>,
        #[arg(default_value_t = 0)]
        sensorindex: u8,
        #[arg(default_value_t = 0)]
        zone: u8,
        #[arg(default_value_t = 0)]
        subzone: u8,
    },
    /// Send the CPU temperature
    CpuTemp {
        #[command(flatten)]
        session: Session,
        guid: Option<Guid>,
    },
    /// Send a node heartbeat
    Heartbeat {
        #[command(flatten)]
        session: Session,
        guid: Option<Guid>,
    },
    /// Send `<onewire-id> <temperature>` lines read from stdin
    SendValues {
        #[command(flatten)]
        session: Session,
    },
    /// Send every stdin line as a string measurement
    SendMeasurement {
        #[command(flatten)]
        session: Session,
        guid: Guid,
        /// Measurement type code
        vscp_type: u16,
        #[arg(default_value_t = 0)]
        unit: u8,
        #[arg(default_value_t = 0)]
        sensorindex: u8,
        #[arg(default_value_t = 0)]
        zone: u8,
        #[arg(default_value_t = 0)]
        subzone: u8,
    },
    /// Send SensorPuck readings from `<mac> <rssi> <advertisement>` stdin lines
    Sensorpuck {
        #[command(flatten)]
        session: Session,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // configuration warnings are printed before the real subscriber exists
    let early = tracing_subscriber::fmt().with_max_level(tracing::Level::WARN).finish();
    let settings = tracing::subscriber::with_default(early, || Settings::load(cli.config.as_deref()))?;

    let level = if cli.verbose { "debug" } else { settings.logger.level.as_str() };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME");
            format!("{app_name}={level}").into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Bme280 { address } => run_bme280(&settings, address),
        Command::Bme680 => run_bme680(&settings),
        Command::Bh1750 {
            session,
            guid,
            sensorindex,
            zone,
            subzone,
        } => {
            let mut sensor = Bh1750::new(bus::open(bus::DEFAULT_BUS, bh1750::DEFAULT_ADDRESS)?)?;
            let lux = sensor.read_lux()?;
            tracing::info!("illuminance: {:.2} lx", lux);
            let event = events::illuminance_event(guid.unwrap_or_default(), lux, sensorindex, zone, subzone)?;
            send(&session, vec![event])
        }
        Command::CpuTemp { session, guid } => {
            let millidegrees = host::read_cpu_temperature(Path::new(host::THERMAL_ZONE))
                .with_context(|| format!("reading {}", host::THERMAL_ZONE))?;
            send(
                &session,
                vec![events::cpu_temperature_event(guid.unwrap_or_default(), &millidegrees)?],
            )
        }
        Command::Heartbeat { session, guid } => send(&session, vec![events::heartbeat_event(guid.unwrap_or_default())?]),
        Command::SendValues { session } => {
            let queued = read_stdin_events(|line| Ok(vec![events::onewire_temperature_event(line)?]))?;
            send(&session, queued)
        }
        Command::SendMeasurement {
            session,
            guid,
            vscp_type,
            unit,
            sensorindex,
            zone,
            subzone,
        } => {
            let kind = VscpType::measurement(vscp_type);
            let queued = read_stdin_events(|line| {
                let measurement = StringMeasurement::new(sensorindex, zone, subzone, unit, line);
                Ok(vec![events::string_measurement_event(guid, kind, &measurement)?])
            })?;
            send(&session, queued)
        }
        Command::Sensorpuck { session } => send(&session, read_stdin_events(sensorpuck_events)?),
    }
}

fn guid_builder(settings: &Settings) -> anyhow::Result<GuidBuilder> {
    let source = if settings.vscp.guid.trim().is_empty() {
        let mac = host::read_mac_address(&settings.vscp.interface)?;
        GuidSource::Mac {
            prefix: GuidPrefix::Ethernet,
            mac,
        }
    } else {
        GuidSource::Explicit(settings.vscp.guid.parse()?)
    };
    Ok(GuidBuilder::new(source).apply_suffix_to_explicit_guid(settings.vscp.apply_suffix_to_explicit_guid))
}

fn run_bme280(settings: &Settings, address: u16) -> anyhow::Result<()> {
    let i2c = bus::open(bus::DEFAULT_BUS, address).context("opening the I2C bus")?;
    let mut sensor = Bme280::new(i2c)?;
    let identity = sensor.identity();
    tracing::info!(
        "{} chip id {} version {}",
        identity.variant.name(),
        identity.chip_id,
        identity.version
    );

    let reading = sensor.read()?;
    let publisher = MeasurementPublisher::new(settings, guid_builder(settings)?, identity.variant.name());
    let publications = publisher.for_reading(&reading, &settings.bme280)?;
    transport::publish_all(&settings.mqtt, &publications)?;
    Ok(())
}

fn open_bme680(heater: Option<HeaterProfile>) -> rpvscp::Result<Bme680<I2c>> {
    let primary = bus::open(bus::DEFAULT_BUS, bme680::PRIMARY_ADDRESS).and_then(|i2c| Bme680::new(i2c, heater));
    match primary {
        Ok(sensor) => Ok(sensor),
        Err(e) => {
            tracing::debug!("no BME680 at 0x{:02x}: {}", bme680::PRIMARY_ADDRESS, e);
            Bme680::new(bus::open(bus::DEFAULT_BUS, bme680::SECONDARY_ADDRESS)?, heater)
        }
    }
}

fn run_bme680(settings: &Settings) -> anyhow::Result<()> {
    let config = &settings.bme680;
    let heater = config.gas_enabled.then(|| HeaterProfile {
        temperature: config.heater_temperature,
        duration_ms: config.heater_duration,
    });
    let mut sensor = open_bme680(heater).context("no BME680 found")?;
    tracing::info!("BME680 version {}", sensor.identity().version);

    let reading = sensor.read()?;
    let publisher = MeasurementPublisher::new(settings, guid_builder(settings)?, "BME680");
    let publications = publisher.for_reading(&reading, &config.barometer)?;
    transport::publish_all(&settings.mqtt, &publications)?;
    Ok(())
}

fn sensorpuck_events(line: &str) -> rpvscp::Result<Vec<VscpEvent>> {
    let (mac, rssi, advertisement) = sensorpuck::parse_line(line)?;
    match sensorpuck::parse_advertisement(&advertisement)? {
        Some(sample) => {
            tracing::info!("SensorPuck {}: {:?}, {} dBm", mac, sample, rssi);
            sensorpuck::events(&mac, rssi, &sample)
        }
        None => {
            tracing::debug!("{} is not a SensorPuck", mac);
            Ok(Vec::new())
        }
    }
}

/// Events from every non-empty stdin line. Lines that do not convert are
/// logged and skipped.
fn read_stdin_events<F>(mut convert: F) -> anyhow::Result<Vec<VscpEvent>>
where
    F: FnMut(&str) -> rpvscp::Result<Vec<VscpEvent>>,
{
    let mut events = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match convert(&line) {
            Ok(mut converted) => events.append(&mut converted),
            Err(e) => tracing::warn!("skipping '{}': {}", line, e),
        }
    }
    Ok(events)
}

fn send(session: &Session, events: Vec<VscpEvent>) -> anyhow::Result<()> {
    let lines = events.iter().map(level1::encode_line).collect();
    let report = telnet::run_session(&session.host, session.port, &session.user, &session.password, lines)
        .with_context(|| format!("sending to {}:{}", session.host, session.port))?;
    if report.rejected > 0 {
        tracing::warn!("{} of {} events rejected", report.rejected, report.sent);
    } else {
        tracing::info!("sent {} events", report.sent);
    }
    Ok(())
}
