//! Modbus RTU Slave Demo
//!
//! Runs a master and a slave over an in-memory pipe standing in for the
//! serial line:
//! - Read holding registers (FC03)
//! - Write multiple registers (FC16) and read them back
//! - Exception responses for an unsupported function and an unmapped range
//! - Silence for a frame addressed to another station
//!
//! Usage: cargo run --features demo --bin demo
//! Set RUST_LOG=debug to see the slave's frame logging.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::time::timeout;
use tracing::info;
use tracing_subscriber::EnvFilter;

use modbus_rtu_slave::{
    checksum, RegisterBank, RegisterBinding, ResponseSink, RtuSlave,
    SlaveConfig, SlaveError,
};

const STATION: u8 = 0x11;
const RESPONSE_TIMEOUT: Duration = Duration::from_millis(200);

/// Holds the slave's answer until it is written to the line
#[derive(Default)]
struct Outbox(Option<Vec<u8>>);

impl ResponseSink for Outbox {
    fn respond(&mut self, frame: &[u8]) {
        self.0 = Some(frame.to_vec());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🚀 Modbus RTU Slave v{} Demo", modbus_rtu_slave::VERSION);
    println!("===============================");

    let (master_port, slave_port) = tokio::io::duplex(512);
    let slave = tokio::spawn(run_slave(slave_port));

    run_master(master_port).await?;

    // Master side closed the line; the slave loop ends on EOF
    slave.await??;
    println!("\n✅ Demo completed");
    Ok(())
}

async fn run_slave(mut port: DuplexStream) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bank = RegisterBank::from_values(0x0000, vec![230, 231, 229, 500]);

    let mut slave = RtuSlave::new(
        SlaveConfig::new(STATION).with_max_stream_registers(16),
        Outbox::default(),
    )?;
    slave.register(
        RegisterBinding::new(0x0000, 4)
            .with_read(bank.clone())
            .with_write(bank.clone()),
    )?;
    // Read-only diagnostic block: 0x0100 reports uptime ticks
    let mut ticks: u16 = 0;
    slave.register(RegisterBinding::new(0x0100, 1).with_read_fn(move |address| {
        if address != 0x0100 {
            return Err(SlaveError::access(address, "no such diagnostic"));
        }
        ticks = ticks.wrapping_add(1);
        Ok(ticks)
    }))?;

    // One read is one frame here; a real serial driver delimits frames by
    // the 3.5 character silence before handing them over.
    let mut buf = [0u8; 256];
    loop {
        let n = port.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        let outcome = slave.process(&buf[..n]);
        info!("Slave outcome: {:?}", outcome);

        if let Some(frame) = slave.sink_mut().0.take() {
            port.write_all(&frame).await?;
        }
    }

    let stats = slave.stats();
    println!("\n📊 Slave statistics");
    println!("  frames processed: {}", stats.frames_processed);
    println!("  responses sent:   {}", stats.responses_sent);
    println!("  exceptions sent:  {}", stats.exceptions_sent);
    println!("  frames dropped:   {}", stats.frames_dropped);
    println!("  registers now:    {:?}", bank.snapshot());
    Ok(())
}

async fn run_master(mut port: DuplexStream) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("\n📖 Part 1: Read holding registers 0x0000..0x0004");
    let response = transact(&mut port, &read_request(STATION, 0x0000, 4)).await?;
    print_response(response.as_deref());

    println!("\n✍️  Part 2: Write [240, 241] at 0x0001, then read back");
    let response = transact(&mut port, &write_request(STATION, 0x0001, &[240, 241])).await?;
    print_response(response.as_deref());
    let response = transact(&mut port, &read_request(STATION, 0x0000, 4)).await?;
    print_response(response.as_deref());

    println!("\n⏱️  Part 3: Read the diagnostic counter twice");
    for _ in 0..2 {
        let response = transact(&mut port, &read_request(STATION, 0x0100, 1)).await?;
        print_response(response.as_deref());
    }

    println!("\n⚠️  Part 4: Exceptions");
    let mut single_write = vec![STATION, 0x06, 0x00, 0x00, 0x00, 0x01];
    checksum::append(&mut single_write);
    println!("  FC06 (unsupported):");
    print_response(transact(&mut port, &single_write).await?.as_deref());
    println!("  Range outside every binding:");
    print_response(
        transact(&mut port, &read_request(STATION, 0x00FF, 2))
            .await?
            .as_deref(),
    );

    println!("\n🔇 Part 5: Frame for station 0x12");
    print_response(
        transact(&mut port, &read_request(0x12, 0x0000, 1))
            .await?
            .as_deref(),
    );

    port.shutdown().await?;
    Ok(())
}

/// Send a request and wait for one response frame
async fn transact(
    port: &mut DuplexStream,
    request: &[u8],
) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error + Send + Sync>> {
    println!("  TX {:02X?}", request);
    port.write_all(request).await?;

    let mut buf = [0u8; 256];
    match timeout(RESPONSE_TIMEOUT, port.read(&mut buf)).await {
        Ok(n) => Ok(Some(buf[..n?].to_vec())),
        Err(_) => Ok(None),
    }
}

fn read_request(station: u8, address: u16, count: u16) -> Vec<u8> {
    let mut frame = vec![station, 0x03];
    frame.extend_from_slice(&address.to_be_bytes());
    frame.extend_from_slice(&count.to_be_bytes());
    checksum::append(&mut frame);
    frame
}

fn write_request(station: u8, address: u16, values: &[u16]) -> Vec<u8> {
    let mut frame = vec![station, 0x10];
    frame.extend_from_slice(&address.to_be_bytes());
    frame.extend_from_slice(&(values.len() as u16).to_be_bytes());
    frame.push((values.len() * 2) as u8);
    for value in values {
        frame.extend_from_slice(&value.to_be_bytes());
    }
    checksum::append(&mut frame);
    frame
}

fn print_response(response: Option<&[u8]>) {
    let Some(frame) = response else {
        println!("  RX (no response)");
        return;
    };
    println!("  RX {:02X?}", frame);

    if !checksum::is_intact(frame) || frame.len() < 5 {
        println!("     ❌ malformed response");
        return;
    }
    match frame[1] {
        fc if fc & 0x80 != 0 => {
            println!("     exception 0x{:02X} for FC{:02X}", frame[2], fc & 0x7F);
        }
        0x03 => {
            let values: Vec<u16> = frame[3..frame.len() - 2]
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            println!("     values {:?}", values);
        }
        0x10 => println!("     write acknowledged"),
        fc => println!("     unexpected FC{:02X}", fc),
    }
}

