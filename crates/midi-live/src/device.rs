//! Hardware MIDI input via midir.
//!
//! Decoded messages are forwarded into an [`EventSender`], so device
//! callbacks never touch session state directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use midir::{MidiInput, MidiInputConnection};
use tracing::{info, warn};

use crate::midi::{parse_midi_bytes, TimestampedMidiMessage};
use crate::pump::EventSender;

/// Error type for MIDI device operations
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("Failed to initialize MIDI: {0}")]
    InitFailed(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Information about a discovered MIDI port
#[derive(Debug, Clone)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

/// List available MIDI input ports
pub fn list_input_ports() -> Result<Vec<MidiPortInfo>, MidiError> {
    let midi_in =
        MidiInput::new("chordscope-scan").map_err(|e| MidiError::InitFailed(e.to_string()))?;

    let ports = midi_in
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(i, port)| {
            midi_in
                .port_name(port)
                .ok()
                .map(|name| MidiPortInfo { index: i, name })
        })
        .collect();

    Ok(ports)
}

/// An open input port feeding the event pump.
pub struct DeviceInput {
    connection: Option<MidiInputConnection<()>>,
    pub port_name: String,
    pub messages_received: Arc<AtomicU64>,
}

impl DeviceInput {
    /// Connect to the first input port whose name contains `port_pattern`.
    /// An empty pattern picks the first port.
    pub fn open(port_pattern: &str, sender: EventSender) -> Result<Self, MidiError> {
        let midi_in =
            MidiInput::new("chordscope-in").map_err(|e| MidiError::InitFailed(e.to_string()))?;

        let ports = midi_in.ports();
        let port = ports
            .iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .map(|n| n.contains(port_pattern))
                    .unwrap_or(false)
            })
            .ok_or_else(|| MidiError::PortNotFound(port_pattern.to_string()))?;

        let port_name = midi_in
            .port_name(port)
            .map_err(|e| MidiError::ConnectionFailed(e.to_string()))?;

        let messages_received = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&messages_received);

        let connection = midi_in
            .connect(
                port,
                "chordscope-input",
                move |timestamp_us, data, _| {
                    let Some(message) = parse_midi_bytes(data) else {
                        return;
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                    if sender
                        .send(TimestampedMidiMessage {
                            timestamp_us,
                            message,
                        })
                        .is_err()
                    {
                        warn!("event pump has stopped; dropping MIDI input");
                    }
                },
                (),
            )
            .map_err(|e| MidiError::ConnectionFailed(e.to_string()))?;

        info!("Opened MIDI input: {}", port_name);

        Ok(Self {
            connection: Some(connection),
            port_name,
            messages_received,
        })
    }

    /// Close the connection, dropping its sender so the pump can finish.
    pub fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            info!("Closed MIDI input: {}", self.port_name);
        }
    }
}

impl Drop for DeviceInput {
    fn drop(&mut self) {
        self.close();
    }
}
