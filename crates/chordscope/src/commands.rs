//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use midi_live::{
    describe_bytes, messages_from_smf, parse_hex_line, parse_midi_bytes, AnalysisPublisher,
    EventPump, Session, TimestampedMidiMessage,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::output::{self, Format};

pub fn chord(notes: &[i32], format: Format) {
    let chord = harmony::detect_chord(notes.iter().copied());
    debug!(?notes, ?chord, "chord lookup");
    output::emit(&output::chord_line(format, chord.as_deref()));
}

pub fn key(weights: &[f64], format: Format) -> Result<()> {
    let detection = harmony::detect_key(weights).context("key detection needs 12 weights")?;
    output::emit(&output::key_line(format, &detection));
    Ok(())
}

pub fn name(notes: &[i32], format: Format) {
    for &note in notes {
        output::emit(&output::name_line(format, note, &harmony::note_name(note)));
    }
}

pub async fn replay(
    path: &Path,
    session: Session,
    publisher: Arc<dyn AnalysisPublisher>,
) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let messages = messages_from_smf(&bytes)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    info!("Replaying {} ({} events)", path.display(), messages.len());

    let (tx, pump) = EventPump::new(session, publisher);
    for message in messages {
        // The receiver lives until run() below.
        let _ = tx.send(message);
    }
    drop(tx);

    let session = pump.run().await;
    log_totals(&session);
    Ok(())
}

/// Pump hex-encoded MIDI messages from stdin, one message per line.
pub async fn stdin(session: Session, publisher: Arc<dyn AnalysisPublisher>) -> Result<()> {
    let (tx, pump) = EventPump::new(session, publisher);
    let pump = tokio::spawn(pump.run());

    let started = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let bytes = match parse_hex_line(line) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("line {}: {}", line_no, e);
                continue;
            }
        };

        match parse_midi_bytes(&bytes) {
            Some(message) => {
                let event = TimestampedMidiMessage {
                    timestamp_us: started.elapsed().as_micros() as u64,
                    message,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
            None => debug!("line {}: ignored {}", line_no, describe_bytes(&bytes)),
        }
    }
    drop(tx);

    let session = pump.await.context("event pump panicked")?;
    log_totals(&session);
    Ok(())
}

#[cfg(feature = "device")]
pub async fn listen(
    port: &str,
    session: Session,
    publisher: Arc<dyn AnalysisPublisher>,
) -> Result<()> {
    use midi_live::device::DeviceInput;
    use std::sync::atomic::Ordering;

    let (tx, pump) = EventPump::new(session, publisher);
    let pump = tokio::spawn(pump.run());

    let mut input = DeviceInput::open(port, tx).context("failed to open MIDI input")?;
    info!("Listening on {} (Ctrl-C to stop)", input.port_name);

    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for Ctrl-C")?;
    info!("Received SIGINT, shutting down...");

    // Closing drops the callback and with it the last sender.
    input.close();
    info!(
        received = input.messages_received.load(Ordering::Relaxed),
        "Closed {}",
        input.port_name
    );

    let session = pump.await.context("event pump panicked")?;
    log_totals(&session);
    Ok(())
}

#[cfg(feature = "device")]
pub fn ports() -> Result<()> {
    let ports = midi_live::device::list_input_ports().context("failed to list MIDI ports")?;
    if ports.is_empty() {
        info!("No MIDI input ports found");
    }
    for port in ports {
        output::emit(&format!("{}: {}", port.index, port.name));
    }
    Ok(())
}

fn log_totals(session: &Session) {
    let totals = session.counts.pitch_class_totals();
    let busiest = totals
        .iter()
        .enumerate()
        .filter(|(_, n)| **n > 0.0)
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(pc, _)| harmony::pitch_class_name(pc as u8));

    info!(
        events = session.events_applied(),
        notes = session.counts.total(),
        busiest_pitch_class = busiest.unwrap_or("-"),
        "session finished"
    );
}
