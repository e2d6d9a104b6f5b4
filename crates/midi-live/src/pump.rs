//! Ordered delivery of MIDI events into a [`Session`].
//!
//! Every source (hardware callback, file replay, stdin) pushes onto one
//! unbounded channel. The pump drains it in arrival order, applying each
//! event fully before taking the next, and hands every resulting
//! [`Analysis`] to a publisher.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::midi::TimestampedMidiMessage;
use crate::session::{Analysis, Session};

/// Receiver of analysis results.
///
/// Implement this to render or forward results; called on the pump's task,
/// once per applied event, in event order.
pub trait AnalysisPublisher: Send + Sync {
    fn publish(&self, analysis: &Analysis);
}

/// Publisher that logs each result.
pub struct LoggingPublisher;

impl AnalysisPublisher for LoggingPublisher {
    fn publish(&self, analysis: &Analysis) {
        info!(
            timestamp_us = analysis.timestamp_us,
            chord = ?analysis.chord,
            key = ?analysis.key.as_ref().map(|k| &k.key),
            "{}",
            analysis.summary()
        );
    }
}

pub type EventSender = mpsc::UnboundedSender<TimestampedMidiMessage>;

pub struct EventPump {
    receiver: mpsc::UnboundedReceiver<TimestampedMidiMessage>,
    session: Session,
    publisher: Arc<dyn AnalysisPublisher>,
}

impl EventPump {
    /// Create a pump around `session`, returning the sender side of its queue.
    pub fn new(session: Session, publisher: Arc<dyn AnalysisPublisher>) -> (EventSender, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            sender,
            Self {
                receiver,
                session,
                publisher,
            },
        )
    }

    /// Drain events until every sender has been dropped, then return the
    /// session for inspection.
    pub async fn run(mut self) -> Session {
        debug!("event pump started");

        while let Some(event) = self.receiver.recv().await {
            if let Some(analysis) = self.session.apply(&event) {
                self.publisher.publish(&analysis);
            }
        }

        info!(
            events = self.session.events_applied(),
            "event pump finished"
        );
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{parse_midi_bytes, MidiMessage};
    use crate::session::Weighting;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Analysis>>);

    impl AnalysisPublisher for Collect {
        fn publish(&self, analysis: &Analysis) {
            self.0.lock().unwrap().push(analysis.clone());
        }
    }

    fn event(ts: u64, bytes: &[u8]) -> TimestampedMidiMessage {
        TimestampedMidiMessage {
            timestamp_us: ts,
            message: parse_midi_bytes(bytes).unwrap(),
        }
    }

    #[tokio::test]
    async fn events_are_applied_in_order() {
        let collect = Arc::new(Collect::default());
        let (tx, pump) = EventPump::new(Session::new(Weighting::Count), collect.clone());

        tx.send(event(0, &[0x90, 57, 90])).unwrap(); // A
        tx.send(event(1, &[0x90, 60, 90])).unwrap(); // C
        tx.send(event(2, &[0x90, 64, 90])).unwrap(); // E
        tx.send(event(3, &[0xB0, 64, 127])).unwrap(); // sustain, ignored
        tx.send(event(4, &[0x80, 57, 0])).unwrap();
        drop(tx);

        let session = pump.run().await;
        assert_eq!(session.events_applied(), 4);

        let published = collect.0.lock().unwrap();
        assert_eq!(published.len(), 4);
        assert_eq!(published[2].chord.as_deref(), Some("A Minor"));
        assert_eq!(published[3].chord, None);
        assert_eq!(published[3].active_notes, vec![60, 64]);
    }

    #[tokio::test]
    async fn logging_publisher_drives_pump() {
        let (tx, pump) = EventPump::new(Session::default(), Arc::new(LoggingPublisher));
        for (ts, bytes) in [(0, [0x90u8, 60, 80]), (1, [0x90, 64, 80]), (2, [0x90, 67, 80])] {
            tx.send(event(ts, &bytes)).unwrap();
        }
        drop(tx);

        let session = pump.run().await;
        assert_eq!(session.events_applied(), 3);
        assert_eq!(session.analysis(2).chord.as_deref(), Some("C Major"));
    }

    #[tokio::test]
    async fn pump_runs_on_spawned_task() {
        let collect = Arc::new(Collect::default());
        let (tx, pump) = EventPump::new(Session::default(), collect.clone());
        let handle = tokio::spawn(pump.run());

        let producer = tokio::spawn(async move {
            for pitch in [62u8, 66, 69] {
                tx.send(TimestampedMidiMessage {
                    timestamp_us: pitch as u64,
                    message: MidiMessage::NoteOn {
                        channel: 0,
                        pitch,
                        velocity: 64,
                    },
                })
                .unwrap();
            }
        });

        producer.await.unwrap();
        let session = handle.await.unwrap();
        assert_eq!(session.active.len(), 3);
        let published = collect.0.lock().unwrap();
        assert_eq!(published.last().unwrap().chord.as_deref(), Some("D Major"));
    }
}
