//! Event router
//!
//! A bounded channel feeds one consumer thread that encodes events and
//! writes the resulting frames to the sink. The router thread owns the
//! sink exclusively, so frames from the MIDI callback thread and the UI
//! thread can never interleave mid-frame and the receiver stays in
//! 3-byte sync.
//!
//! There is no backpressure handling: when the channel is full the sending
//! callback blocks until the sink catches up. On an encode or transport
//! error the loop stops and the error surfaces at shutdown.

use crate::error::{Error, Result};
use crate::serial::FrameSink;
use crossbeam_channel::{bounded, Receiver, Sender};
use notewire_proto::MidiEvent;
use std::thread::{self, JoinHandle};

/// Capacity of the event channel. Small on purpose: a full channel means
/// the serial line cannot keep up and the producers should block.
const CHANNEL_CAPACITY: usize = 256;

/// Handle to the encode-and-write thread
pub struct Router {
    tx: Sender<MidiEvent>,
    handle: JoinHandle<Result<()>>,
}

impl Router {
    /// Spawn the router thread, taking ownership of the sink
    pub fn spawn(sink: Box<dyn FrameSink>) -> Self {
        let (tx, rx) = bounded(CHANNEL_CAPACITY);
        let handle = thread::spawn(move || run(rx, sink));
        Self { tx, handle }
    }

    /// A producer handle for a callback thread
    pub fn sender(&self) -> Sender<MidiEvent> {
        self.tx.clone()
    }

    /// Send an event from the calling thread. Blocks while the channel
    /// is full; a send error means the router thread has stopped.
    pub fn send(&self, event: MidiEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Whether the router thread has stopped (sink or encode failure)
    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }

    /// Close the channel and wait for the remaining frames to be written.
    /// Returns the error that stopped the loop, if any.
    pub fn shutdown(self) -> Result<()> {
        let Router { tx, handle } = self;
        drop(tx);
        match handle.join() {
            Ok(result) => result,
            Err(_) => Err(Error::Io(std::io::Error::other("router thread panicked"))),
        }
    }
}

/// The consumer loop: one event in, one frame out, in channel order
fn run(rx: Receiver<MidiEvent>, mut sink: Box<dyn FrameSink>) -> Result<()> {
    while let Ok(event) = rx.recv() {
        let frame = event.encode()?;
        sink.write_frame(&frame).map_err(|e| {
            log::error!("Frame write to {} failed: {}", sink.name(), e);
            e
        })?;
        log::debug!("{} -> {:?}", event, frame.bytes());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::FrameSink;
    use notewire_proto::WireFrame;
    use std::sync::{Arc, Mutex};

    /// Sink whose captured bytes outlive the router thread
    #[derive(Clone, Default)]
    struct SharedSink {
        bytes: Arc<Mutex<Vec<u8>>>,
    }

    impl FrameSink for SharedSink {
        fn write_frame(&mut self, frame: &WireFrame) -> Result<()> {
            self.bytes.lock().unwrap().extend_from_slice(frame.as_ref());
            Ok(())
        }

        fn name(&self) -> &str {
            "shared"
        }
    }

    #[test]
    fn test_frames_written_in_send_order() {
        let sink = SharedSink::default();
        let bytes = sink.bytes.clone();

        let router = Router::spawn(Box::new(sink));
        router.send(MidiEvent::NoteOn { channel: 0, note: 60, velocity: 100 });
        router.send(MidiEvent::PitchBend { channel: 0, value: 8192 });
        router.send(MidiEvent::NoteOff { channel: 1, note: 60 });
        router.shutdown().unwrap();

        assert_eq!(
            *bytes.lock().unwrap(),
            vec![144, 60, 100, 224, 0, 64, 129, 60, 127]
        );
    }

    #[test]
    fn test_concurrent_producers_never_interleave_frames() {
        let sink = SharedSink::default();
        let bytes = sink.bytes.clone();

        let router = Router::spawn(Box::new(sink));
        let mut producers = Vec::new();
        for channel in 0..4u8 {
            let tx = router.sender();
            producers.push(thread::spawn(move || {
                for note in 0..50u8 {
                    tx.send(MidiEvent::NoteOn { channel, note, velocity: 100 }).unwrap();
                }
            }));
        }
        for p in producers {
            p.join().unwrap();
        }
        router.shutdown().unwrap();

        let bytes = bytes.lock().unwrap();
        assert_eq!(bytes.len(), 4 * 50 * 3);
        // Every frame is intact: status byte with marker, then 7-bit payload
        for frame in bytes.chunks(3) {
            assert!(frame[0] >= 128);
            assert!(frame[1] < 128);
            assert!(frame[2] < 128);
        }
    }

    #[test]
    fn test_encode_error_stops_router() {
        let sink = SharedSink::default();
        let router = Router::spawn(Box::new(sink));

        // Contract violation: channel out of range
        router.send(MidiEvent::NoteOn { channel: 16, note: 60, velocity: 100 });
        let err = router.shutdown().unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_transport_error_stops_router() {
        struct FailingSink;
        impl FrameSink for FailingSink {
            fn write_frame(&mut self, _frame: &WireFrame) -> Result<()> {
                Err(Error::Transport(std::io::Error::other("port gone")))
            }
            fn name(&self) -> &str {
                "failing"
            }
        }

        let router = Router::spawn(Box::new(FailingSink));
        router.send(MidiEvent::NoteOff { channel: 0, note: 60 });
        let err = router.shutdown().unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
