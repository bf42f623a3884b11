//! Standalone playback: a cpal output stream as the block clock.
//!
//! The device callback runs the processor once per buffer and writes
//! silence. Block events are tagged with their absolute frame and handed to
//! a dispatch thread over a ring buffer; that thread waits until each event
//! is due and forwards it to the MIDI sink.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use boom_engine::{FreeRunningTransport, Processor, MIDI_BUFFER_CAPACITY};
use boom_ir::MidiMessage;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use tracing::{debug, error, info, warn};

use crate::traits::{AudioError, MidiSink};

/// Blocks of events that can wait for dispatch.
const DISPATCH_QUEUE_BLOCKS: usize = 4;

/// Dispatcher poll interval when the queue is empty.
const IDLE_POLL: Duration = Duration::from_millis(1);

/// A MIDI message at an absolute frame of the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TimedMessage {
    frame: u64,
    message: MidiMessage,
}

/// A running standalone playback session. Stops when dropped.
pub struct LivePlayback {
    stream: Option<Stream>,
    dispatcher: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    sample_rate: u32,
}

impl LivePlayback {
    /// Open the default output device and start driving `processor`.
    pub fn start(
        mut processor: Processor,
        mut transport: FreeRunningTransport,
        sink: Box<dyn MidiSink>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config: StreamConfig = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?
            .into();

        let sample_rate = config.sample_rate.0;
        let channels = (config.channels as usize).max(1);
        processor.prepare(sample_rate as f64);
        transport.play();

        let rb = HeapRb::<TimedMessage>::new(MIDI_BUFFER_CAPACITY * DISPATCH_QUEUE_BLOCKS);
        let (mut producer, consumer) = rb.split();

        let running = Arc::new(AtomicBool::new(true));
        let dropped = Arc::new(AtomicU64::new(0));

        let callback_dropped = dropped.clone();
        let mut frames_rendered: u64 = 0;
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data.fill(0.0);
                    let frames = (data.len() / channels) as u32;

                    let snapshot = transport.snapshot();
                    let events = processor.process_block(Some(&snapshot), frames);
                    for event in events.iter() {
                        let timed = TimedMessage {
                            frame: frames_rendered + event.sample_offset as u64,
                            message: event.message,
                        };
                        if producer.try_push(timed).is_err() {
                            callback_dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    }

                    transport.advance(frames, sample_rate as f64);
                    frames_rendered += frames as u64;
                },
                |err| error!(err = %err, "Audio stream error."),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        let dispatcher = {
            let running = running.clone();
            thread::Builder::new()
                .name("boom-midi-dispatch".into())
                .spawn(move || dispatch(consumer, sink, sample_rate, running))
                .map_err(|e| AudioError::Playback(e.to_string()))?
        };

        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        info!(sample_rate, channels, "Started playback.");

        Ok(Self {
            stream: Some(stream),
            dispatcher: Some(dispatcher),
            running,
            dropped,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Events lost because the dispatch queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the stream, release sounding notes and join the dispatcher.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!(err = %e, "Failed to pause stream.");
            }
        }
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.dispatcher.take() {
            if handle.join().is_err() {
                error!("MIDI dispatch thread panicked.");
            }
            info!(dropped = self.dropped_events(), "Stopped playback.");
        }
    }
}

impl Drop for LivePlayback {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Forward queued events to `sink` at their due time until stopped.
fn dispatch(
    mut queue: HeapCons<TimedMessage>,
    mut sink: Box<dyn MidiSink>,
    sample_rate: u32,
    running: Arc<AtomicBool>,
) {
    let started = Instant::now();
    let mut sounding = SoundingNotes::default();
    debug!(sink = sink.name(), "MIDI dispatch running.");

    while running.load(Ordering::Relaxed) {
        let Some(timed) = queue.try_pop() else {
            thread::sleep(IDLE_POLL);
            continue;
        };

        let due = started + Duration::from_secs_f64(timed.frame as f64 / sample_rate as f64);
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }

        sounding.track(&timed.message);
        if let Err(e) = sink.send(&timed.message) {
            warn!(err = %e, sink = sink.name(), "Failed to send MIDI.");
        }
    }

    for message in sounding.release_all() {
        if let Err(e) = sink.send(&message) {
            warn!(err = %e, sink = sink.name(), "Failed to release note.");
        }
    }
}

/// Which (channel, pitch) pairs currently have an unmatched note-on.
struct SoundingNotes {
    held: [u128; 16],
}

impl Default for SoundingNotes {
    fn default() -> Self {
        Self { held: [0; 16] }
    }
}

impl SoundingNotes {
    fn track(&mut self, message: &MidiMessage) {
        let lane = &mut self.held[(message.channel() & 0x0F) as usize];
        let bit = 1u128 << (message.pitch() & 0x7F);
        if message.is_note_on() {
            *lane |= bit;
        } else {
            *lane &= !bit;
        }
    }

    /// Note-offs for everything still held, clearing the set.
    fn release_all(&mut self) -> Vec<MidiMessage> {
        let mut offs = Vec::new();
        for (channel, lane) in self.held.iter_mut().enumerate() {
            for pitch in 0..128u8 {
                if *lane & (1u128 << pitch) != 0 {
                    offs.push(MidiMessage::note_off(channel as u8, pitch));
                }
            }
            *lane = 0;
        }
        offs
    }
}
