//! The analysis worker: owns the audio streams and the shared queue, and
//! analyzes the freshest window on every tick.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chordscope_core::analysis::{AnalysisSettings, Analyzer};
use chordscope_core::audio::{self, OverflowPolicy};
use chordscope_core::queue::AudioQueue;
use chordscope_core::spectrum::SpectrumLayout;
use chordscope_core::AnalysisResult;
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::config::Settings;

/// Capture runs this long before echo playback starts draining the queue.
const PREFILL_DELAY: Duration = Duration::from_secs(2);

/// Messages from the worker to the render loop.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Capture is running at the rate described by `layout`.
    Started { layout: SpectrumLayout },
    Frame(AnalysisResult),
    Failed(String),
}

/// The part of [`Settings`] the worker thread needs.
#[derive(Debug, Clone)]
struct WorkerConfig {
    sample_rate: u32,
    fft_len: usize,
    queue_len: usize,
    echo_volume: Option<f32>,
    refresh: Duration,
    analysis: AnalysisSettings,
}

/// Handle to the running worker thread.
#[derive(Debug)]
pub struct AnalysisWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    pub fn spawn(settings: &Settings, events_tx: Sender<WorkerEvent>) -> Result<Self> {
        let config = WorkerConfig {
            sample_rate: settings.sample_rate,
            fft_len: settings.fft_len,
            queue_len: settings.queue_len,
            echo_volume: settings.echo_volume(),
            refresh: Duration::from_millis(settings.refresh_ms),
            analysis: settings.analysis.clone(),
        };
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

        let thread_handle = thread::Builder::new()
            .name("analysis".into())
            .spawn(move || {
                log::info!("Analysis thread starting");
                if let Err(e) = run(config, &events_tx, &shutdown_rx) {
                    log::error!("Analysis thread failed: {:#}", e);
                    let _ = events_tx.send(WorkerEvent::Failed(format!("{e:#}")));
                }
                log::info!("Analysis thread finished");
            })
            .context("spawning analysis thread")?;

        Ok(Self {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        })
    }

    /// Signals the thread to stop its streams and waits for it.
    pub fn shutdown(mut self) {
        log::info!("Shutting down analysis worker");
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Analysis thread panicked");
            }
        }
    }
}

fn run(config: WorkerConfig, events_tx: &Sender<WorkerEvent>, shutdown_rx: &Receiver<()>) -> Result<()> {
    let queue = Arc::new(AudioQueue::new(config.queue_len)?);

    let policy = if config.echo_volume.is_some() {
        OverflowPolicy::DropBlock
    } else {
        OverflowPolicy::DiscardOldest
    };
    let (capture, sample_rate) = audio::start_audio_capture(Arc::clone(&queue), policy, config.sample_rate)
        .context("starting audio capture")?;
    log::info!("Audio capture started at {} Hz", sample_rate);

    let layout = SpectrumLayout::new(sample_rate, config.fft_len);
    let mut analyzer = Analyzer::new(layout, config.analysis)?;
    if events_tx.send(WorkerEvent::Started { layout }).is_err() {
        return Ok(());
    }

    let mut echo_volume = config.echo_volume;
    let mut playback: Option<cpal::Stream> = None;
    let playback_due = Instant::now() + PREFILL_DELAY;
    let ticker = crossbeam_channel::tick(config.refresh);
    let mut frames: u64 = 0;

    loop {
        crossbeam_channel::select! {
            recv(ticker) -> _ => {
                if let Some(volume) = echo_volume {
                    if playback.is_none() && Instant::now() >= playback_due {
                        match audio::start_audio_playback(Arc::clone(&queue), volume, sample_rate) {
                            Ok(stream) => {
                                log::info!("Echo playback started");
                                playback = Some(stream);
                            }
                            Err(e) => {
                                log::error!("Echo playback unavailable: {:#}", e);
                                echo_volume = None;
                            }
                        }
                    }
                }

                match analyzer.analyze_queue(&queue) {
                    Ok(result) => {
                        frames += 1;
                        if frames == 1 {
                            log::info!("First analysis frame ready");
                        }
                        match events_tx.try_send(WorkerEvent::Frame(result)) {
                            Ok(()) | Err(TrySendError::Full(_)) => {}
                            Err(TrySendError::Disconnected(_)) => {
                                log::warn!("Render loop went away");
                                break;
                            }
                        }
                    }
                    Err(e) if e.is_capacity() => {
                        log::debug!("Waiting for a full analysis window: {}", e);
                    }
                    Err(e) => return Err(e).context("analyzing audio frame"),
                }
            },
            recv(shutdown_rx) -> _ => {
                log::info!("Received shutdown signal after {} frames", frames);
                break;
            },
        }
    }

    log::info!("Stopping streams");
    if let Some(stream) = playback.take() {
        if let Err(e) = stream.pause() {
            log::warn!("Error pausing output stream: {}", e);
        }
    }
    if let Err(e) = capture.pause() {
        log::warn!("Error pausing input stream: {}", e);
    }
    Ok(())
}
