//! # Audio Device Module
//!
//! This module connects the shared [`AudioQueue`] to real hardware using CPAL
//! (Cross-Platform Audio Library). The input callback downmixes each block to
//! mono samples and pushes it; the optional output callback pops the same
//! queue back out as an echo of what is being analyzed.
//!
//! ## Features
//! - Default input and output device selection
//! - Mono preferred, any channel count accepted and averaged down
//! - Sample rate clamped into the range the device supports
//! - Capacity errors handled in the callbacks, never propagated to CPAL

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;

use crate::queue::AudioQueue;
use crate::{Sample, MAX_SAMPLE_VALUE};

/// What the input callback does when the queue has no room for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop the incoming block. Used while a playback stream drains the queue.
    DropBlock,
    /// Skip unread samples to make room. Used when nothing pops the queue.
    DiscardOldest,
}

/// Starts audio capture from the default input device into `queue`.
///
/// # Arguments
/// * `queue` - Shared queue the callback pushes into
/// * `policy` - Overflow handling for the callback
/// * `target_rate` - Desired sample rate in Hz
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and the rate in use
/// * `Err(e)` - Error if no device or no f32 input format is available
pub fn start_audio_capture(
    queue: Arc<AudioQueue>,
    policy: OverflowPolicy,
    target_rate: u32,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!("Using audio input device: {}", device.name()?);

    let configs = device
        .supported_input_configs()
        .context("querying supported input configs")?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate = clamp_rate(&supported_config, target_rate);
    let config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(sample_rate))
        .into();
    let channels = config.channels.max(1) as usize;

    log::info!("Selected input: {} Hz, {} channel(s)", sample_rate, channels);

    let err_fn = |err| log::error!("An error occurred on the input stream: {}", err);

    let mut block: Vec<Sample> = Vec::with_capacity(4096);
    let mut dropped_blocks: u64 = 0;

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            downmix_into(data, channels, &mut block);
            if let Err(err) = push_block(&queue, &block, policy) {
                dropped_blocks += 1;
                if dropped_blocks == 1 || dropped_blocks % 100 == 0 {
                    log::warn!("Dropped {} input block(s): {}", dropped_blocks, err);
                }
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Starts playback of `queue` on the default output device.
///
/// Each callback pops as many mono samples as it has frames, applies
/// `volume`, and copies every sample to all output channels. When the queue
/// cannot supply a full buffer the callback writes silence instead.
pub fn start_audio_playback(queue: Arc<AudioQueue>, volume: f32, sample_rate: u32) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("No output device available"))?;

    log::info!("Using audio output device: {}", device.name()?);

    let configs = device
        .supported_output_configs()
        .context("querying supported output configs")?
        .collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, sample_rate)
        .ok_or_else(|| anyhow!("No suitable f32 output format found"))?;

    let rate = clamp_rate(&supported_config, sample_rate);
    if rate != sample_rate {
        log::warn!("Output runs at {} Hz while capture runs at {} Hz", rate, sample_rate);
    }
    let config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(rate))
        .into();
    let channels = config.channels.max(1) as usize;

    log::info!("Selected output: {} Hz, {} channel(s), volume {:.2}", rate, channels, volume);

    let err_fn = |err| log::error!("An error occurred on the output stream: {}", err);

    let mut mono: Vec<Sample> = Vec::with_capacity(4096);
    let mut underflows: u64 = 0;

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            mono.resize(data.len() / channels, 0);
            match queue.pop(&mut mono, volume) {
                Ok(()) => upmix_into(&mono, channels, data),
                Err(err) => {
                    underflows += 1;
                    if underflows == 1 || underflows % 100 == 0 {
                        log::debug!("Output underflow #{}: {}", underflows, err);
                    }
                    data.fill(0.0);
                }
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok(stream)
}

/// Names of the available input and output devices on the default host.
pub fn list_devices() -> Result<(Vec<String>, Vec<String>)> {
    let host = cpal::default_host();
    let inputs = host
        .input_devices()
        .context("enumerating input devices")?
        .filter_map(|device| device.name().ok())
        .collect();
    let outputs = host
        .output_devices()
        .context("enumerating output devices")?
        .filter_map(|device| device.name().ok())
        .collect();
    Ok((inputs, outputs))
}

fn push_block(queue: &AudioQueue, block: &[Sample], policy: OverflowPolicy) -> crate::Result<()> {
    match queue.push(block, 1.0) {
        Err(err) if err.is_capacity() && policy == OverflowPolicy::DiscardOldest => {
            queue.discard(block.len());
            queue.push(block, 1.0)
        }
        other => other,
    }
}

#[inline]
fn to_sample(value: f32) -> Sample {
    (value.clamp(-1.0, 1.0) * MAX_SAMPLE_VALUE as f32) as Sample
}

/// Averages interleaved frames of `channels` samples into `out`.
fn downmix_into(data: &[f32], channels: usize, out: &mut Vec<Sample>) {
    out.clear();
    out.extend(
        data.chunks_exact(channels)
            .map(|frame| to_sample(frame.iter().sum::<f32>() / channels as f32)),
    );
}

/// Copies each mono sample to every channel of an interleaved frame.
fn upmix_into(mono: &[Sample], channels: usize, data: &mut [f32]) {
    for (frame, &sample) in data.chunks_exact_mut(channels).zip(mono) {
        frame.fill(sample as f32 / MAX_SAMPLE_VALUE as f32);
    }
}

/// Finds the best supported f32 configuration for the target sample rate.
///
/// Mono ranges beat multi-channel ones; within each group the range closest
/// to `target_rate` wins (zero distance when the range contains it).
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| (c.channels() != 1, rate_distance(c, target_rate)))
}

fn rate_distance(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    let (min, max) = (config.min_sample_rate().0, config.max_sample_rate().0);
    if target_rate < min {
        min - target_rate
    } else {
        target_rate.saturating_sub(max)
    }
}

fn clamp_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::{SampleFormat, SampleRate, SupportedBufferSize};

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn prefers_mono_f32_containing_the_rate() {
        let configs = vec![
            range(2, 8000, 96000, SampleFormat::F32),
            range(1, 8000, 96000, SampleFormat::I16),
            range(1, 48000, 48000, SampleFormat::F32),
            range(1, 8000, 96000, SampleFormat::F32),
        ];
        let best = find_supported_config(configs, 44100).unwrap();
        assert_eq!(best.channels(), 1);
        assert_eq!(best.sample_format(), SampleFormat::F32);
        assert_eq!(best.min_sample_rate().0, 8000);
    }

    #[test]
    fn falls_back_to_stereo_and_clamps_rate() {
        let configs = vec![range(2, 48000, 48000, SampleFormat::F32)];
        let best = find_supported_config(configs, 44100).unwrap();
        assert_eq!(best.channels(), 2);
        assert_eq!(clamp_rate(&best, 44100), 48000);
    }

    #[test]
    fn no_f32_format_is_none() {
        let configs = vec![range(1, 8000, 96000, SampleFormat::I16)];
        assert!(find_supported_config(configs, 44100).is_none());
    }

    #[test]
    fn downmix_averages_channels() {
        let mut out = Vec::new();
        downmix_into(&[1.0, 0.0, -1.0, -1.0, 2.0, 2.0], 2, &mut out);
        assert_eq!(out, vec![MAX_SAMPLE_VALUE / 2, -MAX_SAMPLE_VALUE, MAX_SAMPLE_VALUE]);
    }

    #[test]
    fn upmix_duplicates_samples() {
        let mut data = [0.5; 4];
        upmix_into(&[MAX_SAMPLE_VALUE, 0], 2, &mut data);
        assert_eq!(data, [1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn discard_oldest_policy_makes_room() {
        let queue = AudioQueue::new(8).unwrap();
        push_block(&queue, &[1; 6], OverflowPolicy::DiscardOldest).unwrap();
        push_block(&queue, &[2; 4], OverflowPolicy::DiscardOldest).unwrap();
        let mut out = [0; 4];
        queue.peek_fresh(&mut out, 1.0).unwrap();
        assert_eq!(out, [2; 4]);
        assert!(queue.pending() <= 7);
    }

    #[test]
    fn drop_block_policy_reports_overflow() {
        let queue = AudioQueue::new(8).unwrap();
        push_block(&queue, &[1; 6], OverflowPolicy::DropBlock).unwrap();
        let err = push_block(&queue, &[2; 4], OverflowPolicy::DropBlock).unwrap_err();
        assert!(err.is_capacity());
        assert_eq!(queue.pending(), 6);
    }
}
