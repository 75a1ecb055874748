//! Full-chain integration tests: wideband IQ in, deduplicated events out.
//!
//! A boundary tone is synthesized so that two adjacent channels both carry
//! it, stub decoders fire on carrier power, and the dedup boundary is
//! checked end to end.

use banda_pipeline::{
    DecodeEvent, Decoder, PipelineConfig, Value, WidebandDriver,
};
use std::f64::consts::PI;

const FS: f64 = 2_500_000.0;

fn config() -> PipelineConfig {
    PipelineConfig {
        num_channels: 8,
        center_hz: 868.3e6,
        input_rate_hz: FS as u32,
        target_rate_hz: Some(250_000),
        squelch_snr_db: None,
        max_block_samples: 16_384,
    }
}

/// Interleaved complex exponential at `offset_hz` from the stream center.
fn complex_tone(offset_hz: f64, num_samples: usize, start: usize) -> Vec<f32> {
    let mut iq = Vec::with_capacity(2 * num_samples);
    for t in 0..num_samples {
        let phase = 2.0 * PI * offset_hz * (start + t) as f64 / FS;
        iq.push(phase.cos() as f32);
        iq.push(phase.sin() as f32);
    }
    iq
}

/// Stub decoder: emits one fixed event per block whose mean power crosses a
/// carrier threshold.
struct PowerDecoder {
    threshold: f64,
}

impl Decoder for PowerDecoder {
    fn process(&mut self, iq: &[f32]) -> Vec<DecodeEvent> {
        if iq.is_empty() {
            return Vec::new();
        }
        let power: f64 = iq
            .chunks_exact(2)
            .map(|p| f64::from(p[0]) * f64::from(p[0]) + f64::from(p[1]) * f64::from(p[1]))
            .sum::<f64>()
            / (iq.len() / 2) as f64;
        if power > self.threshold {
            vec![
                DecodeEvent::new()
                    .with("model", Value::Str("X".into()))
                    .with("id", Value::Int(42)),
            ]
        } else {
            Vec::new()
        }
    }
}

fn power_decoders(count: usize, threshold: f64) -> Vec<Box<dyn Decoder>> {
    (0..count)
        .map(|_| Box::new(PowerDecoder { threshold }) as Box<dyn Decoder>)
        .collect()
}

#[test]
fn boundary_tone_is_decoded_once() {
    // Tone on the boundary between channels 1 and 2 (1.5 channel spacings
    // up): both neighbors see it above -6 dB, both decoders fire, exactly
    // one event survives the dedup.
    let mut driver = WidebandDriver::new(&config(), power_decoders(8, 0.2)).unwrap();
    let spacing = FS / 8.0;
    let block = complex_tone(1.5 * spacing, 16_384, 0);

    let events = driver.process_block(&block, 0).unwrap();
    assert_eq!(events.len(), 1, "events: {:?}", events);
    assert!(
        events[0].channel == 1 || events[0].channel == 2,
        "unexpected channel {}",
        events[0].channel
    );
}

#[test]
fn repeated_blocks_keep_yielding_one_event_within_window() {
    // Each block re-triggers both neighbors; the same-channel repeat is
    // allowed through while the cross-channel copy stays suppressed.
    let mut driver = WidebandDriver::new(&config(), power_decoders(8, 0.2)).unwrap();
    let spacing = FS / 8.0;

    let mut total = 0;
    for block_index in 0..4usize {
        let block = complex_tone(1.5 * spacing, 16_384, block_index * 16_384);
        // 16384 samples at 2.5 MS/s is ~6.5 ms per block: well inside the
        // 500 ms dedup window.
        let now_us = (block_index as i64) * 6_554;
        total += driver.process_block(&block, now_us).unwrap().len();
    }
    assert_eq!(total, 4);
}

#[test]
fn on_center_tone_is_decoded_by_one_channel_only() {
    // A tone on channel 1's center stays out of every other channel, so the
    // dedup has nothing to suppress.
    let mut driver = WidebandDriver::new(&config(), power_decoders(8, 0.2)).unwrap();
    let spacing = FS / 8.0;
    let block = complex_tone(spacing, 16_384, 0);

    let events = driver.process_block(&block, 0).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].channel, 1);
    let expected_freq = driver.channelizer().channel_center_hz(1);
    assert_eq!(events[0].freq_hz, expected_freq);
}

#[test]
fn quiet_input_yields_no_events() {
    let mut driver = WidebandDriver::new(&config(), power_decoders(8, 0.2)).unwrap();
    let block = vec![0.0f32; 2 * 16_384];
    assert!(driver.process_block(&block, 0).unwrap().is_empty());
}

#[test]
fn rssi_reflects_channel_occupancy() {
    // The channel under the tone reports a much stronger RSSI than a far
    // channel, and a positive SNR once the noise floor settles.
    let mut driver = WidebandDriver::new(&config(), power_decoders(8, 1e9)).unwrap();
    let spacing = FS / 8.0;

    for block_index in 0..8usize {
        let block = complex_tone(spacing, 16_384, block_index * 16_384);
        driver
            .process_block(&block, (block_index as i64) * 6_554)
            .unwrap();
    }
    assert!(
        driver.channel_rssi_db(1) > driver.channel_rssi_db(5) + 20.0,
        "occupied {} dB vs idle {} dB",
        driver.channel_rssi_db(1),
        driver.channel_rssi_db(5)
    );
}

#[test]
fn resampler_stage_feeds_decoders_at_target_rate() {
    // 16384 wideband samples -> 4096 channel samples at 625 kS/s -> 1638
    // samples at 250 kS/s. A length-recording decoder observes the rate
    // conversion.
    use std::cell::Cell;
    use std::rc::Rc;

    struct LengthProbe(Rc<Cell<usize>>);
    impl Decoder for LengthProbe {
        fn process(&mut self, iq: &[f32]) -> Vec<DecodeEvent> {
            self.0.set(self.0.get() + iq.len() / 2);
            Vec::new()
        }
    }

    let seen = Rc::new(Cell::new(0));
    let mut decoders: Vec<Box<dyn Decoder>> = power_decoders(7, 1e9);
    decoders.insert(0, Box::new(LengthProbe(Rc::clone(&seen))));

    let mut driver = WidebandDriver::new(&config(), decoders).unwrap();
    driver.process_block(&vec![0.1; 2 * 16_384], 0).unwrap();

    // 4096 * 2/5 = 1638.4: either side of the phase boundary is fine.
    let got = seen.get();
    assert!(
        got == 1638 || got == 1639,
        "channel 0 decoder saw {} samples",
        got
    );
}
