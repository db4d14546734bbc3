//! Fallback tone synthesis.
//!
//! Produces a complete mono 16-bit PCM WAV container in memory from a duration
//! and a frequency. Used when speech synthesis is unavailable or disabled, so it
//! never touches the filesystem or the network.

use std::f64::consts::PI;

pub const SAMPLE_RATE: u32 = 44_100;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Peak level as a fraction of the signed 16-bit range
const AMPLITUDE: f64 = 0.25;
const HEADER_LEN: usize = 44;

/// Parameters of one fallback tone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeepSpec {
    pub duration_secs: f64,
    pub frequency_hz: f64,
}

impl BeepSpec {
    pub fn new(duration_secs: f64, frequency_hz: f64) -> Self {
        Self {
            duration_secs,
            frequency_hz,
        }
    }

    /// Number of samples the container will hold, never less than one.
    pub fn sample_count(&self) -> usize {
        let n = self.duration_secs * SAMPLE_RATE as f64;
        if n.is_finite() && n >= 1.0 {
            n.floor() as usize
        } else {
            1
        }
    }

    pub fn synthesize(&self) -> Vec<u8> {
        synthesize(self.duration_secs, self.frequency_hz)
    }
}

/// Render a sine tone as a RIFF/WAVE byte sequence.
///
/// Deterministic: identical inputs always give identical bytes.
pub fn synthesize(duration_secs: f64, frequency_hz: f64) -> Vec<u8> {
    let spec = BeepSpec::new(duration_secs, frequency_hz);
    let samples = spec.sample_count();
    let bytes_per_sample = (BITS_PER_SAMPLE / 8) as usize;
    let data_len = samples * bytes_per_sample * CHANNELS as usize;

    let mut buf = Vec::with_capacity(HEADER_LEN + data_len);
    write_header(&mut buf, data_len as u32);

    let peak = AMPLITUDE * i16::MAX as f64;
    for i in 0..samples {
        let t = i as f64 / SAMPLE_RATE as f64;
        let s = (2.0 * PI * frequency_hz * t).sin().clamp(-1.0, 1.0);
        // truncation toward zero keeps |sample| <= peak
        let sample = (s * peak) as i16;
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

fn write_header(buf: &mut Vec<u8>, data_len: u32) {
    let byte_rate = SAMPLE_RATE * CHANNELS as u32 * (BITS_PER_SAMPLE as u32 / 8);
    let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);
    // everything after the first 8 bytes
    let riff_len = (HEADER_LEN as u32 - 8) + data_len;

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&riff_len.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt subchunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // Subchunk1Size (16 for PCM)
    buf.extend_from_slice(&1u16.to_le_bytes()); // AudioFormat (1 = PCM)
    buf.extend_from_slice(&CHANNELS.to_le_bytes());
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data subchunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(bytes: Vec<u8>) -> (hound::WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).expect("valid wav");
        let spec = reader.spec();
        let samples = reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .expect("samples decode");
        (spec, samples)
    }

    #[test]
    fn decodes_with_declared_format_and_length() {
        for (secs, hz) in [(2.0, 440.0), (3.5, 880.0), (6.0, 1000.0)] {
            let (spec, samples) = decode(synthesize(secs, hz));
            assert_eq!(spec.sample_rate, 44_100);
            assert_eq!(spec.channels, 1);
            assert_eq!(spec.bits_per_sample, 16);
            assert_eq!(spec.sample_format, hound::SampleFormat::Int);
            let expected = secs * 44_100.0;
            assert!((samples.len() as f64 - expected).abs() <= 1.0);
        }
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(synthesize(2.5, 523.25), synthesize(2.5, 523.25));
        assert_ne!(synthesize(2.5, 523.25), synthesize(2.5, 440.0));
    }

    #[test]
    fn samples_stay_within_quarter_scale() {
        let bound = (0.25 * i16::MAX as f64) as i16;
        for hz in [50.0, 440.0, 11_025.0, 22_050.0, 30_000.0] {
            let (_, samples) = decode(synthesize(0.5, hz));
            assert!(samples.iter().all(|s| s.unsigned_abs() <= bound as u16));
        }
    }

    #[test]
    fn tone_actually_reaches_its_peak() {
        let (_, samples) = decode(synthesize(1.0, 440.0));
        let max = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        assert!(max > 8000, "peak was {max}");
    }

    #[test]
    fn short_durations_never_produce_an_empty_container() {
        let (_, samples) = decode(synthesize(0.1, 440.0));
        assert_eq!(samples.len(), 4410);

        for secs in [0.0, 0.00001, -3.0, f64::NAN] {
            let bytes = synthesize(secs, 440.0);
            assert_eq!(bytes.len(), 44 + 2);
            let (_, samples) = decode(bytes);
            assert_eq!(samples.len(), 1);
        }
    }

    #[test]
    fn header_fields_are_consistent() {
        let bytes = synthesize(2.0, 440.0);
        let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(4) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(16), 16);
        assert_eq!(u16_at(20), 1);
        assert_eq!(u16_at(22), 1);
        assert_eq!(u32_at(24), 44_100);
        assert_eq!(u32_at(28), 88_200);
        assert_eq!(u16_at(32), 2);
        assert_eq!(u16_at(34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(40) as usize, bytes.len() - 44);
        assert_eq!(u32_at(40), 88_200 * 2);
    }
}
