//! Audio duration probing.
//!
//! Reads container timing metadata and returns the playback length in whole
//! seconds, rounded up. WAV is read with `hound` (sample count over sample
//! rate, after checking the source really holds every declared frame), MP3 with `symphonia` (declared frame count when the stream carries
//! one, otherwise the sum of every packet's duration).
//!
//! The byte source is moved into the probe, so it is dropped, and any file
//! handle closed, on every exit path.

use crate::audio::ContainerFormat;
use crate::{CallSimError, Result};
use std::io::{ErrorKind, Seek};
use std::path::{Path, PathBuf};
use symphonia::core::codecs::{CodecParameters, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Probe an in-memory or streamed container.
pub fn probe_duration<S>(source: S, format: ContainerFormat) -> Result<u64>
where
    S: MediaSource + 'static,
{
    let secs = match format {
        ContainerFormat::Wav => probe_wav(source)?,
        ContainerFormat::Mp3 => probe_compressed(source, format)?,
    };
    debug!(target: "probe", %format, secs, "Measured audio duration");
    Ok(secs)
}

/// Open a stored artifact and probe it.
pub fn probe_file(path: &Path, format: ContainerFormat) -> Result<u64> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CallSimError::ArtifactNotFound(path.display().to_string()),
        _ => CallSimError::Io(e),
    })?;
    probe_duration(file, format)
}

/// Probe a stored artifact on the blocking pool.
pub async fn probe_path(path: PathBuf, format: ContainerFormat) -> Result<u64> {
    tokio::task::spawn_blocking(move || probe_file(&path, format))
        .await
        .map_err(|e| CallSimError::Io(std::io::Error::new(ErrorKind::Other, e)))?
}

fn probe_wav<S: MediaSource>(mut source: S) -> Result<u64> {
    let total = source.byte_len();
    let (frames, rate, block_align) = {
        let reader = hound::WavReader::new(&mut source).map_err(|e| unreadable("wav", e))?;
        let spec = reader.spec();
        let block_align = spec.channels as u64 * spec.bits_per_sample.div_ceil(8) as u64;
        (reader.duration() as u64, spec.sample_rate as u64, block_align)
    };
    if rate == 0 {
        return Err(CallSimError::UnreadableMedia(
            "wav header declares a zero sample rate".into(),
        ));
    }

    // The reader stops at the start of the sample data.
    if let Some(total) = total {
        let data_start = source.stream_position().map_err(|e| unreadable("wav", e))?;
        let available = total.saturating_sub(data_start);
        let declared = frames.saturating_mul(block_align);
        if available < declared {
            return Err(CallSimError::UnreadableMedia(format!(
                "wav data truncated: {available} of {declared} bytes present"
            )));
        }
    }
    Ok(frames.div_ceil(rate))
}

fn probe_compressed<S: MediaSource + 'static>(source: S, format: ContainerFormat) -> Result<u64> {
    let mss = MediaSourceStream::new(Box::new(source), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(format.extension())
        .mime_type(format.mime_type());

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| unreadable(format.extension(), e))?;
    let mut reader = probed.format;

    let (track_id, params) = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| CallSimError::UnreadableMedia("no audio track".into()))?;

    if let Some(frames) = params.n_frames {
        if let Some(secs) = ticks_to_secs(&params, frames) {
            return Ok(secs);
        }
    }

    // No declared length: walk the packets and add up their durations.
    let mut ticks: u64 = 0;
    let mut packets = 0usize;
    loop {
        match reader.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    ticks += packet.dur;
                    packets += 1;
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(unreadable(format.extension(), e)),
        }
    }
    if packets == 0 {
        return Err(CallSimError::UnreadableMedia("no audio packets".into()));
    }
    ticks_to_secs(&params, ticks)
        .ok_or_else(|| CallSimError::UnreadableMedia("no timing information".into()))
}

/// Ceiling of `ticks` expressed in seconds, using the track's time base or
/// falling back to its sample rate.
fn ticks_to_secs(params: &CodecParameters, ticks: u64) -> Option<u64> {
    if let Some(tb) = params.time_base {
        if tb.denom > 0 {
            let num = ticks as u128 * tb.numer as u128;
            return Some(num.div_ceil(tb.denom as u128) as u64);
        }
    }
    match params.sample_rate {
        Some(rate) if rate > 0 => Some(ticks.div_ceil(rate as u64)),
        _ => None,
    }
}

fn unreadable(kind: &str, err: impl std::fmt::Display) -> CallSimError {
    CallSimError::UnreadableMedia(format!("{kind}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::beep;
    use std::io::Cursor;

    #[test]
    fn wav_duration_rounds_up() {
        let cases = [(2.0, 2), (2.5, 3), (0.1, 1), (6.0, 6), (3.0001, 4)];
        for (secs, expected) in cases {
            let bytes = beep::synthesize(secs, 440.0);
            let got = probe_duration(Cursor::new(bytes), ContainerFormat::Wav).unwrap();
            assert_eq!(got, expected, "duration {secs}");
        }
    }

    #[test]
    fn zero_bytes_is_unreadable() {
        for format in [ContainerFormat::Wav, ContainerFormat::Mp3] {
            let err = probe_duration(Cursor::new(Vec::<u8>::new()), format).unwrap_err();
            assert!(matches!(err, CallSimError::UnreadableMedia(_)), "{format}: {err}");
        }
    }

    #[test]
    fn truncated_header_is_unreadable() {
        let mut bytes = beep::synthesize(1.0, 440.0);
        bytes.truncate(20);
        let err = probe_duration(Cursor::new(bytes), ContainerFormat::Wav).unwrap_err();
        assert!(matches!(err, CallSimError::UnreadableMedia(_)));
    }

    #[test]
    fn truncated_sample_data_is_unreadable() {
        let mut bytes = beep::synthesize(2.0, 440.0);
        bytes.truncate(44 + 1000);
        let err = probe_duration(Cursor::new(bytes), ContainerFormat::Wav).unwrap_err();
        assert!(matches!(err, CallSimError::UnreadableMedia(_)), "{err}");
    }

    #[test]
    fn oversized_data_chunk_is_unreadable() {
        let mut bytes = beep::synthesize(1.0, 440.0);
        bytes[40..44].copy_from_slice(&0x7FFF_FFFEu32.to_le_bytes());
        let err = probe_duration(Cursor::new(bytes), ContainerFormat::Wav).unwrap_err();
        assert!(matches!(err, CallSimError::UnreadableMedia(_)), "{err}");
    }

    #[test]
    fn truncated_file_on_disk_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.wav");
        let mut bytes = beep::synthesize(3.0, 440.0);
        bytes.truncate(bytes.len() / 2);
        std::fs::write(&path, bytes).unwrap();
        let err = probe_file(&path, ContainerFormat::Wav).unwrap_err();
        assert!(err.is_missing_audio(), "{err}");
    }

    #[test]
    fn garbage_is_unreadable() {
        let bytes: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
        let err = probe_duration(Cursor::new(bytes), ContainerFormat::Wav).unwrap_err();
        assert!(matches!(err, CallSimError::UnreadableMedia(_)));
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = probe_file(Path::new("/definitely/not/here.wav"), ContainerFormat::Wav)
            .unwrap_err();
        assert!(matches!(err, CallSimError::ArtifactNotFound(_)));
    }
}
