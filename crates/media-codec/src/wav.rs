//! 8 kHz / 16-bit PCM WAV writers, single- and multi-channel.
//!
//! Uses `hound` for WAV I/O. The multi-channel writer feeds per-channel
//! buffers and interleaves only as far as the shortest buffer reaches,
//! tolerating channels that arrive at slightly different rates.

use std::io::{Seek, Write};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::Result;

const SAMPLE_RATE: u32 = 8000;
const BITS_PER_SAMPLE: u16 = 16;

fn spec(channels: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// A single-channel 8 kHz/16-bit WAV encoder, used by the active RTP
/// recorder pool (one microphone direction per monitored device).
pub struct MonoWavWriter<W: Write + Seek> {
    writer: WavWriter<W>,
}

impl<W: Write + Seek> MonoWavWriter<W> {
    pub fn create(sink: W) -> Result<Self> {
        Ok(Self {
            writer: WavWriter::new(sink, spec(1))?,
        })
    }

    pub fn write_samples(&mut self, samples: &[i16]) -> Result<()> {
        for &sample in samples {
            self.writer.write_sample(sample)?;
        }
        Ok(())
    }

    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

/// A fixed-channel-count WAV encoder that interleaves per-channel sample
/// buffers as they arrive, writing only as many interleaved frames as the
/// shortest buffer supports and retaining the remainder. Used by the
/// passive capture pipeline, whose two RTP flows (to-caller/to-callee)
/// rarely deliver packets in lockstep.
pub struct MultichannelRecorder<W: Write + Seek> {
    writer: WavWriter<W>,
    buffers: Vec<Vec<i16>>,
}

impl<W: Write + Seek> MultichannelRecorder<W> {
    pub fn create(sink: W, channels: usize) -> Result<Self> {
        Ok(Self {
            writer: WavWriter::new(sink, spec(channels as u16))?,
            buffers: vec![Vec::new(); channels],
        })
    }

    /// Appends decoded samples to `channel`'s buffer, then writes out and
    /// drains every fully-interleaved frame across all channels.
    pub fn feed(&mut self, channel: usize, samples: &[i16]) -> Result<()> {
        self.buffers[channel].extend_from_slice(samples);
        self.drain_interleaved()
    }

    fn drain_interleaved(&mut self) -> Result<()> {
        let frames = self.buffers.iter().map(Vec::len).min().unwrap_or(0);
        if frames == 0 {
            return Ok(());
        }
        for i in 0..frames {
            for buffer in &self.buffers {
                self.writer.write_sample(buffer[i])?;
            }
        }
        for buffer in &mut self.buffers {
            buffer.drain(0..frames);
        }
        Ok(())
    }

    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn mono_writer_produces_valid_wav_header() {
        let buf = Cursor::new(Vec::new());
        let mut writer = MonoWavWriter::create(buf).unwrap();
        writer.write_samples(&[0, 100, -100, 32767]).unwrap();
        writer.finalize().unwrap();
    }

    #[test]
    fn multichannel_recorder_only_flushes_shortest_buffer_length() {
        let buf = Cursor::new(Vec::new());
        let mut recorder = MultichannelRecorder::create(buf, 2).unwrap();

        recorder.feed(0, &[1, 2, 3]).unwrap();
        assert_eq!(recorder.buffers[0].len(), 3);
        assert_eq!(recorder.buffers[1].len(), 0);

        recorder.feed(1, &[10, 20]).unwrap();
        // Two interleaved frames drained; channel 0 keeps its third sample.
        assert_eq!(recorder.buffers[0].len(), 1);
        assert_eq!(recorder.buffers[0][0], 3);
        assert_eq!(recorder.buffers[1].len(), 0);

        recorder.feed(1, &[30]).unwrap();
        assert_eq!(recorder.buffers[0].len(), 0);
        assert_eq!(recorder.buffers[1].len(), 0);

        recorder.finalize().unwrap();
    }
}
