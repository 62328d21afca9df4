//! Note synthesis
//!
//! A sine oscillator per note, band-passed around its own pitch and shaped by
//! a short attack/hold/release envelope. The [`Mixer`] owns a sample clock;
//! notes are scheduled relative to it and summed into mono f32 output.

use super::song::Note;
use std::f32::consts::TAU;

/// Band-pass resonance around each note's pitch
pub const FILTER_Q: f32 = 8.0;
/// Simultaneous voices; further notes are dropped until some finish
pub const MAX_VOICES: usize = 64;
/// Voices ring on this long past their nominal duration
const TAIL: f32 = 0.01;

/// Gain at `t` seconds into a note of length `d`: linear attack over the
/// first tenth, hold, a step down to 90% at 60%, then linear release to 0.
pub fn envelope(t: f32, d: f32, volume: f32) -> f32 {
    if t < 0.0 || t >= d {
        return 0.0;
    }
    let attack = d * 0.1;
    let hold = d * 0.6;
    if t < attack {
        volume * t / attack
    } else if t < hold {
        volume
    } else {
        volume * 0.9 * (d - t) / (d - hold)
    }
}

/// Instantaneous frequency: a slight rise to +2% at mid-note, settling to
/// -1% by the end
pub fn pitch(t: f32, d: f32, freq: f32) -> f32 {
    let mid = d * 0.5;
    if t <= 0.0 {
        freq
    } else if t < mid {
        freq * (1.0 + 0.02 * t / mid)
    } else if t < d {
        freq * (1.02 - 0.03 * (t - mid) / (d - mid))
    } else {
        freq * 0.99
    }
}

/// RBJ band-pass biquad (0 dB peak gain)
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub fn band_pass(center: f32, q: f32, sample_rate: f32) -> Self {
        let w0 = TAU * (center / sample_rate).clamp(0.0, 0.49);
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: alpha / a0,
            b2: -alpha / a0,
            a1: -2.0 * w0.cos() / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b2 * self.x2 - self.a1 * self.y1 - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

#[derive(Debug, Clone)]
struct Voice {
    note: Note,
    /// Absolute sample index of the first sample
    start: u64,
    phase: f32,
    filter: Biquad,
}

/// Sums scheduled notes into a mono stream
#[derive(Debug)]
pub struct Mixer {
    voices: Vec<Voice>,
    clock: u64,
    sample_rate: f32,
}

impl Mixer {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
            clock: 0,
            sample_rate: sample_rate.max(1.0),
        }
    }

    /// Queue notes relative to the current clock
    pub fn schedule(&mut self, notes: &[Note]) {
        for note in notes {
            if self.voices.len() >= MAX_VOICES {
                log::debug!("voice limit reached, dropping {} Hz note", note.freq as u32);
                continue;
            }
            let offset = (note.start.max(0.0) * self.sample_rate) as u64;
            self.voices.push(Voice {
                note: *note,
                start: self.clock + offset,
                phase: 0.0,
                filter: Biquad::band_pass(note.freq, FILTER_Q, self.sample_rate),
            });
        }
    }

    /// Render the next `out.len()` samples, retiring finished voices
    pub fn fill(&mut self, out: &mut [f32]) {
        let sr = self.sample_rate;
        out.fill(0.0);

        for voice in &mut self.voices {
            let Note {
                freq,
                duration,
                volume,
                ..
            } = voice.note;
            for (i, sample) in out.iter_mut().enumerate() {
                let now = self.clock + i as u64;
                if now < voice.start {
                    continue;
                }
                let t = (now - voice.start) as f32 / sr;
                if t > duration + TAIL {
                    break;
                }
                voice.phase = (voice.phase + TAU * pitch(t, duration, freq) / sr) % TAU;
                let tone = voice.filter.process(voice.phase.sin());
                *sample += tone * envelope(t, duration, volume);
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        self.clock += out.len() as u64;
        let (clock, sr) = (self.clock, self.sample_rate);
        self.voices.retain(|v| {
            let end = v.start + ((v.note.duration + TAIL) * sr) as u64;
            end > clock
        });
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
