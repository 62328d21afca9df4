//! Birdsong phrases
//!
//! Pure note generation: every call returns a list of [`Note`]s with start
//! times relative to "now". Nothing here touches an audio device.

use crate::util::Rng;

/// One tone to synthesize
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Target frequency in Hz
    pub freq: f32,
    /// Start time in seconds, relative to when the phrase is played
    pub start: f32,
    /// Duration in seconds
    pub duration: f32,
    /// Peak gain
    pub volume: f32,
}

impl Note {
    pub const fn new(freq: f32, start: f32, duration: f32, volume: f32) -> Self {
        Self {
            freq,
            start,
            duration,
            volume,
        }
    }

    /// When the note has fully decayed
    pub fn end(&self) -> f32 {
        self.start + self.duration
    }
}

/// Melody shapes, each instantiated at a base pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Melody {
    /// Descending, then back up
    Robin,
    /// Ascending scale ending in a trill
    Warbler,
    /// Long phrase with varied intervals
    Nightingale,
    /// Short bright bursts
    Finch,
    /// Slow and melodic with pauses
    Thrush,
}

const ROBIN: [f32; 8] = [1.0, 0.9, 0.8, 0.85, 1.1, 1.0, 0.75, 0.9];
const WARBLER: [f32; 6] = [0.8, 0.9, 1.0, 1.1, 1.2, 1.3];
const NIGHTINGALE: [(f32, f32); 10] = [
    (1.0, 0.15),
    (1.2, 0.1),
    (1.0, 0.2),
    (0.8, 0.12),
    (1.0, 0.08),
    (1.3, 0.15),
    (1.1, 0.1),
    (0.9, 0.15),
    (1.0, 0.12),
    (1.15, 0.2),
];
const FINCH: [f32; 5] = [1.0, 1.2, 1.4, 1.2, 1.0];
/// (ratio, start, duration, volume)
const THRUSH: [(f32, f32, f32, f32); 4] = [
    (1.0, 0.0, 0.25, 0.03),
    (0.85, 0.35, 0.2, 0.028),
    (1.1, 0.65, 0.3, 0.032),
    (0.9, 1.05, 0.2, 0.025),
];

impl Melody {
    pub const ALL: [Self; 5] = [
        Self::Robin,
        Self::Warbler,
        Self::Nightingale,
        Self::Finch,
        Self::Thrush,
    ];

    pub fn random(rng: &mut Rng) -> Self {
        rng.pick(&Self::ALL).copied().unwrap_or(Self::Robin)
    }

    /// Notes of this melody at `base` Hz, starting at `t0` seconds
    pub fn notes(self, base: f32, t0: f32) -> Vec<Note> {
        match self {
            Self::Robin => ROBIN
                .iter()
                .enumerate()
                .map(|(i, r)| Note::new(base * r, t0 + i as f32 * 0.12, 0.1, 0.03))
                .collect(),
            Self::Warbler => {
                let mut notes: Vec<Note> = WARBLER
                    .iter()
                    .enumerate()
                    .map(|(i, r)| Note::new(base * r, t0 + i as f32 * 0.1, 0.09, 0.03))
                    .collect();
                for i in 0..6 {
                    let r = if i % 2 == 0 { 1.3 } else { 1.4 };
                    notes.push(Note::new(base * r, t0 + 0.6 + i as f32 * 0.04, 0.035, 0.025));
                }
                notes
            },
            Self::Nightingale => {
                let mut offset = 0.0;
                NIGHTINGALE
                    .iter()
                    .map(|&(r, d)| {
                        let note = Note::new(base * r, t0 + offset, d, 0.032);
                        offset += d + 0.02;
                        note
                    })
                    .collect()
            },
            Self::Finch => FINCH
                .iter()
                .enumerate()
                .map(|(i, r)| Note::new(base * r, t0 + i as f32 * 0.08, 0.07, 0.035))
                .collect(),
            Self::Thrush => THRUSH
                .iter()
                .map(|&(r, start, d, v)| Note::new(base * r, t0 + start, d, v))
                .collect(),
        }
    }
}

/// A single melody at a random base pitch
pub fn song(rng: &mut Rng) -> Vec<Note> {
    let base = rng.range_f32(1800.0, 3300.0);
    Melody::random(rng).notes(base, 0.0)
}

/// One bird sings, a second answers higher up after a pause
pub fn conversation(rng: &mut Rng) -> Vec<Note> {
    let base_a = rng.range_f32(1800.0, 3000.0);
    let mut notes = Melody::random(rng).notes(base_a, 0.0);

    let delay = rng.range_f32(1.2, 2.0);
    let base_b = rng.range_f32(2200.0, 3700.0);
    notes.extend(Melody::random(rng).notes(base_b, delay));
    notes
}

/// A quick two-note chirp, either rising or a two-tone tweet
pub fn chirp(rng: &mut Rng) -> Vec<Note> {
    let base = rng.range_f32(2500.0, 4500.0);
    if rng.chance(0.5) {
        vec![
            Note::new(base * 0.7, 0.0, 0.06, 0.03),
            Note::new(base * 1.1, 0.07, 0.08, 0.035),
        ]
    } else {
        vec![
            Note::new(base, 0.0, 0.08, 0.03),
            Note::new(base * 1.25, 0.1, 0.1, 0.03),
        ]
    }
}

/// What a scheduled sound event turns into
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Song,
    Conversation,
    /// Optionally answered by a second chirp after `echo` seconds
    Chirp { echo: Option<f32> },
}

impl Call {
    pub fn pick(rng: &mut Rng) -> Self {
        let r = rng.next_f32();
        if r < 0.45 {
            Self::Song
        } else if r < 0.7 {
            Self::Conversation
        } else {
            let echo = rng.chance(0.5).then(|| rng.range_f32(0.15, 0.4));
            Self::Chirp { echo }
        }
    }

    pub fn notes(self, rng: &mut Rng) -> Vec<Note> {
        match self {
            Self::Song => song(rng),
            Self::Conversation => conversation(rng),
            Self::Chirp { .. } => chirp(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_melody_lengths() {
        assert_eq!(Melody::Robin.notes(2000.0, 0.0).len(), 8);
        assert_eq!(Melody::Warbler.notes(2000.0, 0.0).len(), 12);
        assert_eq!(Melody::Nightingale.notes(2000.0, 0.0).len(), 10);
        assert_eq!(Melody::Finch.notes(2000.0, 0.0).len(), 5);
        assert_eq!(Melody::Thrush.notes(2000.0, 0.0).len(), 4);
    }

    #[test]
    fn test_notes_start_at_offset_and_scale_with_base() {
        for melody in Melody::ALL {
            let notes = melody.notes(2000.0, 1.5);
            assert!((notes[0].start - 1.5).abs() < 1e-6);
            assert!(notes.iter().all(|n| n.start >= 1.5));
            assert!(notes.iter().all(|n| n.duration > 0.0 && n.volume > 0.0));
            assert!(notes.iter().all(|n| (1000.0..3000.0).contains(&n.freq)));
        }
    }

    #[test]
    fn test_robin_shape() {
        let notes = Melody::Robin.notes(1000.0, 0.0);
        let freqs: Vec<f32> = notes.iter().map(|n| n.freq).collect();
        assert!((freqs[0] - 1000.0).abs() < 1e-3);
        assert!(freqs[1] < freqs[0] && freqs[2] < freqs[1]);
        assert!((notes[7].start - 0.84).abs() < 1e-5);
    }

    #[test]
    fn test_nightingale_gaps() {
        let notes = Melody::Nightingale.notes(2000.0, 0.0);
        for pair in notes.windows(2) {
            assert!((pair[1].start - pair[0].end() - 0.02).abs() < 1e-5);
        }
    }

    #[test]
    fn test_conversation_second_voice_is_later() {
        let mut rng = Rng::new(4);
        for _ in 0..20 {
            let notes = conversation(&mut rng);
            let last = notes.iter().map(Note::end).fold(0.0, f32::max);
            assert!(last > 1.2);
        }
    }

    #[test]
    fn test_chirp_is_two_quick_notes() {
        let mut rng = Rng::new(5);
        for _ in 0..20 {
            let notes = chirp(&mut rng);
            assert_eq!(notes.len(), 2);
            assert!(notes[1].start > notes[0].start);
            assert!(notes[1].freq > notes[0].freq);
            assert!(notes[1].end() <= 0.2 + 1e-6);
        }
    }

    #[test]
    fn test_call_mix() {
        let mut rng = Rng::new(6);
        let (mut songs, mut talks, mut chirps) = (0, 0, 0);
        for _ in 0..2000 {
            match Call::pick(&mut rng) {
                Call::Song => songs += 1,
                Call::Conversation => talks += 1,
                Call::Chirp { echo } => {
                    chirps += 1;
                    if let Some(delay) = echo {
                        assert!((0.15..0.4).contains(&delay));
                    }
                },
            }
        }
        assert!(songs > talks && songs > chirps);
        assert!(talks > 300 && chirps > 400);
    }
}
