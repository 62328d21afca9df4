use super::song::Note;
use super::synth::Mixer;
use super::SongOutput;
use crate::error::Error;
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};
use sdl2::AudioSubsystem;

const SAMPLE_RATE: i32 = 44_100;

impl AudioCallback for Mixer {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        self.fill(out);
    }
}

/// Mono playback device fed by a [`Mixer`] on SDL's audio thread.
///
/// Dropping it stops playback and closes the device.
pub struct SdlOutput {
    device: AudioDevice<Mixer>,
}

impl SdlOutput {
    pub fn open(audio: &AudioSubsystem) -> Result<Self, Error> {
        let desired = AudioSpecDesired {
            freq: Some(SAMPLE_RATE),
            channels: Some(1),
            samples: None,
        };

        let device = audio
            .open_playback(None, &desired, |spec| {
                log::debug!(
                    "audio device: {} Hz, {} channel(s), {} samples",
                    spec.freq,
                    spec.channels,
                    spec.samples
                );
                Mixer::new(spec.freq as f32)
            })
            .map_err(Error::Audio)?;
        device.resume();

        Ok(Self { device })
    }
}

impl SongOutput for SdlOutput {
    fn play(&mut self, notes: &[Note]) {
        self.device.lock().schedule(notes);
    }
}
