//! Birdsong audio
//!
//! The scene decides *when* a bird sings; this module decides *what* it
//! sounds like and hands the notes to an output. The output is opened lazily,
//! at most once, and a failure to open leaves the scene silent but running.

mod device;
pub mod song;
pub mod synth;

pub use device::SdlOutput;
pub use song::Note;

use crate::error::Error;

/// Something that can play scheduled notes
pub trait SongOutput {
    /// Queue `notes`, whose start times are relative to now
    fn play(&mut self, notes: &[Note]);
}

/// Deferred constructor for the audio output
pub type Opener = Box<dyn FnOnce() -> Result<Box<dyn SongOutput>, Error>>;

/// Lazily started birdsong voice for one scene
pub struct Birdsong {
    opener: Option<Opener>,
    output: Option<Box<dyn SongOutput>>,
    volume: f32,
}

impl Birdsong {
    pub fn new(opener: Option<Opener>, volume: f32) -> Self {
        Self {
            opener,
            output: None,
            volume: volume.max(0.0),
        }
    }

    /// Open the output. Only the first call does anything; later calls and
    /// calls after a failed open are no-ops.
    pub fn start(&mut self) {
        let Some(open) = self.opener.take() else {
            return;
        };
        match open() {
            Ok(output) => {
                log::info!("birdsong started");
                self.output = Some(output);
            },
            Err(e) => log::warn!("audio unavailable, continuing without birdsong: {e}"),
        }
    }

    pub fn is_active(&self) -> bool {
        self.output.is_some()
    }

    /// Play notes through the output if it is open
    pub fn perform(&mut self, notes: &[Note]) {
        let Some(output) = self.output.as_mut() else {
            return;
        };
        if (self.volume - 1.0).abs() < f32::EPSILON {
            output.play(notes);
        } else {
            let scaled: Vec<Note> = notes
                .iter()
                .map(|n| Note {
                    volume: n.volume * self.volume,
                    ..*n
                })
                .collect();
            output.play(&scaled);
        }
    }

    /// Release the output and forget the opener
    pub fn dispose(&mut self) {
        self.opener = None;
        if self.output.take().is_some() {
            log::debug!("birdsong output released");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Output that records everything it is asked to play
    #[derive(Default, Clone)]
    pub(crate) struct Recorder {
        pub played: Rc<RefCell<Vec<Note>>>,
        pub opens: Rc<RefCell<usize>>,
    }

    impl SongOutput for Recorder {
        fn play(&mut self, notes: &[Note]) {
            self.played.borrow_mut().extend_from_slice(notes);
        }
    }

    impl Recorder {
        pub(crate) fn opener(&self) -> Opener {
            let recorder = self.clone();
            Box::new(move || {
                *recorder.opens.borrow_mut() += 1;
                Ok(Box::new(recorder) as Box<dyn SongOutput>)
            })
        }
    }

    #[test]
    fn test_start_opens_once() {
        let recorder = Recorder::default();
        let mut song = Birdsong::new(Some(recorder.opener()), 1.0);
        assert!(!song.is_active());
        song.start();
        song.start();
        assert!(song.is_active());
        assert_eq!(*recorder.opens.borrow(), 1);
    }

    #[test]
    fn test_failed_open_is_silent() {
        let opener: Opener = Box::new(|| Err(Error::Audio("no device".into())));
        let mut song = Birdsong::new(Some(opener), 1.0);
        song.start();
        assert!(!song.is_active());
        song.perform(&[Note::new(2000.0, 0.0, 0.1, 0.03)]);
    }

    #[test]
    fn test_perform_scales_volume() {
        let recorder = Recorder::default();
        let mut song = Birdsong::new(Some(recorder.opener()), 0.5);
        song.perform(&[Note::new(2000.0, 0.0, 0.1, 0.04)]);
        assert!(recorder.played.borrow().is_empty());

        song.start();
        song.perform(&[Note::new(2000.0, 0.0, 0.1, 0.04)]);
        let played = recorder.played.borrow();
        assert_eq!(played.len(), 1);
        assert!((played[0].volume - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_dispose_stops_output() {
        let recorder = Recorder::default();
        let mut song = Birdsong::new(Some(recorder.opener()), 1.0);
        song.dispose();
        song.start();
        assert!(!song.is_active());
        assert_eq!(*recorder.opens.borrow(), 0);
    }
}
