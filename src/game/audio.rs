// Sound cues, the mute gate in front of the playback backend, and the rodio
// backend that plays cues on the default output device.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    BackgroundMusic,
    Projects,
    Creature,
    Jump,
}

impl SoundCue {
    pub fn file(self) -> &'static str {
        match self {
            SoundCue::BackgroundMusic => "sfx/music.ogg",
            SoundCue::Projects => "sfx/projects.ogg",
            SoundCue::Creature => "sfx/pokemon.ogg",
            SoundCue::Jump => "sfx/jumpsfx.ogg",
        }
    }

    pub fn volume(self) -> f32 {
        match self {
            SoundCue::BackgroundMusic => 0.3,
            SoundCue::Projects | SoundCue::Creature => 0.5,
            SoundCue::Jump => 1.0,
        }
    }

    pub fn looping(self) -> bool {
        self == SoundCue::BackgroundMusic
    }
}

/// Playback backend.
pub trait SoundSink {
    fn play(&mut self, cue: SoundCue);
    fn pause(&mut self, cue: SoundCue);
}

/// Backend that only reports what it would play.
#[derive(Debug, Default)]
pub struct LogSink;

impl SoundSink for LogSink {
    fn play(&mut self, cue: SoundCue) {
        log::debug!(
            "play {:?} ({}, volume {:.1}{})",
            cue,
            cue.file(),
            cue.volume(),
            if cue.looping() { ", looping" } else { "" }
        );
    }

    fn pause(&mut self, cue: SoundCue) {
        log::debug!("pause {:?}", cue);
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: rodio::decoder::DecoderError,
    },
    #[error("no audio output: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("failed to start playback: {0}")]
    Play(#[from] rodio::PlayError),
}

pub type CueSource = Box<dyn Source<Item = i16> + Send>;

/// Decode `cue` from under `root` at its volume, looping if the cue loops.
pub fn cue_source(root: &Path, cue: SoundCue) -> Result<CueSource, AudioError> {
    let path = root.join(cue.file());
    let file = File::open(&path).map_err(|source| AudioError::Io {
        path: path.clone(),
        source,
    })?;
    let decoder =
        Decoder::new(BufReader::new(file)).map_err(|source| AudioError::Decode { path, source })?;

    let source = decoder.amplify(cue.volume());
    if cue.looping() {
        Ok(Box::new(source.repeat_infinite()))
    } else {
        Ok(Box::new(source))
    }
}

/// Plays cues through the default output device.
pub struct RodioSink {
    // Dropping the stream silences every sink.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    root: PathBuf,
    music: Option<Sink>,
}

impl RodioSink {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            root: root.into(),
            music: None,
        })
    }

    fn start(&self, cue: SoundCue) -> Result<Sink, AudioError> {
        let source = cue_source(&self.root, cue)?;
        let sink = Sink::try_new(&self.handle)?;
        sink.append(source);
        Ok(sink)
    }
}

impl SoundSink for RodioSink {
    fn play(&mut self, cue: SoundCue) {
        if cue == SoundCue::BackgroundMusic {
            if let Some(music) = &self.music {
                music.play();
                return;
            }
        }
        match self.start(cue) {
            Ok(sink) if cue == SoundCue::BackgroundMusic => self.music = Some(sink),
            Ok(sink) => sink.detach(),
            Err(e) => log::warn!("{:?}: {}", cue, e),
        }
    }

    fn pause(&mut self, cue: SoundCue) {
        if cue == SoundCue::BackgroundMusic {
            if let Some(music) = &self.music {
                music.pause();
            }
        }
    }
}

/// The rodio backend, or `LogSink` when no output device opens.
pub fn output_sink(root: &Path) -> Box<dyn SoundSink> {
    match RodioSink::open(root) {
        Ok(sink) => {
            log::info!("audio output opened, assets under {}", root.display());
            Box::new(sink)
        }
        Err(e) => {
            log::warn!("{}, cues will only be logged", e);
            Box::new(LogSink)
        }
    }
}

pub struct AudioMixer {
    sink: Box<dyn SoundSink>,
    muted: bool,
}

impl AudioMixer {
    pub fn new(sink: Box<dyn SoundSink>) -> Self {
        Self { sink, muted: false }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Play `cue` unless muted.
    pub fn play(&mut self, cue: SoundCue) {
        if !self.muted {
            self.sink.play(cue);
        }
    }

    /// Entering the scene starts the music.
    pub fn enter(&mut self) {
        self.play(SoundCue::Projects);
        self.play(SoundCue::BackgroundMusic);
    }

    /// Flip mute. The click itself is audible only when turning sound off.
    pub fn toggle(&mut self) -> bool {
        self.play(SoundCue::Projects);
        self.muted = !self.muted;
        if self.muted {
            self.sink.pause(SoundCue::BackgroundMusic);
        } else {
            self.sink.play(SoundCue::BackgroundMusic);
        }
        log::info!("audio {}", if self.muted { "muted" } else { "unmuted" });
        self.muted
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Played {
        Play(SoundCue),
        Pause(SoundCue),
    }

    /// Sink that records calls into a shared log.
    #[derive(Clone, Default)]
    pub struct RecordingSink(pub Rc<RefCell<Vec<Played>>>);

    impl RecordingSink {
        pub fn take(&self) -> Vec<Played> {
            std::mem::take(&mut *self.0.borrow_mut())
        }
    }

    impl SoundSink for RecordingSink {
        fn play(&mut self, cue: SoundCue) {
            self.0.borrow_mut().push(Played::Play(cue));
        }

        fn pause(&mut self, cue: SoundCue) {
            self.0.borrow_mut().push(Played::Pause(cue));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Played, RecordingSink};
    use super::*;

    /// Mono 16-bit PCM WAV holding `samples` at 22050 Hz.
    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&22050u32.to_le_bytes());
        out.extend_from_slice(&44100u32.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    /// Fresh asset root with a short tone written at `cue`'s path.
    fn asset_root(test: &str, cue: SoundCue) -> PathBuf {
        let root = std::env::temp_dir().join(format!("portfolio_island_{}_{}", test, std::process::id()));
        let path = root.join(cue.file());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let tone: Vec<i16> = (0..100).map(|i| if i % 2 == 0 { 8000 } else { -8000 }).collect();
        std::fs::write(&path, wav_bytes(&tone)).unwrap();
        root
    }

    #[test]
    fn effect_cues_play_once_at_their_volume() {
        let root = asset_root("effect", SoundCue::Jump);
        let source = cue_source(&root, SoundCue::Jump).unwrap();
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 22050);
        let samples: Vec<i16> = source.collect();
        assert_eq!(samples.len(), 100);
        assert_eq!(samples[0], 8000);
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn background_music_loops_past_its_length() {
        let root = asset_root("music", SoundCue::BackgroundMusic);
        let source = cue_source(&root, SoundCue::BackgroundMusic).unwrap();
        assert_eq!(source.take(300).count(), 300);
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn missing_cue_file_names_the_path() {
        let root = std::env::temp_dir().join("portfolio_island_no_such_assets");
        let err = cue_source(&root, SoundCue::Creature).err().unwrap();
        assert!(matches!(err, AudioError::Io { .. }));
        assert!(err.to_string().contains("pokemon.ogg"));
    }

    fn mixer() -> (AudioMixer, RecordingSink) {
        let sink = RecordingSink::default();
        (AudioMixer::new(Box::new(sink.clone())), sink)
    }

    #[test]
    fn mute_gates_every_cue() {
        let (mut mixer, sink) = mixer();
        mixer.toggle();
        sink.take();

        for cue in [SoundCue::Projects, SoundCue::Creature, SoundCue::Jump, SoundCue::BackgroundMusic] {
            mixer.play(cue);
        }
        mixer.enter();
        assert!(sink.take().is_empty());
    }

    #[test]
    fn toggle_pauses_then_resumes_music() {
        let (mut mixer, sink) = mixer();
        assert!(mixer.toggle());
        assert_eq!(
            sink.take(),
            vec![Played::Play(SoundCue::Projects), Played::Pause(SoundCue::BackgroundMusic)]
        );

        assert!(!mixer.toggle());
        assert_eq!(sink.take(), vec![Played::Play(SoundCue::BackgroundMusic)]);
    }

    #[test]
    fn enter_plays_click_and_music() {
        let (mut mixer, sink) = mixer();
        mixer.enter();
        assert_eq!(
            sink.take(),
            vec![Played::Play(SoundCue::Projects), Played::Play(SoundCue::BackgroundMusic)]
        );
    }
}
