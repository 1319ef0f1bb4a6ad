use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::notifications::{Alert, ChimeRequest};

/// Everything the notifier thread needs to build its [`ChimeAlert`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSettings {
    pub sound_file: Option<PathBuf>,
    pub volume: f32,
    pub desktop_notifications: bool,
}

/// Runs on the notifier thread, so waiting for `notify-send` to exit only
/// delays the next chime by as long as the call takes.
pub fn send_notification(title: &str, message: &str) {
    let status = Command::new("notify-send")
        .arg(title)
        .arg(message)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if !status.success() => debug!(%status, "notify-send failed"),
        Ok(_) => {}
        Err(err) => debug!(%err, "notify-send unavailable"),
    }
}

/// Sound output used by [`ChimeAlert`].
pub trait Player {
    fn play_file(&self, path: &Path) -> Result<()>;
    fn play_chime(&self) -> Result<()>;
}

pub struct AudioPlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    volume: f32,
}

impl AudioPlayer {
    pub fn new(volume: f32) -> Option<Self> {
        let (stream, stream_handle) = OutputStream::try_default().ok()?;
        Some(Self {
            _stream: stream,
            stream_handle,
            volume,
        })
    }

    fn sink(&self) -> Result<Sink> {
        let sink = Sink::try_new(&self.stream_handle).map_err(|e| Error::Audio(e.to_string()))?;
        sink.set_volume(self.volume);
        Ok(sink)
    }
}

impl Player for AudioPlayer {
    fn play_file(&self, path: &Path) -> Result<()> {
        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| Error::Audio(e.to_string()))?;

        let sink = self.sink()?;
        sink.append(source);
        sink.detach();
        Ok(())
    }

    fn play_chime(&self) -> Result<()> {
        let sink = self.sink()?;

        // 880 Hz (A5) then 1108 Hz (C#6) with a short gap
        let tone1 = SineWave::new(880.0)
            .take_duration(Duration::from_millis(150))
            .amplify(0.3);
        let silence = SineWave::new(0.0)
            .take_duration(Duration::from_millis(50))
            .amplify(0.0);
        let tone2 = SineWave::new(1108.0)
            .take_duration(Duration::from_millis(200))
            .amplify(0.3);

        sink.append(tone1);
        sink.append(silence);
        sink.append(tone2);

        // Detach so it plays without blocking
        sink.detach();
        Ok(())
    }
}

type DesktopNotify = Box<dyn Fn(&str, &str)>;

/// The alert rung by the background notifier.
pub struct ChimeAlert<P = AudioPlayer> {
    player: Option<P>,
    settings: AlertSettings,
    notify: DesktopNotify,
}

impl ChimeAlert {
    pub fn new(settings: AlertSettings) -> Self {
        let player = AudioPlayer::new(settings.volume);
        if player.is_none() {
            warn!("no audio output device, chimes will be silent");
        }
        Self::with_player(player, settings, Box::new(send_notification))
    }
}

impl<P: Player> ChimeAlert<P> {
    pub fn with_player(player: Option<P>, settings: AlertSettings, notify: DesktopNotify) -> Self {
        Self {
            player,
            settings,
            notify,
        }
    }
}

impl<P: Player> Alert for ChimeAlert<P> {
    fn ring(&self, request: &ChimeRequest) {
        if let Some(ref player) = self.player {
            let played = match self.settings.sound_file {
                Some(ref path) => player.play_file(path).or_else(|err| {
                    warn!(path = %path.display(), %err, "falling back to built-in chime");
                    player.play_chime()
                }),
                None => player.play_chime(),
            };
            if let Err(err) = played {
                warn!(id = %request.id, %err, "chime playback failed");
            }
        }

        if self.settings.desktop_notifications {
            (self.notify)(&request.title, &request.body);
        }
    }
}
