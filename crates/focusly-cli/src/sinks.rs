//! Desktop side effects for the foreground timer.

use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use focusly_core::{CoreError, Notification, NotificationSink, Result, SoundPlayer, SoundType};
use notify_rust::{Timeout, Urgency};

const APP_NAME: &str = "focusly";

/// Echoes every alert to the terminal and, unless disabled, raises a
/// desktop notification. With `json` set the echo goes to stderr so stdout
/// carries only events.
pub struct DesktopNotifier {
    desktop: bool,
    json: bool,
}

impl DesktopNotifier {
    pub fn new(desktop: bool, json: bool) -> Self {
        Self { desktop, json }
    }

    fn echo(&self, notification: &Notification) -> String {
        format!("\n>> {}: {}", notification.title, notification.body)
    }
}

impl NotificationSink for DesktopNotifier {
    fn deliver(&mut self, notification: &Notification) -> Result<()> {
        if self.json {
            eprintln!("{}", self.echo(notification));
        } else {
            println!("{}", self.echo(notification));
        }
        if !self.desktop {
            return Ok(());
        }
        notify_rust::Notification::new()
            .summary(&notification.title)
            .body(&notification.body)
            .appname(APP_NAME)
            .icon("alarm-clock")
            .urgency(Urgency::Normal)
            .timeout(Timeout::Milliseconds(8000))
            .show()
            .map(|_| ())
            .map_err(|e| CoreError::collaborator("notifications", e.to_string()))
    }
}

/// Plays freedesktop theme sounds through `paplay`; rings the terminal
/// bell when neither the player nor the file is available.
#[derive(Default)]
pub struct SystemSoundPlayer {
    playing: Vec<Child>,
}

impl SystemSoundPlayer {
    /// Collect players that have exited.
    fn reap(&mut self) {
        self.playing
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }

    fn sound_file(sound: SoundType) -> Option<&'static str> {
        match sound {
            SoundType::None => None,
            SoundType::BreakTime => Some("/usr/share/sounds/freedesktop/stereo/bell.oga"),
            SoundType::Gentle => Some("/usr/share/sounds/freedesktop/stereo/message.oga"),
            SoundType::Notification => {
                Some("/usr/share/sounds/freedesktop/stereo/message-new-instant.oga")
            }
            SoundType::WorkComplete | SoundType::SessionComplete | SoundType::Celebration => {
                Some("/usr/share/sounds/freedesktop/stereo/complete.oga")
            }
        }
    }

    fn bell() -> Result<()> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

impl SoundPlayer for SystemSoundPlayer {
    fn play(&mut self, sound: SoundType, volume: f32) -> Result<()> {
        self.reap();
        let Some(file) = Self::sound_file(sound).filter(|f| Path::new(f).exists()) else {
            return Self::bell();
        };
        // paplay volume is linear, 65536 = 100%.
        let volume = format!("--volume={}", (volume * 65536.0) as u32);
        match Command::new("paplay")
            .arg(volume)
            .arg(file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                self.playing.push(child);
                Ok(())
            }
            Err(_) => Self::bell(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_sound_has_no_file() {
        assert!(SystemSoundPlayer::sound_file(SoundType::None).is_none());
        for sound in SoundType::ALL.into_iter().filter(|s| *s != SoundType::None) {
            assert!(SystemSoundPlayer::sound_file(sound).is_some());
        }
    }

    #[test]
    fn json_mode_echo_matches_terminal_text() {
        let notifier = DesktopNotifier::new(false, true);
        let echo = notifier.echo(&Notification::session_complete());
        assert!(echo.starts_with("\n>> Session Complete!: "));
    }

    #[test]
    fn finished_players_are_reaped() {
        let mut player = SystemSoundPlayer::default();
        player.playing.push(Command::new("true").spawn().unwrap());
        for _ in 0..50 {
            player.reap();
            if player.playing.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(player.playing.is_empty());
    }
}
