//! Sound cues and the players that emit them.

use crate::config::CueDurations;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Item went into the right bin.
    Success,
    /// Clicked a bin that does not match the lowest item.
    Error,
    /// Item touched a bin of another category; the session ends after this plays.
    Fatal,
}

/// Anything that can play a cue and report how long it lasts.
pub trait SoundPlayer {
    fn play(&mut self, cue: SoundCue);
    fn duration(&self, cue: SoundCue) -> Duration;
}

fn cue_duration(durations: &CueDurations, cue: SoundCue) -> Duration {
    let ms = match cue {
        SoundCue::Success => durations.success_ms,
        SoundCue::Error => durations.error_ms,
        SoundCue::Fatal => durations.fatal_ms,
    };
    Duration::from_millis(ms)
}

/// Terminal "speaker": rings the bell. Durations come from config since a bell has no length.
#[derive(Debug, Clone)]
pub struct TerminalSound {
    durations: CueDurations,
    muted: bool,
    quiet_success: bool,
}

impl TerminalSound {
    pub fn new(durations: CueDurations, muted: bool, quiet_success: bool) -> Self {
        Self {
            durations,
            muted,
            quiet_success,
        }
    }

    fn rings(&self, cue: SoundCue) -> bool {
        !self.muted && !(self.quiet_success && cue == SoundCue::Success)
    }
}

impl SoundPlayer for TerminalSound {
    fn play(&mut self, cue: SoundCue) {
        log::debug!("cue {:?}", cue);
        if !self.rings(cue) {
            return;
        }
        let mut out = std::io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|()| out.flush()) {
            log::warn!("terminal bell failed: {e}");
        }
    }

    fn duration(&self, cue: SoundCue) -> Duration {
        cue_duration(&self.durations, cue)
    }
}

/// Records every cue instead of playing it.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSound {
    pub played: Vec<SoundCue>,
    pub durations: CueDurations,
}

#[cfg(test)]
impl SoundPlayer for RecordingSound {
    fn play(&mut self, cue: SoundCue) {
        self.played.push(cue);
    }

    fn duration(&self, cue: SoundCue) -> Duration {
        cue_duration(&self.durations, cue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations_follow_config() {
        let d = CueDurations {
            success_ms: 10,
            error_ms: 20,
            fatal_ms: 1500,
        };
        let snd = TerminalSound::new(d, true, false);
        assert_eq!(snd.duration(SoundCue::Success), Duration::from_millis(10));
        assert_eq!(snd.duration(SoundCue::Error), Duration::from_millis(20));
        assert_eq!(snd.duration(SoundCue::Fatal), Duration::from_millis(1500));
    }

    #[test]
    fn test_bell_rules() {
        let d = CueDurations::default();
        let muted = TerminalSound::new(d, true, false);
        assert!(!muted.rings(SoundCue::Fatal));

        let quiet = TerminalSound::new(d, false, true);
        assert!(!quiet.rings(SoundCue::Success));
        assert!(quiet.rings(SoundCue::Error));
        assert!(quiet.rings(SoundCue::Fatal));

        let loud = TerminalSound::new(d, false, false);
        assert!(loud.rings(SoundCue::Success));
    }
}
