//! Macro recording and playback bookkeeping.
//!
//! Recording captures keys exactly as they reach the buffer, before remaps,
//! so playback through the same entry point reproduces them. The keys of
//! the command that stops a recording are not part of it.

use tracing::debug;

use crate::error::ExecutionError;
use crate::key::KeyInput;
use crate::register::RegisterName;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Recording {
    register: RegisterName,
    keys: Vec<KeyInput>,
    /// Length of `keys` when the command being typed began.
    command_start: usize,
}

/// Collects keys for `q{reg}` … `q`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroRecorder {
    recording: Option<Recording>,
}

impl MacroRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// The register being recorded into.
    pub fn register(&self) -> Option<RegisterName> {
        self.recording.as_ref().map(|r| r.register)
    }

    pub fn start(&mut self, register: RegisterName) {
        debug!(register = %register, "start recording");
        self.recording = Some(Recording {
            register,
            keys: Vec::new(),
            command_start: 0,
        });
    }

    /// Marks the start of a new command, so [`stop`](Self::stop) can drop it.
    pub fn begin_command(&mut self) {
        if let Some(recording) = &mut self.recording {
            recording.command_start = recording.keys.len();
        }
    }

    pub fn record(&mut self, key: KeyInput) {
        if let Some(recording) = &mut self.recording {
            recording.keys.push(key);
        }
    }

    /// Ends the recording and returns the register with the keys typed
    /// before the stopping command.
    pub fn stop(&mut self) -> Option<(RegisterName, Vec<KeyInput>)> {
        let mut recording = self.recording.take()?;
        recording.keys.truncate(recording.command_start);
        debug!(register = %recording.register, keys = recording.keys.len(), "stop recording");
        Some((recording.register, recording.keys))
    }
}

/// Tracks nested playback: `@a` running `@b` running …
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroPlayer {
    depth: usize,
    max_depth: usize,
    last_register: Option<RegisterName>,
}

impl MacroPlayer {
    pub fn new(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth: max_depth.max(1),
            last_register: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.depth > 0
    }

    /// The register `@@` replays.
    pub fn last_register(&self) -> Option<RegisterName> {
        self.last_register
    }

    /// Enters one level of playback. Fails once the nesting limit is reached.
    pub fn enter(&mut self, register: RegisterName) -> Result<(), ExecutionError> {
        if self.depth >= self.max_depth {
            return Err(ExecutionError::MacroRecursion(self.max_depth));
        }
        self.depth += 1;
        self.last_register = Some(register);
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::parse_keys;

    #[test]
    fn test_stop_drops_the_stopping_command() {
        let mut recorder = MacroRecorder::new();
        recorder.start(RegisterName::Named('q'));
        for key in parse_keys("dwx") {
            recorder.begin_command();
            recorder.record(key);
        }
        // The `q` that stops the recording.
        recorder.begin_command();
        recorder.record(KeyInput::from_char('q'));

        let (register, keys) = recorder.stop().unwrap();
        assert_eq!(register, RegisterName::Named('q'));
        assert_eq!(keys, parse_keys("dwx"));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_keys_outside_recording_are_ignored() {
        let mut recorder = MacroRecorder::new();
        recorder.record(KeyInput::from_char('x'));
        assert_eq!(recorder.stop(), None);
    }

    #[test]
    fn test_player_depth_limit() {
        let mut player = MacroPlayer::new(2);
        player.enter(RegisterName::Named('a')).unwrap();
        player.enter(RegisterName::Named('b')).unwrap();
        assert_eq!(
            player.enter(RegisterName::Named('c')),
            Err(ExecutionError::MacroRecursion(2))
        );
        assert_eq!(player.last_register(), Some(RegisterName::Named('b')));
        player.leave();
        player.leave();
        assert!(!player.is_playing());
    }
}
