//! Text-to-speech for assistant replies
//!
//! This module provides:
//! - The host capability interface ([`SpeechPort`])
//! - The per-message playback lifecycle ([`SpeechPlayback`])
//! - A synthesizer backend driving `espeak-ng` ([`CommandSpeech`])
//! - An in-process backend that records calls ([`MemorySpeech`])

pub mod command;
pub mod memory;
pub mod playback;
pub mod port;
pub mod text;

use crate::config::SpeechSection;

// Re-export commonly used types
pub use command::CommandSpeech;
pub use memory::{MemorySpeech, SpeechCall};
pub use playback::{PlaybackInputs, PlaybackState, SpeechPlayback, SpeechPolicy};
pub use port::{
    ListenerId, SharedSpeech, SpeechEvent, SpeechPort, SpeechRequest, UtteranceId, Voice,
};
pub use text::speakable_text;

/// Detect the host speech capability. `None` means speech is unavailable and
/// every playback operation becomes a no-op.
pub fn detect(settings: &SpeechSection) -> Option<SharedSpeech> {
    if !settings.enabled {
        tracing::info!("[SPEECH] Disabled by configuration");
        return None;
    }

    CommandSpeech::detect(&settings.program, &settings.lang).map(|port| port as SharedSpeech)
}
