//! Host speech capability
//!
//! The host audio subsystem is reached only through [`SpeechPort`]. A port is
//! shared by every playback instance; notifications flow back to each
//! instance over its own channel so two components never steal each other's
//! events.

use crossbeam_channel::Sender;
use std::fmt;
use std::sync::Arc;

/// A synthesis profile offered by the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voice {
    /// Identifier understood by the backend
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Language tag, e.g. `en-US`
    pub lang: String,
    /// Whether the host marks this voice as its default
    pub is_default: bool,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lang: lang.into(),
            is_default: false,
        }
    }
}

/// Identity of one issued utterance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utterance#{}", self.0)
    }
}

/// Identity of a voices-changed subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Text to be read aloud
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub lang: String,
    pub voice: Option<Voice>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: lang.into(),
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: Option<Voice>) -> Self {
        self.voice = voice;
        self
    }
}

/// Notification sent by the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Audio for the utterance became audible
    Started(UtteranceId),
    /// The utterance finished, failed, or was cancelled
    Ended(UtteranceId),
    /// The voice list changed
    VoicesChanged,
}

/// Host speech synthesis capability
///
/// There is a single audio output channel: `speak` interrupts whatever the
/// port is currently playing, and `cancel` silences it.
pub trait SpeechPort: Send + Sync {
    /// Start speaking. `Started`/`Ended` for the returned id go to `notify`.
    fn speak(&self, request: &SpeechRequest, notify: Sender<SpeechEvent>) -> UtteranceId;

    /// Cancel any queued or playing utterance
    fn cancel(&self);

    /// Voices currently known. May be empty until the host finishes loading.
    fn voices(&self) -> Vec<Voice>;

    /// Register a one-shot voices-changed listener. The port drops the
    /// listener after the first `VoicesChanged` it delivers.
    fn subscribe_voices(&self, notify: Sender<SpeechEvent>) -> ListenerId;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe_voices(&self, listener: ListenerId);
}

/// Shared handle to a detected capability
pub type SharedSpeech = Arc<dyn SpeechPort>;
