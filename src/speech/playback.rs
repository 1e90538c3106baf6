//! Speech playback lifecycle for a rendered message
//!
//! `SpeechPlayback` is a small state machine:
//!
//! ```text
//! Idle -> Pending (voices not loaded) -> Speaking -> Idle
//! ```
//!
//! Cancellation returns to `Idle` from any state. [`SpeechPlayback::reconcile`]
//! is called every frame with the inputs the component watches; when they
//! differ from the last call the current request is cancelled before a new
//! one is considered.

use crate::messages::{ChatMessage, Role};
use crate::speech::port::{
    ListenerId, SharedSpeech, SpeechEvent, SpeechRequest, UtteranceId,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Deserialize;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// When a message is read aloud
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechPolicy {
    /// A speaker toggle on the last assistant message
    Manual,
    /// The last assistant message is spoken once loading finishes
    #[default]
    Automatic,
}

/// Observable playback state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Waiting for the host to publish its voices
    Pending,
    /// An utterance has been handed to the host
    Speaking,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Pending => write!(f, "Pending"),
            PlaybackState::Speaking => write!(f, "Speaking"),
        }
    }
}

/// Inputs a message component watches
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackInputs {
    pub message_id: Uuid,
    pub content: String,
    pub role: Role,
    pub is_last: bool,
    pub is_loading: bool,
}

impl PlaybackInputs {
    pub fn new(message: &ChatMessage, is_last: bool, is_loading: bool) -> Self {
        Self {
            message_id: message.id,
            content: message.content.clone(),
            role: message.role,
            is_last,
            is_loading,
        }
    }

    /// Last message, written by the assistant, reply complete
    pub fn should_speak(&self) -> bool {
        self.is_last && !self.role.is_user() && !self.is_loading
    }
}

enum Phase {
    Idle,
    Pending {
        request: SpeechRequest,
        listener: ListenerId,
    },
    Speaking {
        utterance: UtteranceId,
        started: bool,
    },
}

/// Speech lifecycle owned by one message component
pub struct SpeechPlayback {
    port: Option<SharedSpeech>,
    lang: String,
    phase: Phase,
    watched: Option<PlaybackInputs>,
    events_tx: Sender<SpeechEvent>,
    events_rx: Receiver<SpeechEvent>,
}

impl SpeechPlayback {
    /// Create a playback bound to a detected capability. `None` turns every
    /// operation into a no-op.
    pub fn new(port: Option<SharedSpeech>, lang: impl Into<String>) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            port,
            lang: lang.into(),
            phase: Phase::Idle,
            watched: None,
            events_tx,
            events_rx,
        }
    }

    /// Playback for a host without speech synthesis
    pub fn unsupported() -> Self {
        Self::new(None, "en-US")
    }

    pub fn is_supported(&self) -> bool {
        self.port.is_some()
    }

    pub fn state(&self) -> PlaybackState {
        match self.phase {
            Phase::Idle => PlaybackState::Idle,
            Phase::Pending { .. } => PlaybackState::Pending,
            Phase::Speaking { .. } => PlaybackState::Speaking,
        }
    }

    /// A request is pending or speaking
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// The host reported the current utterance as audible
    pub fn is_audible(&self) -> bool {
        matches!(self.phase, Phase::Speaking { started: true, .. })
    }

    /// Utterance currently handed to the host
    pub fn current_utterance(&self) -> Option<UtteranceId> {
        match self.phase {
            Phase::Speaking { utterance, .. } => Some(utterance),
            _ => None,
        }
    }

    /// Re-evaluate after the watched inputs may have changed.
    ///
    /// Unchanged inputs are a no-op. Otherwise the current request is
    /// cancelled and, under [`SpeechPolicy::Automatic`], a new one starts when
    /// the inputs call for speech.
    pub fn reconcile(&mut self, inputs: PlaybackInputs, policy: SpeechPolicy) {
        self.poll_events();

        if self.watched.as_ref() == Some(&inputs) {
            return;
        }

        debug!(
            "[SPEECH] Inputs changed for message {} (last: {}, loading: {})",
            inputs.message_id, inputs.is_last, inputs.is_loading
        );

        self.cancel_current();

        let speak = policy == SpeechPolicy::Automatic && inputs.should_speak();
        let text = inputs.content.clone();
        self.watched = Some(inputs);

        if speak {
            self.speak_when_ready(&text);
        }
    }

    /// Speak once a voice is available. If the host has not published any
    /// voices yet, wait for a single voices-changed notification.
    pub fn speak_when_ready(&mut self, text: &str) {
        let Some(port) = self.port.clone() else {
            return;
        };

        self.cancel_current();

        let request = SpeechRequest::new(text, self.lang.as_str());
        match port.voices().into_iter().next() {
            Some(voice) => self.begin(request.with_voice(Some(voice))),
            None => {
                let listener = port.subscribe_voices(self.events_tx.clone());
                debug!("[SPEECH] No voices yet, waiting ({:?})", listener);
                self.phase = Phase::Pending { request, listener };
            }
        }
    }

    /// Speak immediately with the first voice, or the host default when none
    /// are loaded.
    pub fn speak(&mut self, text: &str) {
        let Some(port) = self.port.clone() else {
            return;
        };

        self.cancel_current();

        let voice = port.voices().into_iter().next();
        self.begin(SpeechRequest::new(text, self.lang.as_str()).with_voice(voice));
    }

    /// Cancel whatever is pending or speaking
    pub fn stop(&mut self) {
        self.cancel_current();
    }

    /// Speaker button behaviour: stop when active, otherwise speak `text`
    pub fn toggle(&mut self, text: &str) {
        if self.is_active() {
            self.stop();
        } else {
            self.speak(text);
        }
    }

    /// Component teardown. Cancels an active request exactly once and
    /// forgets the watched inputs.
    pub fn unmount(&mut self) {
        self.cancel_current();
        self.watched = None;
    }

    /// Drain notifications from the host
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::VoicesChanged => {
                if !matches!(self.phase, Phase::Pending { .. }) {
                    return;
                }
                let Phase::Pending { request, listener } =
                    std::mem::replace(&mut self.phase, Phase::Idle)
                else {
                    return;
                };
                let Some(port) = self.port.clone() else {
                    return;
                };

                port.unsubscribe_voices(listener);
                let voice = port.voices().into_iter().next();
                debug!("[SPEECH] Voices ready, first: {:?}", voice.as_ref().map(|v| &v.name));
                self.begin(request.with_voice(voice));
            }
            SpeechEvent::Started(id) => {
                if let Phase::Speaking { utterance, started } = &mut self.phase {
                    if *utterance == id {
                        *started = true;
                    }
                }
            }
            SpeechEvent::Ended(id) => {
                if matches!(self.phase, Phase::Speaking { utterance, .. } if utterance == id) {
                    debug!("[SPEECH] {} finished", id);
                    self.phase = Phase::Idle;
                }
            }
        }
    }

    fn begin(&mut self, request: SpeechRequest) {
        let Some(port) = self.port.as_ref() else {
            return;
        };
        let utterance = port.speak(&request, self.events_tx.clone());
        debug!(
            "[SPEECH] {} started ({} chars, voice {:?})",
            utterance,
            request.text.len(),
            request.voice.as_ref().map(|v| &v.name)
        );
        self.phase = Phase::Speaking {
            utterance,
            started: false,
        };
    }

    fn cancel_current(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {}
            Phase::Pending { listener, .. } => {
                if let Some(port) = &self.port {
                    port.unsubscribe_voices(listener);
                }
                debug!("[SPEECH] Dropped pending request");
            }
            Phase::Speaking { utterance, .. } => {
                if let Some(port) = &self.port {
                    port.cancel();
                }
                debug!("[SPEECH] Cancelled {}", utterance);
            }
        }
    }
}

impl Drop for SpeechPlayback {
    fn drop(&mut self) {
        self.cancel_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::memory::{MemorySpeech, SpeechCall};
    use crate::speech::port::Voice;
    use std::sync::Arc;

    fn english() -> Voice {
        Voice::new("en-us", "English (America)", "en-US")
    }

    fn playback(port: &Arc<MemorySpeech>) -> SpeechPlayback {
        SpeechPlayback::new(Some(port.clone() as SharedSpeech), "en-US")
    }

    fn reply(content: &str) -> ChatMessage {
        ChatMessage::assistant(content)
    }

    #[test]
    fn test_should_speak_predicate() {
        let msg = reply("hi");
        assert!(PlaybackInputs::new(&msg, true, false).should_speak());
        assert!(!PlaybackInputs::new(&msg, false, false).should_speak());
        assert!(!PlaybackInputs::new(&msg, true, true).should_speak());
        assert!(!PlaybackInputs::new(&ChatMessage::user("hi"), true, false).should_speak());
    }

    #[test]
    fn test_automatic_speaks_with_first_voice() {
        let port = Arc::new(MemorySpeech::with_voices(vec![
            english(),
            Voice::new("de", "German", "de-DE"),
        ]));
        let mut playback = playback(&port);

        let msg = reply("Hello there");
        playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Automatic);

        assert_eq!(playback.state(), PlaybackState::Speaking);
        let requests = port.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "Hello there");
        assert_eq!(requests[0].lang, "en-US");
        assert_eq!(requests[0].voice, Some(english()));
    }

    #[test]
    fn test_unchanged_inputs_do_not_restart() {
        let port = Arc::new(MemorySpeech::with_voices(vec![english()]));
        let mut playback = playback(&port);
        let msg = reply("once");

        for _ in 0..5 {
            playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Automatic);
        }

        assert_eq!(port.requests().len(), 1);
        assert_eq!(port.cancel_count(), 0);
    }

    #[test]
    fn test_loading_message_is_not_spoken() {
        let port = Arc::new(MemorySpeech::with_voices(vec![english()]));
        let mut playback = playback(&port);
        let msg = reply("partial");

        playback.reconcile(PlaybackInputs::new(&msg, true, true), SpeechPolicy::Automatic);
        assert_eq!(playback.state(), PlaybackState::Idle);
        assert!(port.requests().is_empty());

        playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Automatic);
        assert_eq!(playback.state(), PlaybackState::Speaking);
    }

    #[test]
    fn test_pending_until_voices_arrive() {
        let port = Arc::new(MemorySpeech::new());
        let mut playback = playback(&port);
        let msg = reply("wait for it");

        playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Automatic);
        assert_eq!(playback.state(), PlaybackState::Pending);
        assert!(port.requests().is_empty());
        assert_eq!(port.listener_count(), 1);

        port.load_voices(vec![english()]);
        playback.poll_events();

        assert_eq!(playback.state(), PlaybackState::Speaking);
        assert_eq!(port.listener_count(), 0);
        let requests = port.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "wait for it");
        assert_eq!(requests[0].voice, Some(english()));
    }

    #[test]
    fn test_content_change_while_pending_replaces_request() {
        let port = Arc::new(MemorySpeech::new());
        let mut playback = playback(&port);
        let mut msg = reply("stale");

        playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Automatic);
        assert_eq!(playback.state(), PlaybackState::Pending);

        msg.content = "fresh".to_string();
        playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Automatic);
        assert_eq!(port.listener_count(), 1);

        port.load_voices(vec![english()]);
        playback.poll_events();

        let texts: Vec<String> = port.requests().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["fresh".to_string()]);
    }

    #[test]
    fn test_content_change_while_speaking_cancels_first() {
        let port = Arc::new(MemorySpeech::with_voices(vec![english()]));
        let mut playback = playback(&port);
        let mut msg = reply("first");

        playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Automatic);
        msg.content = "second".to_string();
        playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Automatic);

        let calls = port.calls();
        let kinds: Vec<&str> = calls
            .iter()
            .map(|c| match c {
                SpeechCall::Speak { .. } => "speak",
                SpeechCall::Cancel => "cancel",
                SpeechCall::Subscribe(_) => "subscribe",
                SpeechCall::Unsubscribe(_) => "unsubscribe",
            })
            .collect();
        assert_eq!(kinds, vec!["speak", "cancel", "speak"]);
    }

    #[test]
    fn test_new_message_cancels_previous() {
        let port = Arc::new(MemorySpeech::with_voices(vec![english()]));
        let mut playback = playback(&port);

        let first = reply("first reply");
        playback.reconcile(PlaybackInputs::new(&first, true, false), SpeechPolicy::Automatic);

        // A user message is appended: the same slot now watches a different message
        let question = ChatMessage::user("another question");
        playback.reconcile(PlaybackInputs::new(&question, true, false), SpeechPolicy::Automatic);

        assert_eq!(port.cancel_count(), 1);
        assert_eq!(port.requests().len(), 1);
        assert_eq!(playback.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_started_and_ended_events() {
        let port = Arc::new(MemorySpeech::with_voices(vec![english()]));
        let mut playback = playback(&port);
        playback.speak("hello");

        let id = playback.current_utterance().unwrap();
        assert!(!playback.is_audible());

        port.start(id);
        playback.poll_events();
        assert!(playback.is_audible());

        port.finish(id);
        playback.poll_events();
        assert_eq!(playback.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_stale_ended_event_is_ignored() {
        let port = Arc::new(MemorySpeech::with_voices(vec![english()]));
        let mut playback = playback(&port);

        playback.speak("one");
        let old = playback.current_utterance().unwrap();
        playback.speak("two");

        port.finish(old);
        playback.poll_events();
        assert_eq!(playback.state(), PlaybackState::Speaking);
    }

    #[test]
    fn test_toggle_speaks_then_cancels() {
        let port = Arc::new(MemorySpeech::new());
        let mut playback = playback(&port);

        playback.toggle("read me");
        assert_eq!(playback.state(), PlaybackState::Speaking);
        // Manual speech does not wait for voices
        assert_eq!(port.requests()[0].voice, None);

        playback.toggle("read me");
        assert_eq!(playback.state(), PlaybackState::Idle);
        assert_eq!(port.cancel_count(), 1);
    }

    #[test]
    fn test_manual_policy_never_autoplays() {
        let port = Arc::new(MemorySpeech::with_voices(vec![english()]));
        let mut playback = playback(&port);
        let msg = reply("quiet");

        playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Manual);
        assert!(port.requests().is_empty());
    }

    #[test]
    fn test_unmount_while_speaking_cancels_once() {
        let port = Arc::new(MemorySpeech::with_voices(vec![english()]));
        {
            let mut playback = playback(&port);
            playback.speak("goodbye");
            playback.unmount();
            // Drop after an explicit unmount must not cancel again
        }
        assert_eq!(port.cancel_count(), 1);
    }

    #[test]
    fn test_drop_while_speaking_cancels_once() {
        let port = Arc::new(MemorySpeech::with_voices(vec![english()]));
        {
            let mut playback = playback(&port);
            playback.speak("goodbye");
        }
        assert_eq!(port.cancel_count(), 1);
    }

    #[test]
    fn test_unmount_while_pending_removes_listener() {
        let port = Arc::new(MemorySpeech::new());
        let mut playback = playback(&port);
        playback.speak_when_ready("never spoken");
        assert_eq!(port.listener_count(), 1);

        playback.unmount();
        assert_eq!(port.listener_count(), 0);
        assert_eq!(port.cancel_count(), 0);

        port.load_voices(vec![english()]);
        playback.poll_events();
        assert!(port.requests().is_empty());
    }

    #[test]
    fn test_unsupported_host_is_silent() {
        let mut playback = SpeechPlayback::unsupported();
        let msg = reply("nobody hears this");

        playback.reconcile(PlaybackInputs::new(&msg, true, false), SpeechPolicy::Automatic);
        playback.toggle("still nothing");
        playback.unmount();

        assert!(!playback.is_supported());
        assert_eq!(playback.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_voices_changed_with_empty_list_uses_default_voice() {
        let port = Arc::new(MemorySpeech::new());
        let mut playback = playback(&port);
        playback.speak_when_ready("default voice");

        port.load_voices(Vec::new());
        playback.poll_events();

        assert_eq!(playback.state(), PlaybackState::Speaking);
        assert_eq!(port.requests()[0].voice, None);
    }
}
