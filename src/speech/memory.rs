//! In-process speech port
//!
//! Records every call and lets the caller play the host's part: publish
//! voices, report utterances as started or ended. Used for headless runs and
//! for exercising the playback lifecycle deterministically.

use crate::speech::port::{
    ListenerId, SpeechEvent, SpeechPort, SpeechRequest, UtteranceId, Voice,
};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A call made against the port
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechCall {
    Speak {
        utterance: UtteranceId,
        request: SpeechRequest,
    },
    Cancel,
    Subscribe(ListenerId),
    Unsubscribe(ListenerId),
}

#[derive(Default)]
struct Inner {
    voices: Vec<Voice>,
    calls: Vec<SpeechCall>,
    listeners: Vec<(ListenerId, Sender<SpeechEvent>)>,
    utterances: HashMap<UtteranceId, Sender<SpeechEvent>>,
    next_id: u64,
}

#[derive(Default)]
pub struct MemorySpeech {
    inner: Mutex<Inner>,
}

impl MemorySpeech {
    /// A port whose voices have not loaded yet
    pub fn new() -> Self {
        Self::default()
    }

    /// A port with voices available from the start
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        let port = Self::default();
        port.inner.lock().voices = voices;
        port
    }

    /// Publish a voice list and notify (then drop) every listener
    pub fn load_voices(&self, voices: Vec<Voice>) {
        let listeners = {
            let mut inner = self.inner.lock();
            inner.voices = voices;
            std::mem::take(&mut inner.listeners)
        };
        for (_, notify) in listeners {
            let _ = notify.send(SpeechEvent::VoicesChanged);
        }
    }

    /// Report an utterance as audible
    pub fn start(&self, utterance: UtteranceId) {
        if let Some(notify) = self.inner.lock().utterances.get(&utterance) {
            let _ = notify.send(SpeechEvent::Started(utterance));
        }
    }

    /// Report an utterance as finished
    pub fn finish(&self, utterance: UtteranceId) {
        if let Some(notify) = self.inner.lock().utterances.remove(&utterance) {
            let _ = notify.send(SpeechEvent::Ended(utterance));
        }
    }

    pub fn calls(&self) -> Vec<SpeechCall> {
        self.inner.lock().calls.clone()
    }

    /// Every request passed to `speak`, in order
    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SpeechCall::Speak { request, .. } => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, SpeechCall::Cancel))
            .count()
    }

    /// Live voices-changed subscriptions
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn last_utterance(&self) -> Option<UtteranceId> {
        self.inner
            .lock()
            .calls
            .iter()
            .rev()
            .find_map(|call| match call {
                SpeechCall::Speak { utterance, .. } => Some(*utterance),
                _ => None,
            })
    }
}

impl SpeechPort for MemorySpeech {
    fn speak(&self, request: &SpeechRequest, notify: Sender<SpeechEvent>) -> UtteranceId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let utterance = UtteranceId(inner.next_id);
        inner.utterances.insert(utterance, notify);
        inner.calls.push(SpeechCall::Speak {
            utterance,
            request: request.clone(),
        });
        utterance
    }

    fn cancel(&self) {
        let mut inner = self.inner.lock();
        // Cancelled utterances never report back
        inner.utterances.clear();
        inner.calls.push(SpeechCall::Cancel);
    }

    fn voices(&self) -> Vec<Voice> {
        self.inner.lock().voices.clone()
    }

    fn subscribe_voices(&self, notify: Sender<SpeechEvent>) -> ListenerId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let listener = ListenerId(inner.next_id);
        inner.listeners.push((listener, notify));
        inner.calls.push(SpeechCall::Subscribe(listener));
        listener
    }

    fn unsubscribe_voices(&self, listener: ListenerId) {
        let mut inner = self.inner.lock();
        inner.listeners.retain(|(id, _)| *id != listener);
        inner.calls.push(SpeechCall::Unsubscribe(listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_listeners_are_one_shot() {
        let port = MemorySpeech::new();
        let (tx, rx) = unbounded();
        port.subscribe_voices(tx);

        port.load_voices(vec![Voice::new("en", "English", "en-US")]);
        port.load_voices(vec![]);

        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(port.listener_count(), 0);
    }

    #[test]
    fn test_finish_reports_once() {
        let port = MemorySpeech::new();
        let (tx, rx) = unbounded();
        let id = port.speak(&SpeechRequest::new("hi", "en-US"), tx);

        port.start(id);
        port.finish(id);
        port.finish(id);

        let events: Vec<SpeechEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![SpeechEvent::Started(id), SpeechEvent::Ended(id)]);
        assert_eq!(port.last_utterance(), Some(id));
    }
}
