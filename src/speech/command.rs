//! Speech backend driving an external synthesizer process
//!
//! The default program is `espeak-ng`. Voices are enumerated on a background
//! thread, so the list is empty for the first frames and a `VoicesChanged`
//! notification follows once it is known. Each utterance runs as a child
//! process; cancelling kills it.

use crate::speech::port::{
    ListenerId, SpeechEvent, SpeechPort, SpeechRequest, UtteranceId, Voice,
};
use crate::speech::text::speakable_text;
use crate::{ChatterError, Result};
use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often a worker checks whether its child has exited
const POLL_INTERVAL: Duration = Duration::from_millis(25);

struct ActiveUtterance {
    utterance: UtteranceId,
    child: Child,
}

struct Shared {
    voices: RwLock<Vec<Voice>>,
    listeners: Mutex<Vec<(ListenerId, Sender<SpeechEvent>)>>,
    active: Mutex<Option<ActiveUtterance>>,
}

impl Shared {
    fn publish_voices(&self, voices: Vec<Voice>) {
        *self.voices.write() = voices;
        let listeners = std::mem::take(&mut *self.listeners.lock());
        for (_, notify) in listeners {
            let _ = notify.send(SpeechEvent::VoicesChanged);
        }
    }
}

/// `SpeechPort` backed by a command-line synthesizer
pub struct CommandSpeech {
    program: PathBuf,
    shared: Arc<Shared>,
    next_id: AtomicU64,
}

impl CommandSpeech {
    /// Detect the synthesizer on `PATH`. Returns `None` when it is missing.
    pub fn detect(program: &str, preferred_lang: &str) -> Option<Arc<Self>> {
        match find_program(program) {
            Some(path) => {
                info!("[SPEECH] Using synthesizer at {}", path.display());
                Some(Arc::new(Self::spawn(path, preferred_lang)))
            }
            None => {
                info!("[SPEECH] {} not found on PATH, speech disabled", program);
                None
            }
        }
    }

    /// Create the backend and start enumerating voices
    pub fn spawn(program: PathBuf, preferred_lang: &str) -> Self {
        let shared = Arc::new(Shared {
            voices: RwLock::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            active: Mutex::new(None),
        });

        let worker_shared = shared.clone();
        let worker_program = program.clone();
        let preferred = preferred_lang.to_string();
        thread::spawn(move || {
            let voices = match list_voices(&worker_program) {
                Ok(mut voices) => {
                    prefer_language(&mut voices, &preferred);
                    voices
                }
                Err(e) => {
                    warn!("[SPEECH] Could not list voices: {}", e);
                    Vec::new()
                }
            };
            info!("[SPEECH] {} voices available", voices.len());
            worker_shared.publish_voices(voices);
        });

        Self {
            program,
            shared,
            next_id: AtomicU64::new(1),
        }
    }

    fn kill_active(&self) {
        let active = self.shared.active.lock().take();
        if let Some(mut active) = active {
            if let Err(e) = active.child.kill() {
                debug!("[SPEECH] {} already exited: {}", active.utterance, e);
            }
            let _ = active.child.wait();
        }
    }
}

impl SpeechPort for CommandSpeech {
    fn speak(&self, request: &SpeechRequest, notify: Sender<SpeechEvent>) -> UtteranceId {
        let utterance = UtteranceId(self.next_id.fetch_add(1, Ordering::Relaxed));

        // Single output channel: a new utterance interrupts the previous one
        self.kill_active();

        let voice = request
            .voice
            .as_ref()
            .map(|v| v.id.clone())
            .unwrap_or_else(|| request.lang.to_lowercase());
        let text = speakable_text(&request.text);

        let child = Command::new(&self.program)
            .arg("-v")
            .arg(&voice)
            .arg("--")
            .arg(&text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!("[SPEECH] Failed to start {}: {}", self.program.display(), e);
                let _ = notify.send(SpeechEvent::Ended(utterance));
                return utterance;
            }
        };

        *self.shared.active.lock() = Some(ActiveUtterance { utterance, child });
        let _ = notify.send(SpeechEvent::Started(utterance));

        // Watch the child until it exits or is cancelled, then report the end
        let shared = self.shared.clone();
        thread::spawn(move || {
            loop {
                {
                    let mut active = shared.active.lock();
                    match active.as_mut() {
                        Some(current) if current.utterance == utterance => {
                            if !matches!(current.child.try_wait(), Ok(None)) {
                                *active = None;
                                break;
                            }
                        }
                        // Cancelled or replaced
                        _ => break,
                    }
                }
                thread::sleep(POLL_INTERVAL);
            }
            let _ = notify.send(SpeechEvent::Ended(utterance));
        });

        utterance
    }

    fn cancel(&self) {
        self.kill_active();
    }

    fn voices(&self) -> Vec<Voice> {
        self.shared.voices.read().clone()
    }

    fn subscribe_voices(&self, notify: Sender<SpeechEvent>) -> ListenerId {
        let listener = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.shared.listeners.lock().push((listener, notify));
        listener
    }

    fn unsubscribe_voices(&self, listener: ListenerId) {
        self.shared.listeners.lock().retain(|(id, _)| *id != listener);
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.kill_active();
    }
}

/// Resolve a program name against `PATH`. Only executable files count.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| is_executable(full))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn list_voices(program: &Path) -> Result<Vec<Voice>> {
    let output = Command::new(program)
        .arg("--voices")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(ChatterError::SpeechError(format!(
            "{} --voices exited with {}",
            program.display(),
            output.status
        )));
    }

    Ok(parse_voices(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse the table printed by `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US     (en 2)
/// ```
pub fn parse_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 4 {
                return None;
            }
            let lang = columns[1];
            Some(Voice::new(lang, columns[3].replace('_', " "), lang))
        })
        .collect()
}

/// Move voices matching `lang` (case-insensitive, by primary subtag as a
/// fallback) to the front. Relative order is otherwise kept.
fn prefer_language(voices: &mut [Voice], lang: &str) {
    let lang = lang.to_lowercase();
    let primary = lang.split('-').next().unwrap_or_default().to_string();

    let rank = |voice: &Voice| {
        let voice_lang = voice.lang.to_lowercase();
        if voice_lang == lang {
            0
        } else if voice_lang.split('-').next() == Some(primary.as_str()) {
            1
        } else {
            2
        }
    };
    voices.sort_by_key(rank);
    if let Some(first) = voices.first_mut() {
        first.is_default = true;
    }
}
