//! Word-by-word progressive reveal of assistant replies
//!
//! [`WordReveal`] yields growing prefixes of a text, one space-separated
//! word at a time. [`reveal`] drives it on a timer and hands each prefix to a
//! [`RevealSink`]. Presentation only; the transcript is updated by the
//! caller once the reveal ends, whether it completed or was cancelled.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pacing of a progressive reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    /// Pause after each word
    pub word_delay: Duration,
    /// Pause after the last word, before the reply is committed
    pub trailing_pause: Duration,
}

impl RevealTiming {
    /// Query answers: 20ms per word
    pub const QUERY: RevealTiming = RevealTiming {
        word_delay: Duration::from_millis(20),
        trailing_pause: Duration::from_millis(100),
    };

    /// Upload confirmations: 15ms per word
    pub const UPLOAD: RevealTiming = RevealTiming {
        word_delay: Duration::from_millis(15),
        trailing_pause: Duration::from_millis(100),
    };

    /// No pauses at all
    pub fn instant() -> Self {
        Self {
            word_delay: Duration::ZERO,
            trailing_pause: Duration::ZERO,
        }
    }
}

/// Lazy sequence of growing prefixes of `text`
///
/// Words are split on single spaces, so runs of spaces and embedded
/// newlines are preserved exactly. The final prefix is the whole text; an
/// empty text yields nothing.
///
/// # Examples
///
/// ```
/// use governai::session::WordReveal;
///
/// let frames: Vec<&str> = WordReveal::new("three contracts expire").collect();
/// assert_eq!(frames, vec!["three", "three contracts", "three contracts expire"]);
/// ```
#[derive(Debug, Clone)]
pub struct WordReveal<'a> {
    text: &'a str,
    // Byte offset where the last yielded prefix ended
    cursor: Option<usize>,
}

impl<'a> WordReveal<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: None }
    }

    /// Start over from the first word
    pub fn restart(&mut self) {
        self.cursor = None;
    }
}

impl<'a> Iterator for WordReveal<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.text.len();
        let start = match self.cursor {
            None if len == 0 => return None,
            None => 0,
            Some(end) if end >= len => return None,
            Some(end) => end + 1,
        };

        let end = self.text[start..]
            .find(' ')
            .map(|offset| start + offset)
            .unwrap_or(len);
        self.cursor = Some(end);
        Some(&self.text[..end])
    }
}

/// Receiver of reveal frames
pub trait RevealSink: Send + Sync {
    /// Called with each successively longer prefix
    fn frame(&self, partial: &str);

    /// Called once when the reveal ends, completed or not
    fn finish(&self) {}

    /// Upload progress percentage while a file is in flight
    fn progress(&self, _percent: u8) {}
}

/// How a reveal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    Cancelled,
}

/// Reveal `text` word by word into `sink`
///
/// Stops early when `cancel` fires. The sink's `finish` is always called.
pub async fn reveal(
    text: &str,
    timing: RevealTiming,
    cancel: &CancellationToken,
    sink: &dyn RevealSink,
) -> RevealOutcome {
    let outcome = run_reveal(text, timing, cancel, sink).await;
    sink.finish();
    outcome
}

async fn run_reveal(
    text: &str,
    timing: RevealTiming,
    cancel: &CancellationToken,
    sink: &dyn RevealSink,
) -> RevealOutcome {
    for partial in WordReveal::new(text) {
        if cancel.is_cancelled() {
            return RevealOutcome::Cancelled;
        }
        sink.frame(partial);
        if !pause(timing.word_delay, cancel).await {
            return RevealOutcome::Cancelled;
        }
    }

    if pause(timing.trailing_pause, cancel).await {
        RevealOutcome::Completed
    } else {
        RevealOutcome::Cancelled
    }
}

/// Sleep for `delay`; false if cancelled first
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
