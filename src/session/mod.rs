//! Copilot conversation session
//!
//! Transcript, usage gate, progressive reveal and data change events.

pub mod controller;
pub mod events;
pub mod gate;
pub mod message;
pub mod streaming;

pub use controller::{ActionKind, CopilotSession, SessionState, SubmitOutcome};
pub use events::{DataEvent, EventBus};
pub use gate::{UsageGate, UsageSnapshot};
pub use message::{upload_summary, AttachedFile, Message, Role};
pub use streaming::{reveal, RevealOutcome, RevealSink, RevealTiming, WordReveal};
