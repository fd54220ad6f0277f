//! Irreversible erasure of user data for Lighthouse.
//!
//! A scrub runs in two phases:
//! 1. [`ScrubProtocol::commit_memorial`] durably writes the memorial record
//!    and a `MemorialCommitted` marker under the one key erasure never touches.
//! 2. [`ScrubProtocol::hard_delete`] erases every other key, the session
//!    store, and any registered [`Erasable`] secondary stores.
//!
//! The phase marker lets [`ScrubProtocol::resume`] settle a scrub that was
//! interrupted between or during the phases.

pub mod erasable;
pub mod error;
pub mod protocol;
pub mod state;

pub use erasable::Erasable;
pub use error::{ScrubError, ScrubResult};
pub use protocol::{ErasureReport, MemorialOutcome, ResumeOutcome, ScrubOutcome, ScrubProtocol};
pub use state::{ScrubPhase, ScrubState};
