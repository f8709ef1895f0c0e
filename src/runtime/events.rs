//! Runtime event stream payloads.

use crate::types::{BaseIdentity, Callsign};

/// Events emitted from the directory runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEvent {
    /// A record was installed for `base` via `callsign`.
    Updated {
        /// Callsign passed to the update.
        callsign: Callsign,
        /// Base identity now holding the new record.
        base: BaseIdentity,
    },
    /// An alias was removed.
    Erased {
        /// Removed callsign.
        callsign: Callsign,
    },
    /// The host files were reloaded from scratch.
    Reloaded {
        /// Alias count after the reload.
        aliases: usize,
    },
    /// The override file was rewritten.
    Saved {
        /// Lines written.
        written: usize,
    },
    /// A snapshot reached the snapshot sink.
    Checkpointed {
        /// Alias count captured.
        aliases: usize,
    },
}
