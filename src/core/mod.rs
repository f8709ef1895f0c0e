//! In-memory route maps and the locked directory around them.

/// Lock-guarded directory and its host-file protocol.
pub mod directory;
/// Unsynchronized alias and host maps.
pub mod store;
