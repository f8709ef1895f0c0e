//! Callsign aliases and the delimiter scan that derives base identities.

/// Full callsign as announced, including any module or suffix.
pub type Callsign = String;
/// Root callsign used to key host records.
pub type BaseIdentity = String;
/// UDP/TCP port carried in a host record.
pub type Port = u16;

/// Characters that separate a base callsign from its module or suffix.
pub const DELIMITERS: [char; 3] = [' ', '/', '.'];

/// Minimum length of a base identity.
pub const MIN_BASE_LEN: usize = 3;

/// Returns the base identity of `callsign` for insertion.
///
/// The callsign must contain a delimiter at index [`MIN_BASE_LEN`] or later;
/// anything else yields `None`.
pub fn split_base(callsign: &str) -> Option<&str> {
    let pos = callsign.find(DELIMITERS)?;
    (pos >= MIN_BASE_LEN).then(|| &callsign[..pos])
}

/// Returns the base identity of `callsign` for a structural lookup.
///
/// Unlike [`split_base`], a callsign without any delimiter is taken whole.
pub fn lookup_base(callsign: &str) -> Option<&str> {
    match callsign.find(DELIMITERS) {
        Some(pos) if pos < MIN_BASE_LEN => None,
        Some(pos) => Some(&callsign[..pos]),
        None => Some(callsign),
    }
}
