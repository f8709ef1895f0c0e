//! Host reachability record.

use serde::{Deserialize, Serialize};

use crate::types::Port;

/// Sentinel used in host files for an absent address.
pub const NO_ADDRESS: &str = "none";

/// Immutable reachability data for one base identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostRecord {
    /// Redirect URL; set for entries reached by name rather than address.
    pub url: Option<String>,
    /// IPv4 address text.
    pub ip4addr: Option<String>,
    /// IPv6 address text.
    pub ip6addr: Option<String>,
    /// Port, where 0 is a literal value.
    pub port: Port,
}

impl HostRecord {
    /// Builds a record from raw field text, dropping empty fields and the
    /// `none` sentinel in address fields.
    pub fn from_fields(url: &str, ip4addr: &str, ip6addr: &str, port: Port) -> Self {
        Self {
            url: (!url.is_empty()).then(|| url.to_string()),
            ip4addr: address(ip4addr),
            ip6addr: address(ip6addr),
            port,
        }
    }

    /// True when the record has no redirect URL.
    pub fn is_direct(&self) -> bool {
        self.url.is_none()
    }
}

fn address(text: &str) -> Option<String> {
    if text.is_empty() || text == NO_ADDRESS {
        None
    } else {
        Some(text.to_string())
    }
}
