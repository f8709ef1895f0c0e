//! Flat host files: `M17Hosts.csv` from the distribution and the local
//! `M17Hosts.cfg` override.
//!
//! Both share one line format. `#` starts a comment line; data lines carry
//! `callsign,url,ip4addr,ip6addr,port` and may have trailing fields, which
//! are ignored. The override file is rewritten by [`render_override`] with
//! two empty trailing fields.

use std::{
    fmt, io,
    num::ParseIntError,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{core::store::RouteMap, types::Port};

/// Distribution-provided seed file.
pub const DIST_FILE: &str = "M17Hosts.csv";
/// Local override file, read at startup and rewritten on save.
pub const OVERRIDE_FILE: &str = "M17Hosts.cfg";
/// Directory used when the caller configures none.
pub const DEFAULT_DIR: &str = "/tmp/";

const FIELD_COUNT: usize = 5;

/// What a load does with a line it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Abort the file at the first bad line.
    #[default]
    FailFast,
    /// Log the bad line and continue with the next one.
    SkipBadLines,
}

/// Location and parse policy of the two host files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFiles {
    pub dir: PathBuf,
    pub dist_name: String,
    pub override_name: String,
    pub policy: LoadPolicy,
}

impl Default for HostFiles {
    fn default() -> Self {
        Self::in_dir(DEFAULT_DIR)
    }
}

impl HostFiles {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            dist_name: DIST_FILE.to_string(),
            override_name: OVERRIDE_FILE.to_string(),
            policy: LoadPolicy::FailFast,
        }
    }

    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn dist_path(&self) -> PathBuf {
        self.path_of(&self.dist_name)
    }

    pub fn override_path(&self) -> PathBuf {
        self.path_of(&self.override_name)
    }

    /// Load order for a full reload; later files win.
    pub fn load_order(&self) -> [PathBuf; 2] {
        [self.dist_path(), self.override_path()]
    }
}

/// One parsed data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLine<'a> {
    pub callsign: &'a str,
    pub url: &'a str,
    pub ip4addr: &'a str,
    pub ip6addr: &'a str,
    pub port: Port,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    MissingFields { found: usize },
    BadPort { value: String, source: ParseIntError },
}

#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: io::Error },
    Line { path: PathBuf, line_no: usize, error: LineError },
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::MissingFields { found } => {
                write!(f, "expected {FIELD_COUNT} fields, found {found}")
            }
            LineError::BadPort { value, source } => write!(f, "bad port {value:?}: {source}"),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            LoadError::Line { path, line_no, error } => {
                write!(f, "{}:{line_no}: {error}", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Line { error: LineError::BadPort { source, .. }, .. } => Some(source),
            LoadError::Line { .. } => None,
        }
    }
}

/// Counts from merging one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadStats {
    /// Data lines handed to the map, including ones it dropped.
    pub applied: usize,
    /// Lines skipped under [`LoadPolicy::SkipBadLines`].
    pub skipped: usize,
}

impl std::ops::AddAssign for LoadStats {
    fn add_assign(&mut self, rhs: Self) {
        self.applied += rhs.applied;
        self.skipped += rhs.skipped;
    }
}

/// Trims `line` and returns it unless it is blank or a comment.
pub fn content_of(line: &str) -> Option<&str> {
    let line = line.trim();
    (!line.is_empty() && !line.starts_with('#')).then_some(line)
}

/// Splits a data line into its fields.
///
/// Fields keep their surrounding whitespace; a callsign such as `"N7TAE "`
/// only carries its delimiter in that trailing space. The port alone is
/// trimmed before parsing.
pub fn parse_line(line: &str) -> Result<HostLine<'_>, LineError> {
    let mut fields = [""; FIELD_COUNT];
    let mut found = 0;
    for (slot, field) in fields.iter_mut().zip(line.split(',')) {
        *slot = field;
        found += 1;
    }
    if found < FIELD_COUNT {
        return Err(LineError::MissingFields { found });
    }

    let [callsign, url, ip4addr, ip6addr, port] = fields;
    let port = port.trim().parse::<Port>().map_err(|source| LineError::BadPort {
        value: port.to_string(),
        source,
    })?;

    Ok(HostLine {
        callsign,
        url,
        ip4addr,
        ip6addr,
        port,
    })
}

/// Applies every data line of `text` to `map` in order.
///
/// Under [`LoadPolicy::FailFast`] lines before the bad one stay applied.
pub fn merge_text(
    map: &mut RouteMap,
    path: &Path,
    text: &str,
    policy: LoadPolicy,
) -> Result<LoadStats, LoadError> {
    let mut stats = LoadStats::default();
    for (idx, raw) in text.lines().enumerate() {
        let Some(line) = content_of(raw) else {
            continue;
        };
        match parse_line(line) {
            Ok(host) => {
                map.update(host.callsign, host.url, host.ip4addr, host.ip6addr, host.port);
                stats.applied += 1;
            }
            Err(error) if policy == LoadPolicy::SkipBadLines => {
                warn!(path = %path.display(), line_no = idx + 1, %error, "skipping host line");
                stats.skipped += 1;
            }
            Err(error) => {
                return Err(LoadError::Line {
                    path: path.to_path_buf(),
                    line_no: idx + 1,
                    error,
                });
            }
        }
    }
    debug!(
        path = %path.display(),
        applied = stats.applied,
        skipped = stats.skipped,
        "merged host file"
    );
    Ok(stats)
}

/// Reads `path`, mapping a missing file to `None`.
pub fn read_optional(path: &Path) -> Result<Option<String>, LoadError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) => missing_as_none(path, err),
    }
}

pub(crate) fn missing_as_none(
    path: &Path,
    err: io::Error,
) -> Result<Option<String>, LoadError> {
    if err.kind() == io::ErrorKind::NotFound {
        debug!(path = %path.display(), "host file not present");
        Ok(None)
    } else {
        Err(LoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })
    }
}

/// Merges one file into `map`; a missing file contributes nothing.
pub fn merge_file(
    map: &mut RouteMap,
    path: &Path,
    policy: LoadPolicy,
) -> Result<LoadStats, LoadError> {
    match read_optional(path)? {
        Some(text) => merge_text(map, path, &text, policy),
        None => Ok(LoadStats::default()),
    }
}

/// Renders the override file body: one line per alias whose record has no
/// url. Returns the body and its line count.
pub fn render_override(map: &RouteMap) -> (String, usize) {
    let mut out = String::new();
    let mut written = 0;
    for (alias, host) in map.resolved().filter(|(_, host)| host.is_direct()) {
        out.push_str(&format!(
            "{alias},,{},{},{},,\n",
            host.ip4addr.as_deref().unwrap_or(""),
            host.ip6addr.as_deref().unwrap_or(""),
            host.port,
        ));
        written += 1;
    }
    (out, written)
}
