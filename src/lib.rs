//! Callsign-to-host directory for M17 reflectors and gateways.
//!
//! A directory maps every full callsign it has seen (`"M17-USA A"`,
//! `"N7TAE/B"`) to a base identity (`"M17-USA"`, `"N7TAE"`) and each base
//! identity to one [`host::HostRecord`]. Records are immutable; an update
//! installs a new one.
//!
//! # Examples
//!
//! Synchronous use with [`core::directory::RouteDirectory`]:
//! ```
//! use m17routes::{core::directory::RouteDirectory, persist::hostfile::HostFiles};
//!
//! let dir = RouteDirectory::new(HostFiles::in_dir("/tmp/m17routes-doc"));
//! dir.update("M17-USA A", "", "192.0.2.10", "none", 17000);
//!
//! let host = dir.find("M17-USA A").expect("registered");
//! assert_eq!(host.ip4addr.as_deref(), Some("192.0.2.10"));
//! assert_eq!(host.ip6addr, None);
//! assert!(dir.find_base("M17-USA C").is_some());
//! ```
//!
//! Async use with the runtime handle and a SQLite snapshot store:
//! ```no_run
//! use m17routes::{
//!     core::store::RouteMap,
//!     persist::{hostfile::HostFiles, sqlite::SqliteSnapshotStore},
//!     runtime::handle::{spawn_route_directory, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteSnapshotStore::open("routes.db").expect("open sqlite");
//! let map = store.load_map().unwrap_or_else(|_| RouteMap::new());
//! let handle = spawn_route_directory(
//!     map,
//!     HostFiles::in_dir("/etc/m17"),
//!     Some(Box::new(store)),
//!     RuntimeConfig::default(),
//! );
//! handle.read_all().await.expect("load host files");
//! let _host = handle.find("M17-USA A").await.expect("find");
//! handle.checkpoint().await.expect("checkpoint");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// In-memory maps and the locked directory.
pub mod core;
/// Host reachability record.
pub mod host;
/// Host files and snapshot persistence.
pub mod persist;
/// Single-owner runtime handle and events.
pub mod runtime;
/// Callsign aliases and delimiter scanning.
pub mod types;
