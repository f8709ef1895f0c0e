use std::{path::Path, sync::Arc};

use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tracing::debug;

use crate::{
    core::store::RouteMap,
    host::HostRecord,
    persist::{
        PersistError, SnapshotSink,
        hostfile::{merge_text, missing_as_none, render_override, HostFiles, LoadError, LoadStats},
    },
    types::{BaseIdentity, Callsign, Port},
};

use super::events::RouteEvent;

#[derive(Debug)]
pub enum RuntimeError {
    Load(LoadError),
    Persist(PersistError),
    ChannelClosed,
}

impl From<LoadError> for RuntimeError {
    fn from(value: LoadError) -> Self {
        Self::Load(value)
    }
}

impl From<PersistError> for RuntimeError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub event_capacity: usize,
    /// Updates between automatic snapshots; 0 disables them.
    pub snapshot_every_updates: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
            snapshot_every_updates: 0,
        }
    }
}

/// Async front end to a [`RouteMap`] owned by a single task.
pub struct RouteDirectoryHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<RouteEvent>,
}

impl Clone for RouteDirectoryHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

struct UpdateArgs {
    callsign: Callsign,
    url: String,
    ip4addr: String,
    ip6addr: String,
    port: Port,
}

enum Command {
    Find {
        callsign: Callsign,
        resp: oneshot::Sender<Option<Arc<HostRecord>>>,
    },
    FindBase {
        callsign: Callsign,
        resp: oneshot::Sender<Option<Arc<HostRecord>>>,
    },
    Update {
        args: UpdateArgs,
        resp: oneshot::Sender<Option<BaseIdentity>>,
    },
    ReadAll {
        resp: oneshot::Sender<Result<LoadStats, RuntimeError>>,
    },
    Save {
        resp: oneshot::Sender<Result<usize, RuntimeError>>,
    },
    Keys {
        resp: oneshot::Sender<Vec<Callsign>>,
    },
    Erase {
        callsign: Callsign,
        resp: oneshot::Sender<bool>,
    },
    Len {
        resp: oneshot::Sender<usize>,
    },
    Checkpoint {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

type SharedSink = Arc<Mutex<Box<dyn SnapshotSink>>>;

struct Actor {
    map: RouteMap,
    files: HostFiles,
    sink: Option<SharedSink>,
    events_tx: broadcast::Sender<RouteEvent>,
    config: RuntimeConfig,
    updates_since_snapshot: usize,
}

pub fn spawn_route_directory(
    map: RouteMap,
    files: HostFiles,
    sink: Option<Box<dyn SnapshotSink>>,
    config: RuntimeConfig,
) -> RouteDirectoryHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<RouteEvent>(config.event_capacity);

    let mut actor = Actor {
        map,
        files,
        sink: sink.map(|s| Arc::new(Mutex::new(s))),
        events_tx: events_tx.clone(),
        config,
        updates_since_snapshot: 0,
    };

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if actor.handle_command(cmd).await {
                break;
            }
        }
        debug!("route directory runtime stopped");
    });

    RouteDirectoryHandle { cmd_tx, events_tx }
}

impl RouteDirectoryHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<RouteEvent> {
        self.events_tx.subscribe()
    }

    pub async fn find(
        &self,
        callsign: impl Into<Callsign>,
    ) -> Result<Option<Arc<HostRecord>>, RuntimeError> {
        let callsign = callsign.into();
        self.request(|resp| Command::Find { callsign, resp }).await
    }

    pub async fn find_base(
        &self,
        callsign: impl Into<Callsign>,
    ) -> Result<Option<Arc<HostRecord>>, RuntimeError> {
        let callsign = callsign.into();
        self.request(|resp| Command::FindBase { callsign, resp }).await
    }

    pub async fn update(
        &self,
        callsign: impl Into<Callsign>,
        url: impl Into<String>,
        ip4addr: impl Into<String>,
        ip6addr: impl Into<String>,
        port: Port,
    ) -> Result<Option<BaseIdentity>, RuntimeError> {
        let args = UpdateArgs {
            callsign: callsign.into(),
            url: url.into(),
            ip4addr: ip4addr.into(),
            ip6addr: ip6addr.into(),
            port,
        };
        self.request(|resp| Command::Update { args, resp }).await
    }

    pub async fn read_all(&self) -> Result<LoadStats, RuntimeError> {
        self.request(|resp| Command::ReadAll { resp }).await?
    }

    pub async fn save(&self) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::Save { resp }).await?
    }

    pub async fn keys(&self) -> Result<Vec<Callsign>, RuntimeError> {
        self.request(|resp| Command::Keys { resp }).await
    }

    pub async fn erase(&self, callsign: impl Into<Callsign>) -> Result<bool, RuntimeError> {
        let callsign = callsign.into();
        self.request(|resp| Command::Erase { callsign, resp }).await
    }

    pub async fn len(&self) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::Len { resp }).await
    }

    pub async fn checkpoint(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Checkpoint { resp }).await?
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await?
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

impl Actor {
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Find { callsign, resp } => {
                let _ = resp.send(self.map.find(&callsign));
            }
            Command::FindBase { callsign, resp } => {
                let _ = resp.send(self.map.find_base(&callsign));
            }
            Command::Update { args, resp } => {
                let base = self.map.update(
                    &args.callsign,
                    &args.url,
                    &args.ip4addr,
                    &args.ip6addr,
                    args.port,
                );
                if let Some(base) = &base {
                    let _ = self.events_tx.send(RouteEvent::Updated {
                        callsign: args.callsign,
                        base: base.clone(),
                    });
                    self.updates_since_snapshot += 1;
                    self.maybe_auto_checkpoint().await;
                }
                let _ = resp.send(base);
            }
            Command::ReadAll { resp } => {
                let res = self.read_all().await;
                if res.is_ok() {
                    let _ = self.events_tx.send(RouteEvent::Reloaded {
                        aliases: self.map.len(),
                    });
                }
                let _ = resp.send(res);
            }
            Command::Save { resp } => {
                let (body, written) = render_override(&self.map);
                let res = tokio::fs::write(self.files.override_path(), body)
                    .await
                    .map(|()| written)
                    .map_err(|e| RuntimeError::Persist(PersistError::Io(e)));
                if res.is_ok() {
                    let _ = self.events_tx.send(RouteEvent::Saved { written });
                }
                let _ = resp.send(res);
            }
            Command::Keys { resp } => {
                let _ = resp.send(self.map.keys());
            }
            Command::Erase { callsign, resp } => {
                let erased = self.map.erase(&callsign);
                if erased {
                    let _ = self.events_tx.send(RouteEvent::Erased { callsign });
                }
                let _ = resp.send(erased);
            }
            Command::Len { resp } => {
                let _ = resp.send(self.map.len());
            }
            Command::Checkpoint { resp } => {
                let _ = resp.send(self.checkpoint().await);
            }
            Command::Shutdown { resp } => {
                let _ = resp.send(self.flush_sink().await);
                return true;
            }
        }

        false
    }

    async fn read_all(&mut self) -> Result<LoadStats, RuntimeError> {
        self.map.clear();
        let mut stats = LoadStats::default();
        for path in self.files.load_order() {
            if let Some(text) = read_optional(&path).await? {
                stats += merge_text(&mut self.map, &path, &text, self.files.policy)?;
            }
        }
        Ok(stats)
    }

    async fn checkpoint(&mut self) -> Result<(), RuntimeError> {
        let Some(sink) = self.sink.as_ref().map(Arc::clone) else {
            return Ok(());
        };

        let snapshot = self.map.export_snapshot();
        let aliases = snapshot.aliases.len();
        tokio::task::spawn_blocking(move || {
            let mut sink = sink.blocking_lock();
            sink.write_snapshot(&snapshot)
        })
        .await
        .map_err(|e| PersistError::Message(format!("join error: {e}")))??;

        self.updates_since_snapshot = 0;
        let _ = self.events_tx.send(RouteEvent::Checkpointed { aliases });
        Ok(())
    }

    async fn maybe_auto_checkpoint(&mut self) {
        let every = self.config.snapshot_every_updates;
        if every == 0 || self.updates_since_snapshot < every {
            return;
        }
        if let Err(err) = self.checkpoint().await {
            tracing::warn!(?err, "automatic snapshot failed");
        }
    }

    async fn flush_sink(&self) -> Result<(), RuntimeError> {
        let Some(sink) = self.sink.as_ref().map(Arc::clone) else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || {
            let mut sink = sink.blocking_lock();
            sink.flush()
        })
        .await
        .map_err(|e| PersistError::Message(format!("join error: {e}")))??;
        Ok(())
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, LoadError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(err) => missing_as_none(path, err),
    }
}
