use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::{
    EventEnvelope, EventQuery, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

/// Event log backed by a JSON-lines file.
///
/// Every entry is one line holding a serialized [`EventEnvelope`]. The whole
/// log is read once on [`FileEventStore::open`] and kept in memory; appends
/// write the new lines and sync the file before the in-memory copy is
/// extended.
///
/// A failed append leaves the file as it was before the append. If the file
/// cannot be cut back, the store refuses every later append with
/// [`EventStoreError::Poisoned`].
#[derive(Clone)]
pub struct FileEventStore {
    path: PathBuf,
    inner: Arc<RwLock<FileLog>>,
}

struct FileLog {
    file: File,

    /// Length of the file up to the last complete entry.
    len: u64,

    events: Vec<EventEnvelope>,
    poisoned: bool,
}

impl FileLog {
    fn version(&self) -> Version {
        self.events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial())
    }

    /// Appends `buf` and syncs it, or restores the previous length.
    async fn write_batch(&mut self, buf: &[u8]) -> Result<()> {
        match self.write_and_sync(buf).await {
            Ok(()) => {
                self.len += buf.len() as u64;
                Ok(())
            }
            Err(e) => {
                match self.truncate(self.len).await {
                    Ok(()) => tracing::warn!(error = %e, "append failed, log restored"),
                    Err(rollback) => {
                        tracing::error!(
                            error = %e,
                            rollback_error = %rollback,
                            "append failed and log could not be restored"
                        );
                        self.poisoned = true;
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn write_and_sync(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.file.write_all(buf).await?;
        self.file.flush().await?;
        self.file.sync_data().await
    }

    async fn truncate(&mut self, len: u64) -> std::io::Result<()> {
        self.file.set_len(len).await?;
        self.file.sync_data().await
    }
}

impl FileEventStore {
    /// Opens the log at `path`, creating an empty file if none exists.
    ///
    /// Fails if any existing line cannot be decoded: a log that cannot be
    /// read completely must not be served from.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let events = parse_lines(&content)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let len = file.metadata().await?.len();

        tracing::info!(path = %path.display(), events = events.len(), "event log opened");

        Ok(Self {
            path,
            inner: Arc::new(RwLock::new(FileLog {
                file,
                len,
                events,
                poisoned: false,
            })),
        })
    }

    /// Returns the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.inner.read().await.events.len()
    }
}

fn parse_lines(content: &str) -> Result<Vec<EventEnvelope>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| EventStoreError::CorruptEntry {
                line: index + 1,
                source,
            })
        })
        .collect()
}

#[async_trait]
impl EventStore for FileEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        let mut log = Arc::clone(&self.inner).write_owned().await;
        if log.poisoned {
            return Err(EventStoreError::Poisoned);
        }

        validate_events_for_append(&events, log.version(), &options)?;

        let mut buf = Vec::new();
        for event in &events {
            serde_json::to_writer(&mut buf, event)?;
            buf.push(b'\n');
        }

        // Once writing starts it finishes even if the caller goes away.
        tokio::spawn(async move {
            log.write_batch(&buf).await?;
            metrics::counter!("event_log_bytes_written_total").increment(buf.len() as u64);

            log.events.extend(events);
            Ok::<_, EventStoreError>(log.version())
        })
        .await
        .map_err(|e| EventStoreError::Io(std::io::Error::other(e)))?
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.inner.read().await.events.clone();
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let log = self.inner.read().await;
        Ok(query.select(log.events.iter()))
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let log = self.inner.read().await;
        Ok(log
            .events
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }

    async fn current_version(&self) -> Result<Version> {
        Ok(self.inner.read().await.version())
    }
}
