//! Shared access to the bidding round.
//!
//! The [`Coordinator`] owns the one [`Model`] of the process. Readers share
//! it; a writer gets it exclusively through a [`WriteSection`], builds one
//! event from the current state and submits it. A submitted event is
//! validated, appended to the log and only then applied, all before the
//! write lock is released.
//!
//! Once an event has passed validation its commit runs on its own task.
//! Dropping the future of [`WriteSection::submit`] or [`Coordinator::execute`]
//! therefore never leaves an event logged but not applied.

use std::sync::Arc;

use chrono::Utc;
use event_store::{AppendOptions, EventStore, EventStoreExt, Version};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, RwLockReadGuard, broadcast};
use tracing::Instrument;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;
use crate::notify::{Committed, Notifier};
use crate::round::{Model, ModelEvent};

/// Owner of the model and the event log.
///
/// Share it with `Arc`; there is no global instance.
pub struct Coordinator<S: EventStore> {
    model: Arc<RwLock<Model>>,
    store: Arc<S>,
    notifier: Notifier,
}

impl<S: EventStore + 'static> Coordinator<S> {
    /// Rebuilds the model from every event in `store`.
    ///
    /// Fails if the log holds an event this build does not know or one that
    /// no longer validates. The process must not serve such a log.
    #[tracing::instrument(skip(store))]
    pub async fn load(store: S) -> Result<Self, DomainError> {
        let events = store.load_all().await?;
        let count = events.len();

        let model = Model::replay(events)?;

        metrics::counter!("events_replayed_total").increment(count as u64);
        tracing::info!(
            events = count,
            bidders = model.bidder_count(),
            phase = model.phase().as_attr(),
            "model replayed"
        );

        Ok(Self {
            model: Arc::new(RwLock::new(model)),
            store: Arc::new(store),
            notifier: Notifier::new(),
        })
    }

    /// Shared access. Many readers may hold this at once; writers wait.
    pub async fn read(&self) -> RwLockReadGuard<'_, Model> {
        self.model.read().await
    }

    /// Returns an owned copy of the current model.
    pub async fn snapshot(&self) -> Model {
        self.model.read().await.clone()
    }

    /// Exclusive access for submitting one event.
    pub async fn write(&self) -> WriteSection<S> {
        WriteSection {
            model: Arc::clone(&self.model).write_owned().await,
            store: Arc::clone(&self.store),
            notifier: self.notifier.clone(),
        }
    }

    /// Builds an event from the current model and submits it.
    ///
    /// Returns the committed event. Nothing is committed if `build` fails.
    pub async fn execute<F, E>(&self, build: F) -> Result<ModelEvent, E>
    where
        F: FnOnce(&Model) -> Result<ModelEvent, E>,
        E: From<DomainError>,
    {
        self.execute_with(build, |event, _| event.clone()).await
    }

    /// Like [`execute`](Self::execute), and reads `view` from the model right
    /// after the event was applied, before any other writer gets the lock.
    pub async fn execute_with<F, V, T, E>(&self, build: F, view: V) -> Result<T, E>
    where
        F: FnOnce(&Model) -> Result<ModelEvent, E>,
        V: FnOnce(&ModelEvent, &Model) -> T + Send + 'static,
        T: Send + 'static,
        E: From<DomainError>,
    {
        let section = self.write().await;
        let event = build(section.model())?;
        Ok(section.submit_with(event, view).await?)
    }

    /// Listens for committed events.
    pub fn subscribe(&self) -> broadcast::Receiver<Committed> {
        self.notifier.subscribe()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Exclusive access to the model for one submission.
///
/// The lock is held until the section is submitted, dropped or
/// [released](Self::release). Submitting consumes the section, so at most
/// one event goes in per section.
pub struct WriteSection<S: EventStore> {
    model: OwnedRwLockWriteGuard<Model>,
    store: Arc<S>,
    notifier: Notifier,
}

impl<S: EventStore + 'static> WriteSection<S> {
    /// The model to build the event from.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Validates, logs and applies `event`, then releases the lock.
    ///
    /// On any error the model is unchanged.
    pub async fn submit(self, event: ModelEvent) -> Result<Version, DomainError> {
        self.submit_with(event, |_, model| model.version()).await
    }

    /// Like [`submit`](Self::submit), returning `view` of the model the event
    /// produced.
    #[tracing::instrument(skip(self, event, view), fields(event_type = event.event_type()))]
    pub async fn submit_with<V, T>(self, event: ModelEvent, view: V) -> Result<T, DomainError>
    where
        V: FnOnce(&ModelEvent, &Model) -> T + Send + 'static,
        T: Send + 'static,
    {
        if let Err(e) = self.model.validate(&event) {
            metrics::counter!("events_rejected_total").increment(1);
            tracing::warn!(error = %e, "event rejected");
            return Err(e.into());
        }

        tokio::spawn(self.commit(event, view).in_current_span())
            .await
            .map_err(|e| DomainError::CommitAborted(e.to_string()))?
    }

    /// Releases the write lock.
    pub fn release(self) {}

    async fn commit<V, T>(mut self, event: ModelEvent, view: V) -> Result<T, DomainError>
    where
        V: FnOnce(&ModelEvent, &Model) -> T,
    {
        let current = self.model.version();
        let version = current.next();
        let at = Utc::now();
        let envelope = event.to_envelope(version, at)?;

        self.store
            .append_event(envelope, AppendOptions::expect_version(current))
            .await?;

        let event_type = event.event_type();
        let committed = event.clone();
        self.model.apply(event, at);
        self.model.set_version(version);

        metrics::counter!("events_committed_total", "event_type" => event_type).increment(1);
        tracing::debug!(%version, "event committed");

        self.notifier.notify(Committed {
            event_type,
            version,
        });

        Ok(view(&committed, &self.model))
    }
}
