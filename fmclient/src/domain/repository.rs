//! Layout-scoped repository with an identity map and optimistic concurrency.
//!
//! Every public operation issues at most one command. Entities found or
//! inserted through a repository are owned by its [`IdentityMap`] and
//! addressed through [`EntityHandle`]s; finding the same record twice yields
//! the same handle.
//!
//! Mutations send the tracked `-modid` so the server rejects writes based on
//! stale reads. The rejection surfaces as a protocol error from the
//! [`ResultSetClient`]; passing `force = true` omits the token.
//!
//! A repository is not synchronised. Use one instance per logical session.

use std::sync::Arc;

use item_collection::ItemCollection;
use thiserror::Error;
use tracing::debug;

use super::command::{Action, Command, CommandError, Parameters, quote_string};
use super::error::ErrorKind;
use super::identity::Identity;
use super::identity_map::{EntityHandle, IdentityMap, ManagedEntry};
use super::ports::{Extraction, Hydration, MappingError, ResultSetClient, ResultSetError};
use super::query::{FindQuery, Range, Search, Sort};
use super::record::{Record, RecordId};

/// Errors raised by [`Repository`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The command could not be built.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// Execution or decoding failed.
    #[error(transparent)]
    ResultSet(#[from] ResultSetError),
    /// The handle does not refer to an entity managed by this repository.
    #[error("entity {handle:?} is not managed by this repository")]
    UnmanagedEntity {
        /// Offending handle.
        handle: EntityHandle,
    },
    /// More sort fields than the server accepts.
    #[error("at most {limit} sort parameters are allowed, got {sort}")]
    TooManySortParameters {
        /// Maximum accepted.
        limit: usize,
        /// Rendered sort specification.
        sort: String,
    },
    /// The server echoed a record that an entity of this repository already
    /// represents.
    #[error("record {record_id} is already managed as {handle:?}")]
    AlreadyManaged {
        /// Echoed record id.
        record_id: RecordId,
        /// Handle of the entity already tracking the record.
        handle: EntityHandle,
    },
    /// The server returned no record where one was required.
    #[error("result set is empty")]
    EmptyResultSet,
    /// Hydration or extraction failed.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl RepositoryError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Command(error) => error.kind(),
            Self::ResultSet(error) => error.kind(),
            Self::UnmanagedEntity { .. }
            | Self::AlreadyManaged { .. }
            | Self::TooManySortParameters { .. } => ErrorKind::Domain,
            Self::EmptyResultSet => ErrorKind::InvalidResult,
            Self::Mapping(error) => error.kind(),
        }
    }
}

/// Repository over one layout.
pub struct Repository<E, C: ?Sized> {
    client: Arc<C>,
    hydration: Arc<dyn Hydration<E>>,
    extraction: Arc<dyn Extraction<E>>,
    layout: String,
    identity: Option<Identity>,
    entities: IdentityMap<E>,
}

impl<E, C> Repository<E, C>
where
    C: ResultSetClient + ?Sized,
{
    /// Create a repository for `layout`.
    #[must_use]
    pub fn new(
        client: Arc<C>,
        hydration: Arc<dyn Hydration<E>>,
        extraction: Arc<dyn Extraction<E>>,
        layout: impl Into<String>,
    ) -> Self {
        Self {
            client,
            hydration,
            extraction,
            layout: layout.into(),
            identity: None,
            entities: IdentityMap::new(),
        }
    }

    /// Act as `identity` for every subsequent command.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Layout the repository targets.
    #[must_use]
    pub const fn layout(&self) -> &str {
        self.layout.as_str()
    }

    /// Borrow a managed entity.
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&E> {
        self.entities.get(handle)
    }

    /// Mutably borrow a managed entity, e.g. before calling [`Self::update`].
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut E> {
        self.entities.get_mut(handle)
    }

    /// Record id and modification token tracked for a managed entity.
    #[must_use]
    pub fn managed_entry(&self, handle: EntityHandle) -> Option<ManagedEntry> {
        self.entities.entry(handle)
    }

    /// Escape search operators in `value`.
    #[must_use]
    pub fn quote_string(&self, value: &str) -> String {
        quote_string(value)
    }

    /// Find the entity for a record id.
    ///
    /// # Errors
    ///
    /// Propagates command, result-set, and hydration failures.
    pub async fn find(&mut self, record_id: RecordId) -> Result<Option<EntityHandle>, RepositoryError> {
        let mut parameters = Parameters::new();
        parameters.insert("-recid", record_id.get());
        self.find_one(parameters, Action::Find).await
    }

    /// Find the first entity matching `search`.
    ///
    /// # Errors
    ///
    /// Propagates command, result-set, and hydration failures.
    pub async fn find_one_by(&mut self, search: &Search) -> Result<Option<EntityHandle>, RepositoryError> {
        self.find_one(search.to_parameters(), Action::Find).await
    }

    /// Find the first entity matching a compound query.
    ///
    /// # Errors
    ///
    /// Propagates command, result-set, and hydration failures.
    pub async fn find_one_by_query(
        &mut self,
        query: &FindQuery,
    ) -> Result<Option<EntityHandle>, RepositoryError> {
        self.find_one(query.to_parameters(), Action::FindQuery).await
    }

    /// Find every entity on the layout.
    ///
    /// # Errors
    ///
    /// Fails with [`RepositoryError::TooManySortParameters`] before any
    /// request when `sort` is too long; otherwise propagates command,
    /// result-set, and hydration failures.
    pub async fn find_all(
        &mut self,
        sort: &Sort,
        range: Range,
    ) -> Result<ItemCollection<EntityHandle>, RepositoryError> {
        self.find_many(Parameters::new(), sort, range, Action::FindAll)
            .await
    }

    /// Find entities matching `search`.
    ///
    /// # Errors
    ///
    /// See [`Self::find_all`].
    pub async fn find_by(
        &mut self,
        search: &Search,
        sort: &Sort,
        range: Range,
    ) -> Result<ItemCollection<EntityHandle>, RepositoryError> {
        self.find_many(search.to_parameters(), sort, range, Action::Find)
            .await
    }

    /// Find entities matching a compound query.
    ///
    /// # Errors
    ///
    /// See [`Self::find_all`].
    pub async fn find_by_query(
        &mut self,
        query: &FindQuery,
        sort: &Sort,
        range: Range,
    ) -> Result<ItemCollection<EntityHandle>, RepositoryError> {
        self.find_many(query.to_parameters(), sort, range, Action::FindQuery)
            .await
    }

    /// Create a record from `entity` and start managing it.
    ///
    /// Server-assigned fields are hydrated into the entity before it is
    /// registered. Nothing is registered when any step fails.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::EmptyResultSet`] when the server echoes no
    /// record, [`RepositoryError::AlreadyManaged`] when the echoed record id
    /// is already in the identity map, and propagates command, result-set,
    /// and mapping failures.
    pub async fn insert(&mut self, mut entity: E) -> Result<EntityHandle, RepositoryError> {
        let parameters = self.extraction.extract(&entity)?;
        let record = self.execute_single(parameters, Action::New).await?;
        if let Some(handle) = self.entities.handle_for(record.record_id()) {
            return Err(RepositoryError::AlreadyManaged {
                record_id: record.record_id(),
                handle,
            });
        }
        self.hydration.hydrate_existing_entity(&record, &mut entity)?;

        let handle = self.entities.register(entity, entry_of(&record));
        debug!(
            handle = handle.get(),
            record_id = %record.record_id(),
            mod_id = %record.mod_id(),
            "registered inserted entity"
        );
        Ok(handle)
    }

    /// Write a managed entity back to its record.
    ///
    /// Unless `force` is set the tracked modification token is sent, so the
    /// server rejects the write when the record changed since it was read.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UnmanagedEntity`] for unknown handles,
    /// [`RepositoryError::EmptyResultSet`] when no record is echoed, and
    /// propagates command, result-set, and mapping failures.
    pub async fn update(&mut self, handle: EntityHandle, force: bool) -> Result<(), RepositoryError> {
        let entry = self.tracked(handle)?;
        let current = self
            .entities
            .get(handle)
            .ok_or(RepositoryError::UnmanagedEntity { handle })?;
        let mut parameters = self.extraction.extract(current)?;
        parameters.extend(concurrency_parameters(entry, force));

        let record = self.execute_single(parameters, Action::Edit).await?;
        let target = self
            .entities
            .get_mut(handle)
            .ok_or(RepositoryError::UnmanagedEntity { handle })?;
        self.hydration.hydrate_existing_entity(&record, target)?;
        self.entities.refresh(handle, entry_of(&record));

        debug!(
            handle = handle.get(),
            record_id = %record.record_id(),
            mod_id = %record.mod_id(),
            force,
            "updated managed entity"
        );
        Ok(())
    }

    /// Delete the record behind a managed entity and stop managing it.
    ///
    /// The entity is handed back to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UnmanagedEntity`] for unknown handles and
    /// propagates command and result-set failures. The entity stays managed
    /// when the request fails.
    pub async fn delete(&mut self, handle: EntityHandle, force: bool) -> Result<E, RepositoryError> {
        let entry = self.tracked(handle)?;
        let command = Command::new(self.layout.as_str(), concurrency_parameters(entry, force))?
            .with_action(Action::Delete);
        self.execute(command).await?;

        debug!(
            handle = handle.get(),
            record_id = %entry.record_id,
            force,
            "deleted managed entity"
        );
        self.entities
            .remove(handle)
            .ok_or(RepositoryError::UnmanagedEntity { handle })
    }

    /// Return the managed entity for `record`, hydrating it when new.
    ///
    /// A record already in the identity map keeps its entity; only the
    /// tracked modification token is refreshed.
    ///
    /// # Errors
    ///
    /// Propagates hydration failures.
    pub fn create_entity(&mut self, record: &Record) -> Result<EntityHandle, RepositoryError> {
        let entry = entry_of(record);
        if let Some(handle) = self.entities.handle_for(record.record_id()) {
            debug!(
                handle = handle.get(),
                record_id = %entry.record_id,
                mod_id = %entry.mod_id,
                "identity map hit"
            );
            self.entities.refresh(handle, entry);
            return Ok(handle);
        }

        let entity = self.hydration.hydrate_new_entity(record)?;
        Ok(self.entities.register(entity, entry))
    }

    fn tracked(&self, handle: EntityHandle) -> Result<ManagedEntry, RepositoryError> {
        self.entities
            .entry(handle)
            .ok_or(RepositoryError::UnmanagedEntity { handle })
    }

    async fn find_one(
        &mut self,
        mut parameters: Parameters,
        action: Action,
    ) -> Result<Option<EntityHandle>, RepositoryError> {
        parameters.insert("-max", 1_u64);
        let command = Command::new(self.layout.as_str(), parameters)?.with_action(action);
        let records = self.execute(command).await?;

        records
            .into_first()
            .map(|record| self.create_entity(&record))
            .transpose()
    }

    async fn find_many(
        &mut self,
        mut parameters: Parameters,
        sort: &Sort,
        range: Range,
        action: Action,
    ) -> Result<ItemCollection<EntityHandle>, RepositoryError> {
        let sort_parameters =
            sort.to_parameters()
                .map_err(|error| RepositoryError::TooManySortParameters {
                    limit: error.limit,
                    sort: error.sort,
                })?;
        parameters.extend(sort_parameters);
        parameters.extend(range.to_parameters());

        let command = Command::new(self.layout.as_str(), parameters)?.with_action(action);
        let records = self.execute(command).await?;
        records.try_map(|record| self.create_entity(&record))
    }

    async fn execute_single(
        &self,
        parameters: Parameters,
        action: Action,
    ) -> Result<Record, RepositoryError> {
        let command = Command::new(self.layout.as_str(), parameters)?.with_action(action);
        self.execute(command)
            .await?
            .into_first()
            .ok_or(RepositoryError::EmptyResultSet)
    }

    async fn execute(&self, command: Command) -> Result<ItemCollection<Record>, RepositoryError> {
        let scoped = match &self.identity {
            Some(identity) => command.with_identity(identity.clone()),
            None => command,
        };
        Ok(self.client.execute(&scoped).await?)
    }
}

const fn entry_of(record: &Record) -> ManagedEntry {
    ManagedEntry {
        record_id: record.record_id(),
        mod_id: record.mod_id(),
    }
}

fn concurrency_parameters(entry: ManagedEntry, force: bool) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert("-recid", entry.record_id.get());
    if !force {
        parameters.insert("-modid", entry.mod_id.get());
    }
    parameters
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
