//! Entities: in-memory objects bound to one stored document.
//!
//! An [`Entity`] holds the values of the fields its [`Schema`] declares,
//! remembers which scalar fields were assigned since the last commit, and
//! relies on [`Tracked`] containers to report mutations of list and map
//! fields. [`Entity::commit`] reconciles both into a single store write:
//!
//! - a targeted `$set` of the changed keys when there is anything to write,
//! - a full-document upsert of [`Entity::export`] for an entity the store has
//!   never seen,
//! - nothing at all otherwise.
//!
//! # Example
//!
//! ```ignore
//! let users = store.entities::<User>();
//!
//! let mut user = users.create();
//! user.set("name", "alice");
//! user.commit(&users).await?;          // full-document upsert
//!
//! user.list_mut("tags")?.push("admin".into());
//! user.commit(&users).await?;          // { $set: { tags: [...] } }
//! ```

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::{BTreeSet, HashMap, hash_map::Entry},
    fmt,
    marker::PhantomData,
};
use tracing::{Instrument, Level, event, info_span};

use crate::{
    backend::{RemoveOutcome, RepositoryAdapter, Update},
    collection::EntityCollection,
    error::{DocMapError, DocMapResult},
    identity,
    schema::{IDENTITY_FIELD, Schema},
    tracked::{Tracked, TrackedList, TrackedMap},
    transaction::{CollectionHandle, Transaction},
};

/// The value currently held by a declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A plain value; changes are recorded in the entity's changed set.
    Scalar(Bson),
    /// A sequence carrying its own dirty flag.
    List(TrackedList),
    /// A mapping carrying its own dirty flag.
    Map(TrackedMap),
}

impl FieldValue {
    fn loaded(value: Bson) -> Self {
        match value {
            Bson::Array(items) => FieldValue::List(Tracked::clean(items)),
            Bson::Document(document) => FieldValue::Map(Tracked::clean(document)),
            scalar => FieldValue::Scalar(scalar),
        }
    }

    /// Converts the held value into its stored form.
    pub fn to_bson(&self) -> Bson {
        match self {
            FieldValue::Scalar(value) => value.clone(),
            FieldValue::List(list) => Bson::Array(list.get_ref().clone()),
            FieldValue::Map(map) => Bson::Document(map.get_ref().clone()),
        }
    }

    /// Returns `true` for list and map values.
    pub fn is_container(&self) -> bool {
        !matches!(self, FieldValue::Scalar(_))
    }

    /// Returns `true` for a container mutated since it was last marked clean.
    pub fn is_dirty(&self) -> bool {
        match self {
            FieldValue::Scalar(_) => false,
            FieldValue::List(list) => list.is_dirty(),
            FieldValue::Map(map) => map.is_dirty(),
        }
    }

    fn mark_clean(&mut self) {
        match self {
            FieldValue::Scalar(_) => {}
            FieldValue::List(list) => list.mark_clean(),
            FieldValue::Map(map) => map.mark_clean(),
        }
    }
}

#[derive(Clone, Copy)]
enum ContainerKind {
    List,
    Map,
}

impl ContainerKind {
    fn name(self) -> &'static str {
        match self {
            ContainerKind::List => "list",
            ContainerKind::Map => "map",
        }
    }

    fn empty(self) -> Bson {
        match self {
            ContainerKind::List => Bson::Array(Vec::new()),
            ContainerKind::Map => Bson::Document(Document::new()),
        }
    }

    fn matches(self, value: &Bson) -> bool {
        matches!(
            (self, value),
            (ContainerKind::List, Bson::Array(_)) | (ContainerKind::Map, Bson::Document(_))
        )
    }
}

/// Where to load an entity from.
///
/// Empty ids, documents and selectors count as absent. A lookup with nothing
/// in it opens a fresh entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookup {
    id: Option<String>,
    document: Option<Document>,
    selector: Option<Document>,
}

impl Lookup {
    /// Looks up the document with the given id.
    pub fn id(id: impl Into<String>) -> Self {
        Self::default().with_id(id)
    }

    /// Uses an already fetched document.
    pub fn document(document: Document) -> Self {
        Self::default().with_document(document)
    }

    /// Looks up the first document matching a selector.
    pub fn selector(selector: Document) -> Self {
        Self::default().with_selector(selector)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into()).filter(|id| !id.is_empty());
        self
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document).filter(|d| !d.is_empty());
        self
    }

    pub fn with_selector(mut self, selector: Document) -> Self {
        self.selector = Some(selector).filter(|s| !s.is_empty());
        self
    }

    /// Returns `true` if the lookup names nothing to load.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.document.is_none() && self.selector.is_none()
    }
}

/// A set of field names to force-persist on commit.
///
/// A single name converts into a one-element set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(BTreeSet<String>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for Fields {
    fn from(name: &str) -> Self {
        Self(BTreeSet::from([name.to_string()]))
    }
}

impl From<String> for Fields {
    fn from(name: String) -> Self {
        Self(BTreeSet::from([name]))
    }
}

impl<T: Into<String>> From<Vec<T>> for Fields {
    fn from(names: Vec<T>) -> Self {
        names.into_iter().collect()
    }
}

impl<T: Into<String>, const N: usize> From<[T; N]> for Fields {
    fn from(names: [T; N]) -> Self {
        names.into_iter().collect()
    }
}

impl<T: Into<String>> FromIterator<T> for Fields {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Options for [`Entity::commit_with`].
#[derive(Default)]
pub struct CommitOptions<'a> {
    fields: Option<Fields>,
    transaction: Option<&'a dyn Transaction>,
}

impl<'a> CommitOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists exactly these fields, whether or not they are tracked as changed.
    pub fn fields(mut self, fields: impl Into<Fields>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Routes the write through a collection handle obtained from `transaction`.
    pub fn transaction(mut self, transaction: &'a dyn Transaction) -> Self {
        self.transaction = Some(transaction);
        self
    }
}

/// The store write a commit would issue.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitPlan {
    /// Targeted `$set` upsert of `document`; `flushed` names the container
    /// fields included in it.
    Set { document: Document, flushed: Vec<String> },
    /// Full-document upsert.
    Replace { document: Document },
    /// No store interaction.
    Noop,
}

/// An in-memory object bound to one logical document of type `S`.
pub struct Entity<S: Schema> {
    id: String,
    /// Value stored under the identity key; kept verbatim for loaded documents.
    key: Bson,
    exists: bool,
    values: HashMap<String, FieldValue>,
    extra: HashMap<String, Bson>,
    changed: BTreeSet<String>,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> Entity<S> {
    /// Creates a fresh entity with a newly generated id, not yet present in the store.
    ///
    /// Declared fields are unset and read as their defaults.
    pub fn new() -> Self {
        Self::blank(identity::generate(), false)
    }

    pub(crate) fn blank(id: String, exists: bool) -> Self {
        Self {
            key: identity::to_bson(&id),
            id,
            exists,
            values: HashMap::new(),
            extra: HashMap::new(),
            changed: BTreeSet::new(),
            _schema: PhantomData,
        }
    }

    /// Opens an entity as described by `lookup`.
    ///
    /// An empty lookup yields a fresh entity. Otherwise the entity is marked
    /// as existing and loaded; if nothing matches, `Ok(None)` is returned and
    /// no entity is produced.
    ///
    /// # Errors
    ///
    /// Returns [`DocMapError::ConflictingArguments`] if the lookup carries both a
    /// document and a selector, and propagates adapter failures.
    pub async fn open<A: RepositoryAdapter>(
        collection: &EntityCollection<'_, A, S>,
        lookup: Lookup,
    ) -> DocMapResult<Option<Self>> {
        if lookup.is_empty() {
            return Ok(Some(Self::new()));
        }

        let Lookup { id, document, selector } = lookup;
        let mut entity = Self::blank(
            id.as_deref()
                .map(identity::normalize)
                .unwrap_or_default(),
            true,
        );

        match entity.load(collection, document, selector).await {
            Ok(()) => Ok(Some(entity)),
            Err(err) if err.is_not_found() => {
                event!(Level::DEBUG, error = %err, "lookup matched nothing, no entity produced");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Populates this entity from a stored document.
    ///
    /// With neither `document` nor `selector`, the document is fetched by this
    /// entity's id. Keys present in the document overwrite held values;
    /// fields absent from it are left untouched. Loaded containers start clean
    /// and loaded scalars are not considered changed.
    ///
    /// # Errors
    ///
    /// - [`DocMapError::ConflictingArguments`] if both `document` and `selector` are given
    /// - [`DocMapError::NotFound`] if no document matches
    /// - [`DocMapError::InvalidDocument`] if the document has no identity key, or an empty one
    /// - [`DocMapError::IdentityMismatch`] if the document belongs to another entity
    pub async fn load<A: RepositoryAdapter>(
        &mut self,
        collection: &EntityCollection<'_, A, S>,
        document: Option<Document>,
        selector: Option<Document>,
    ) -> DocMapResult<()> {
        let span = info_span!("docmap.load", collection = %collection.name(), id = %self.id);

        self.load_inner(collection, document, selector)
            .instrument(span)
            .await
    }

    async fn load_inner<A: RepositoryAdapter>(
        &mut self,
        collection: &EntityCollection<'_, A, S>,
        document: Option<Document>,
        selector: Option<Document>,
    ) -> DocMapResult<()> {
        let document = document.filter(|d| !d.is_empty());
        let selector = selector.filter(|s| !s.is_empty());

        let mut document = match (document, selector) {
            (Some(_), Some(_)) => {
                return Err(DocMapError::ConflictingArguments(
                    "a document and a selector were both supplied".to_string(),
                ));
            }
            (Some(document), None) => document,
            (None, None) if self.id.is_empty() => {
                return Err(DocMapError::InvalidDocument(
                    "nothing to load: no document, selector or id".to_string(),
                ));
            }
            (None, selector) => {
                let selector = selector.unwrap_or_else(|| identity::key_selector(self.key.clone()));
                event!(Level::TRACE, %selector, "fetching document");

                let found = collection.find_document(&selector).await?;
                found.ok_or_else(|| DocMapError::NotFound {
                    collection: collection.name().to_string(),
                    selector,
                })?
            }
        };

        let key = document
            .remove(IDENTITY_FIELD)
            .ok_or_else(|| {
                DocMapError::InvalidDocument(format!("document has no {IDENTITY_FIELD} key"))
            })?;
        let found = identity::from_bson(&key);
        if matches!(key, Bson::Null) || found.is_empty() {
            return Err(DocMapError::InvalidDocument(format!(
                "document has an empty {IDENTITY_FIELD}"
            )));
        }
        if !self.id.is_empty() && self.key != key {
            return Err(DocMapError::IdentityMismatch {
                expected: self.id.clone(),
                found,
            });
        }
        self.id = found;
        self.key = key;

        event!(Level::DEBUG, keys = document.len(), "document loaded");
        for (key, value) in document {
            self.assign_loaded(key, value);
        }

        Ok(())
    }

    fn assign_loaded(&mut self, name: String, value: Bson) {
        if !S::is_declared(&name) {
            self.extra.insert(name, value);
            return;
        }

        self.changed.remove(&name);
        self.values.insert(name, FieldValue::loaded(value));
    }

    /// Returns the entity's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the value stored under the identity key for this entity.
    pub fn identity(&self) -> Bson {
        self.key.clone()
    }

    /// Returns `true` once the entity is known to be present in the store.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Returns the names of scalar fields assigned since the last commit.
    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// Returns `true` if `name` was assigned a scalar since the last commit.
    pub fn is_changed(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    /// Returns `true` if a commit of an existing entity would write anything.
    pub fn has_pending_changes(&self) -> bool {
        !self.changed.is_empty()
            || self
                .values
                .values()
                .any(FieldValue::is_dirty)
    }

    /// Returns the held value of a declared field, or `None` if it is unset.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Returns `true` if a declared field currently holds a value.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Reads a field.
    ///
    /// Unset declared fields read as their registered default, or `Null`
    /// without one. Undeclared names read the entity's extra state.
    ///
    /// # Errors
    ///
    /// Returns [`DocMapError::UndeclaredAttribute`] for a name that is neither
    /// declared nor held as extra state.
    pub fn get(&self, name: &str) -> DocMapResult<Bson> {
        if S::is_declared(name) {
            return Ok(match self.values.get(name) {
                Some(value) => value.to_bson(),
                None => S::default_value(name)
                    .cloned()
                    .unwrap_or(Bson::Null),
            });
        }

        self.extra
            .get(name)
            .cloned()
            .ok_or_else(|| DocMapError::UndeclaredAttribute(name.to_string()))
    }

    /// Reads a field and deserializes it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> DocMapResult<T> {
        Ok(deserialize_from_bson(self.get(name)?)?)
    }

    /// Returns a list field, or `None` if it is unset.
    ///
    /// # Errors
    ///
    /// Fails if the field is undeclared or holds something other than a list.
    pub fn list(&self, name: &str) -> DocMapResult<Option<&TrackedList>> {
        match self.held(name)? {
            None => Ok(None),
            Some(FieldValue::List(list)) => Ok(Some(list)),
            Some(_) => Err(Self::mismatch(name, ContainerKind::List)),
        }
    }

    /// Returns a map field, or `None` if it is unset.
    ///
    /// # Errors
    ///
    /// Fails if the field is undeclared or holds something other than a map.
    pub fn map(&self, name: &str) -> DocMapResult<Option<&TrackedMap>> {
        match self.held(name)? {
            None => Ok(None),
            Some(FieldValue::Map(map)) => Ok(Some(map)),
            Some(_) => Err(Self::mismatch(name, ContainerKind::Map)),
        }
    }

    /// Returns a list field for in-place mutation.
    ///
    /// An unset field is first materialised, clean, from its default (or as an
    /// empty list), so only actual mutations make it dirty.
    ///
    /// # Errors
    ///
    /// Fails if the field is undeclared or holds or defaults to something other than a list.
    pub fn list_mut(&mut self, name: &str) -> DocMapResult<&mut TrackedList> {
        match self.container_mut(name, ContainerKind::List)? {
            FieldValue::List(list) => Ok(list),
            _ => Err(Self::mismatch(name, ContainerKind::List)),
        }
    }

    /// Returns a map field for in-place mutation.
    ///
    /// See [`Entity::list_mut`] for how unset fields are handled.
    pub fn map_mut(&mut self, name: &str) -> DocMapResult<&mut TrackedMap> {
        match self.container_mut(name, ContainerKind::Map)? {
            FieldValue::Map(map) => Ok(map),
            _ => Err(Self::mismatch(name, ContainerKind::Map)),
        }
    }

    fn held(&self, name: &str) -> DocMapResult<Option<&FieldValue>> {
        if !S::is_declared(name) {
            return Err(DocMapError::UndeclaredAttribute(name.to_string()));
        }

        Ok(self.values.get(name))
    }

    fn container_mut(&mut self, name: &str, kind: ContainerKind) -> DocMapResult<&mut FieldValue> {
        if !S::is_declared(name) {
            return Err(DocMapError::UndeclaredAttribute(name.to_string()));
        }

        match self.values.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let initial = S::default_value(name)
                    .cloned()
                    .unwrap_or_else(|| kind.empty());
                if !kind.matches(&initial) {
                    return Err(Self::mismatch(name, kind));
                }

                Ok(entry.insert(FieldValue::loaded(initial)))
            }
        }
    }

    fn mismatch(name: &str, kind: ContainerKind) -> DocMapError {
        DocMapError::FieldTypeMismatch {
            field: name.to_string(),
            expected: kind.name(),
        }
    }

    /// Assigns a field.
    ///
    /// Arrays and documents are wrapped in dirty [`Tracked`] containers and
    /// are not recorded in the changed set; scalars are recorded. Undeclared
    /// names are stored as extra, never-persisted state.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Bson>) {
        let name = name.into();
        let value = value.into();

        if !S::is_declared(&name) {
            self.extra.insert(name, value);
            return;
        }

        let value = match value {
            Bson::Array(items) => FieldValue::List(Tracked::new(items)),
            Bson::Document(document) => FieldValue::Map(Tracked::new(document)),
            scalar => {
                self.changed.insert(name.clone());
                FieldValue::Scalar(scalar)
            }
        };
        self.values.insert(name, value);
    }

    /// Serializes `value` and assigns it as with [`Entity::set`].
    pub fn set_as<T: Serialize + ?Sized>(&mut self, name: impl Into<String>, value: &T) -> DocMapResult<()> {
        self.set(name, serialize_to_bson(value)?);

        Ok(())
    }

    /// Assigns an already tracked list, keeping its dirty flag as is.
    pub fn set_list(&mut self, name: impl Into<String>, list: TrackedList) {
        let name = name.into();

        if !S::is_declared(&name) {
            self.extra.insert(name, Bson::Array(list.into_inner()));
            return;
        }

        self.values.insert(name, FieldValue::List(list));
    }

    /// Assigns an already tracked map, keeping its dirty flag as is.
    pub fn set_map(&mut self, name: impl Into<String>, map: TrackedMap) {
        let name = name.into();

        if !S::is_declared(&name) {
            self.extra.insert(name, Bson::Document(map.into_inner()));
            return;
        }

        self.values.insert(name, FieldValue::Map(map));
    }

    /// Produces the full document for a create or replace.
    ///
    /// The result holds the identity key, every registered default, and
    /// every declared field currently held. Extra state is not exported.
    pub fn export(&self) -> Document {
        let mut document = Document::new();
        document.insert(IDENTITY_FIELD, self.identity());

        for (key, value) in S::defaults() {
            document.insert(key.clone(), value.clone());
        }
        for field in S::fields() {
            if let Some(value) = self.values.get(*field) {
                document.insert(*field, value.to_bson());
            }
        }

        document
    }

    /// Computes the write a commit would issue, without touching the store.
    ///
    /// Non-empty `fields` are persisted as given. Otherwise an existing
    /// entity writes its changed scalars plus every dirty container (emitted
    /// whole), and a new entity with nothing explicitly requested writes its
    /// full exported document.
    ///
    /// # Errors
    ///
    /// Returns [`DocMapError::UndeclaredAttribute`] if an explicit field cannot be read.
    pub fn plan(&self, fields: Option<&Fields>) -> DocMapResult<CommitPlan> {
        let mut document = Document::new();
        let mut flushed = Vec::new();

        let names: BTreeSet<String> = match fields {
            Some(fields) if !fields.is_empty() => fields.iter().map(str::to_string).collect(),
            _ if self.exists => {
                let mut names = self.changed.clone();
                for field in S::fields() {
                    if let Some(value) = self.values.get(*field) {
                        if value.is_dirty() {
                            names.remove(*field);
                            document.insert(*field, value.to_bson());
                            flushed.push(field.to_string());
                        }
                    }
                }
                names
            }
            _ => BTreeSet::new(),
        };

        if names.is_empty() && document.is_empty() {
            return Ok(if self.exists {
                CommitPlan::Noop
            } else {
                CommitPlan::Replace { document: self.export() }
            });
        }

        for name in names {
            document.insert(name.clone(), self.get(&name)?);
            if self.values.get(&name).is_some_and(FieldValue::is_container) {
                flushed.push(name);
            }
        }

        Ok(CommitPlan::Set { document, flushed })
    }

    /// Persists pending changes through `collection`.
    ///
    /// Equivalent to [`Entity::commit_with`] with default options.
    pub async fn commit<A: RepositoryAdapter>(
        &mut self,
        collection: &EntityCollection<'_, A, S>,
    ) -> DocMapResult<()> {
        self.commit_with(collection, CommitOptions::default())
            .await
    }

    /// Persists exactly the named fields.
    pub async fn commit_fields<A: RepositoryAdapter>(
        &mut self,
        collection: &EntityCollection<'_, A, S>,
        fields: impl Into<Fields>,
    ) -> DocMapResult<()> {
        self.commit_with(collection, CommitOptions::new().fields(fields))
            .await
    }

    /// Reconciles tracked changes into one store write, as described by [`Entity::plan`].
    ///
    /// On success the entity exists, its changed set is empty, and the
    /// containers that were written are clean again. On failure nothing is
    /// reset, so the same changes can be committed again.
    ///
    /// # Errors
    ///
    /// Propagates planning errors and adapter failures.
    pub async fn commit_with<A: RepositoryAdapter>(
        &mut self,
        collection: &EntityCollection<'_, A, S>,
        options: CommitOptions<'_>,
    ) -> DocMapResult<()> {
        let span = info_span!(
            "docmap.commit",
            collection = %collection.name(),
            id = %self.id,
            transactional = options.transaction.is_some()
        );

        self.commit_inner(collection, options)
            .instrument(span)
            .await
    }

    async fn commit_inner<A: RepositoryAdapter>(
        &mut self,
        collection: &EntityCollection<'_, A, S>,
        options: CommitOptions<'_>,
    ) -> DocMapResult<()> {
        let plan = self.plan(options.fields.as_ref())?;

        let scoped;
        let handle: &dyn CollectionHandle = match options.transaction {
            Some(transaction) => {
                scoped = transaction.collection(collection.name());
                scoped.as_ref()
            }
            None => collection,
        };
        let selector = identity::key_selector(self.identity());

        let flushed = match plan {
            CommitPlan::Set { document, flushed } => {
                event!(Level::DEBUG, keys = document.len(), "committing targeted update");
                handle
                    .update(&selector, Update::Set(document), true)
                    .await?;
                flushed
            }
            CommitPlan::Replace { document } => {
                event!(Level::DEBUG, keys = document.len(), "committing full document");
                handle
                    .update(&selector, Update::Replace(document), true)
                    .await?;
                self.values.keys().cloned().collect()
            }
            CommitPlan::Noop => {
                event!(Level::TRACE, "nothing to commit");
                Vec::new()
            }
        };

        for name in flushed {
            if let Some(value) = self.values.get_mut(&name) {
                value.mark_clean();
            }
        }
        self.exists = true;
        self.changed.clear();

        Ok(())
    }

    /// Deletes this entity's document. In-memory state is left as is.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures untranslated.
    pub async fn remove<A: RepositoryAdapter>(
        &self,
        collection: &EntityCollection<'_, A, S>,
    ) -> DocMapResult<RemoveOutcome> {
        event!(Level::DEBUG, collection = %collection.name(), id = %self.id, "removing document");
        collection
            .remove_document(&self.key)
            .await
    }
}

impl<S: Schema> Default for Entity<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Schema> fmt::Debug for Entity<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("collection", &S::collection_name())
            .field("id", &self.id)
            .field("exists", &self.exists)
            .field("values", &self.values)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}
