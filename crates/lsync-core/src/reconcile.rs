// ── Generic CRUD/import reconciler ──
//
// Each resource kind supplies its collection path, update verb, and the
// conversion between declared attributes and wire objects. `Reconciler`
// drives the lifecycle: every successful create or update is followed by
// a read, so local attributes always reflect what the server stored.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use lsync_api::{CancellationToken, Client, Envelope, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::CoreError;
use crate::tracked::{ImportRef, Presence, ReadOutcome, Tracked};

/// One remote resource type.
pub trait ResourceKind: Send + Sync + 'static {
    /// Human-readable kind, used in errors and logs.
    const NAME: &'static str;
    /// Collection segment under `projects/<project>/`.
    const COLLECTION: &'static str;
    /// Verb for in-place updates. Kinds differ: some PATCH, some PUT.
    const UPDATE_METHOD: Method;

    /// Locally declared state.
    type Attrs: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync;
    /// Wire object as the server returns it.
    type Remote: DeserializeOwned + Send;
    /// Wire object as sent on create and update.
    type Request: Serialize + Send + Sync;

    fn encode(attrs: &Self::Attrs, id: Option<&str>) -> Self::Request;

    fn remote_id(remote: &Self::Remote) -> Option<&str>;

    /// Turn a fetched object back into declared attributes. May issue
    /// further requests, e.g. to dereference relationship links.
    fn decode<'a>(
        client: &'a Client,
        cancel: &'a CancellationToken,
        remote: Self::Remote,
    ) -> impl Future<Output = Result<Self::Attrs, CoreError>> + Send + 'a;
}

pub struct Reconciler<K: ResourceKind> {
    client: Arc<Client>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> Clone for Reconciler<K> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.client))
    }
}

impl<K: ResourceKind> fmt::Debug for Reconciler<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("kind", &K::NAME)
            .field("org", &self.client.org_name())
            .finish()
    }
}

impl<K: ResourceKind> Reconciler<K> {
    pub fn new(client: Arc<Client>) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection_path(project: &str) -> String {
        format!("projects/{project}/{}", K::COLLECTION)
    }

    fn resource_path(project: &str, id: &str) -> String {
        format!("projects/{project}/{}/{id}", K::COLLECTION)
    }

    fn require_id(tracked: &Tracked<K::Attrs>) -> Result<String, CoreError> {
        tracked
            .id()
            .map(str::to_owned)
            .ok_or_else(|| CoreError::Untracked {
                kind: K::NAME,
                project: tracked.project.clone(),
            })
    }

    /// Create the resource, then adopt whatever the server stored.
    ///
    /// If the follow-up read fails the identifier is still recorded, so
    /// the object is not orphaned.
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        tracked: &mut Tracked<K::Attrs>,
    ) -> Result<(), CoreError> {
        if let Some(id) = tracked.id() {
            return Err(CoreError::AlreadyCreated {
                kind: K::NAME,
                id: id.to_owned(),
            });
        }

        let body = Envelope::new(K::encode(&tracked.attrs, None));
        let created: K::Remote = self
            .client
            .post(cancel, &Self::collection_path(&tracked.project), &body)
            .await?;
        let id = K::remote_id(&created)
            .map(str::to_owned)
            .ok_or(CoreError::MissingIdentifier { kind: K::NAME })?;

        debug!(kind = K::NAME, project = %tracked.project, %id, "created");
        tracked.presence = Presence::Created(id);
        self.read(cancel, tracked).await.map(|_| ())
    }

    /// Refresh local attributes from the server.
    ///
    /// A 404 is drift, not failure: the identifier is cleared and
    /// [`ReadOutcome::Gone`] returned. Any other failure leaves the
    /// tracked state untouched.
    pub async fn read(
        &self,
        cancel: &CancellationToken,
        tracked: &mut Tracked<K::Attrs>,
    ) -> Result<ReadOutcome, CoreError> {
        let id = Self::require_id(tracked)?;
        match self.fetch(cancel, &tracked.project, &id).await? {
            Some(attrs) => {
                tracked.attrs = attrs;
                Ok(ReadOutcome::Present)
            }
            None => {
                debug!(kind = K::NAME, project = %tracked.project, %id, "gone; clearing identifier");
                tracked.presence = Presence::Absent;
                Ok(ReadOutcome::Gone)
            }
        }
    }

    /// Push local attributes in place, then re-read.
    pub async fn update(
        &self,
        cancel: &CancellationToken,
        tracked: &mut Tracked<K::Attrs>,
    ) -> Result<(), CoreError> {
        let id = Self::require_id(tracked)?;
        let body = Envelope::new(K::encode(&tracked.attrs, Some(&id)));
        self.client
            .call_api_discard(
                cancel,
                K::UPDATE_METHOD,
                &Self::resource_path(&tracked.project, &id),
                Some(&body),
            )
            .await?;

        debug!(kind = K::NAME, project = %tracked.project, %id, "updated");
        self.read(cancel, tracked).await.map(|_| ())
    }

    /// Delete the resource. Already gone counts as success; untracked
    /// resources are a no-op. On any other failure the identifier stays.
    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        tracked: &mut Tracked<K::Attrs>,
    ) -> Result<(), CoreError> {
        let Some(id) = tracked.id().map(str::to_owned) else {
            return Ok(());
        };
        self.delete_id(cancel, &tracked.project, &id).await?;
        tracked.presence = Presence::Deleted;
        Ok(())
    }

    /// Delete by identifier without a tracked record. A 404 is success.
    pub async fn delete_id(
        &self,
        cancel: &CancellationToken,
        project: &str,
        id: &str,
    ) -> Result<(), CoreError> {
        match self
            .client
            .delete(cancel, &Self::resource_path(project, id))
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!(kind = K::NAME, project, id, "already deleted");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Adopt an existing object from a `<project>.<id>` reference.
    ///
    /// Malformed references fail before any request is sent.
    pub async fn import(
        &self,
        cancel: &CancellationToken,
        reference: &str,
    ) -> Result<Tracked<K::Attrs>, CoreError> {
        let ImportRef { project, id } =
            reference
                .parse()
                .map_err(|_| CoreError::InvalidImportReference {
                    kind: K::NAME,
                    reference: reference.to_owned(),
                })?;

        self.get(cancel, project, id).await
    }

    /// Fetch an object by identifier into a fresh tracked record.
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        project: String,
        id: String,
    ) -> Result<Tracked<K::Attrs>, CoreError> {
        match self.fetch(cancel, &project, &id).await? {
            Some(attrs) => Ok(Tracked::existing(project, id, attrs)),
            None => Err(CoreError::NotFound {
                kind: K::NAME,
                project,
                id,
            }),
        }
    }

    /// Whether the tracked object still exists remotely. Does not touch
    /// local state.
    pub async fn exists(
        &self,
        cancel: &CancellationToken,
        tracked: &Tracked<K::Attrs>,
    ) -> Result<bool, CoreError> {
        let Some(id) = tracked.id() else {
            return Ok(false);
        };
        match self
            .client
            .get::<serde_json::Value>(cancel, &Self::resource_path(&tracked.project, id))
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// GET one object; `None` on 404.
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        project: &str,
        id: &str,
    ) -> Result<Option<K::Attrs>, CoreError> {
        let remote: K::Remote = match self
            .client
            .get(cancel, &Self::resource_path(project, id))
            .await
        {
            Ok(remote) => remote,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        K::decode(&self.client, cancel, remote).await.map(Some)
    }
}
