// Stream-backed alert conditions.
//
// Reads only get a link to the owning stream, so decoding costs one
// extra request unless the server also inlined the stream reference.

use std::future::Future;

use lsync_api::models::{CONDITION, Condition, ConditionAttributes, ConditionRelationships};
use lsync_api::{CancellationToken, Client, Method};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::reconcile::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDefinition {
    pub name: String,
    pub expression: String,
    pub evaluation_window_ms: u64,
    pub stream_id: String,
}

#[derive(Debug, Clone, Copy)]
pub struct AlertKind;

impl ResourceKind for AlertKind {
    const NAME: &'static str = "alert";
    const COLLECTION: &'static str = "conditions";
    const UPDATE_METHOD: Method = Method::PATCH;

    type Attrs = AlertDefinition;
    type Remote = Condition;
    type Request = Condition;

    fn encode(attrs: &AlertDefinition, id: Option<&str>) -> Condition {
        let condition = Condition::new(
            CONDITION,
            ConditionAttributes {
                name: attrs.name.clone(),
                expression: attrs.expression.clone(),
                evaluation_window_ms: attrs.evaluation_window_ms,
            },
        )
        .with_relationships(ConditionRelationships::for_stream(attrs.stream_id.as_str()));
        match id {
            Some(id) => condition.with_id(id),
            None => condition,
        }
    }

    fn remote_id(remote: &Condition) -> Option<&str> {
        remote.id.as_deref()
    }

    fn decode<'a>(
        client: &'a Client,
        cancel: &'a CancellationToken,
        remote: Condition,
    ) -> impl Future<Output = Result<AlertDefinition, CoreError>> + Send + 'a {
        async move {
            let inline = remote
                .relationships
                .as_ref()
                .and_then(|relationships| relationships.stream.data.as_ref())
                .map(|stream| stream.id.clone());

            let stream_id = match inline {
                Some(id) => id,
                None => {
                    let link = remote
                        .relationships
                        .as_ref()
                        .and_then(ConditionRelationships::stream_link)
                        .ok_or_else(|| CoreError::MissingRelationship {
                            kind: Self::NAME,
                            id: remote.id.clone().unwrap_or_default(),
                            relationship: "stream",
                        })?;
                    client.get_by_link(cancel, link).await?
                }
            };

            let ConditionAttributes {
                name,
                expression,
                evaluation_window_ms,
            } = remote.attributes;
            Ok::<_, CoreError>(AlertDefinition {
                name,
                expression,
                evaluation_window_ms,
                stream_id,
            })
        }
    }
}
