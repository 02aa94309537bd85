use std::future::{Future, ready};

use lsync_api::models::{DASHBOARD, Dashboard, DashboardAttributes, ResourceRef, STREAM};
use lsync_api::{CancellationToken, Client, Method};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::reconcile::ResourceKind;

/// Declared form of a stream dashboard: streams by id, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardDefinition {
    pub name: String,
    #[serde(default)]
    pub stream_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct DashboardKind;

impl ResourceKind for DashboardKind {
    const NAME: &'static str = "dashboard";
    const COLLECTION: &'static str = "dashboards";
    const UPDATE_METHOD: Method = Method::PUT;

    type Attrs = DashboardDefinition;
    type Remote = Dashboard;
    type Request = Dashboard;

    fn encode(attrs: &DashboardDefinition, id: Option<&str>) -> Dashboard {
        let dashboard = Dashboard::new(
            DASHBOARD,
            DashboardAttributes {
                name: attrs.name.clone(),
                streams: attrs
                    .stream_ids
                    .iter()
                    .map(|id| ResourceRef::new(STREAM, id.as_str()))
                    .collect(),
            },
        );
        match id {
            Some(id) => dashboard.with_id(id),
            None => dashboard,
        }
    }

    fn remote_id(remote: &Dashboard) -> Option<&str> {
        remote.id.as_deref()
    }

    fn decode<'a>(
        _client: &'a Client,
        _cancel: &'a CancellationToken,
        remote: Dashboard,
    ) -> impl Future<Output = Result<DashboardDefinition, CoreError>> + Send + 'a {
        let DashboardAttributes { name, streams } = remote.attributes;
        ready(Ok(DashboardDefinition {
            name,
            stream_ids: streams.into_iter().map(|stream| stream.id).collect(),
        }))
    }
}
