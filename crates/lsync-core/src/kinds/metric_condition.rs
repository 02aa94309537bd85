use std::future::{Future, ready};

use lsync_api::models::{METRIC_ALERT, MetricAlert, MetricAlertAttributes};
use lsync_api::{CancellationToken, Client, Method};

use crate::error::CoreError;
use crate::reconcile::ResourceKind;

/// Metric-query alert. Served from the `metric_alerts` collection and
/// replaced wholesale on update.
#[derive(Debug, Clone, Copy)]
pub struct MetricConditionKind;

impl ResourceKind for MetricConditionKind {
    const NAME: &'static str = "metric_condition";
    const COLLECTION: &'static str = "metric_alerts";
    const UPDATE_METHOD: Method = Method::PUT;

    type Attrs = MetricAlertAttributes;
    type Remote = MetricAlert;
    type Request = MetricAlert;

    fn encode(attrs: &MetricAlertAttributes, id: Option<&str>) -> MetricAlert {
        let alert = MetricAlert::new(METRIC_ALERT, attrs.clone());
        match id {
            Some(id) => alert.with_id(id),
            None => alert,
        }
    }

    fn remote_id(remote: &MetricAlert) -> Option<&str> {
        remote.id.as_deref()
    }

    fn decode<'a>(
        _client: &'a Client,
        _cancel: &'a CancellationToken,
        remote: MetricAlert,
    ) -> impl Future<Output = Result<MetricAlertAttributes, CoreError>> + Send + 'a {
        ready(Ok(remote.attributes))
    }
}
