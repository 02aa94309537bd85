mod alert;
mod dashboard;
mod metric_condition;
mod stream;

pub use alert::{AlertDefinition, AlertKind};
pub use dashboard::{DashboardDefinition, DashboardKind};
pub use metric_condition::MetricConditionKind;
pub use stream::StreamKind;
