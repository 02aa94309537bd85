// lsync-core: Reconciliation of declared Lightstep resources
//
// `Reconciler<K>` runs create/read/update/delete/import for any
// `ResourceKind`; the four kinds in `kinds` cover streams, dashboards,
// stream alerts, and metric conditions.

pub mod error;
pub mod kinds;
pub mod reconcile;
pub mod tracked;

pub use error::CoreError;
pub use kinds::{
    AlertDefinition, AlertKind, DashboardDefinition, DashboardKind, MetricConditionKind, StreamKind,
};
pub use reconcile::{Reconciler, ResourceKind};
pub use tracked::{ImportRef, MalformedImportRef, Presence, ReadOutcome, Tracked};

pub type StreamReconciler = Reconciler<StreamKind>;
pub type DashboardReconciler = Reconciler<DashboardKind>;
pub type AlertReconciler = Reconciler<AlertKind>;
pub type MetricConditionReconciler = Reconciler<MetricConditionKind>;
