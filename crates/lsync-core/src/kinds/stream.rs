use std::future::{Future, ready};

use lsync_api::models::{STREAM, Stream, StreamAttributes};
use lsync_api::{CancellationToken, Client, Method};

use crate::error::CoreError;
use crate::reconcile::ResourceKind;

/// Saved span query. Attributes round-trip unchanged apart from any
/// query normalization the server applies.
#[derive(Debug, Clone, Copy)]
pub struct StreamKind;

impl ResourceKind for StreamKind {
    const NAME: &'static str = "stream";
    const COLLECTION: &'static str = "streams";
    const UPDATE_METHOD: Method = Method::PATCH;

    type Attrs = StreamAttributes;
    type Remote = Stream;
    type Request = Stream;

    fn encode(attrs: &StreamAttributes, id: Option<&str>) -> Stream {
        let stream = Stream::new(STREAM, attrs.clone());
        match id {
            Some(id) => stream.with_id(id),
            None => stream,
        }
    }

    fn remote_id(remote: &Stream) -> Option<&str> {
        remote.id.as_deref()
    }

    fn decode<'a>(
        _client: &'a Client,
        _cancel: &'a CancellationToken,
        remote: Stream,
    ) -> impl Future<Output = Result<StreamAttributes, CoreError>> + Send + 'a {
        ready(Ok(remote.attributes))
    }
}
