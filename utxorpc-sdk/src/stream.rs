use crate::error::{Error, Result};
use futures::stream::{self, BoxStream};
use futures::StreamExt;

/// A stream of raw wire messages as handed back by a transport.
pub type WireStream<T> = BoxStream<'static, Result<T, tonic::Status>>;

/// A live, pull-driven sequence of typed events.
///
/// Each poll decodes at most one wire message. The stream ends after yielding its first
/// error, and dropping it cancels the underlying RPC.
pub type EventStream<T> = BoxStream<'static, Result<T>>;

/// Maps every wire message through `map`, skipping messages mapped to `None`.
pub(crate) fn map_stream<W, T, F>(wire: WireStream<W>, map: F) -> EventStream<T>
where
    W: Send + 'static,
    T: Send + 'static,
    F: FnMut(W) -> Result<Option<T>> + Send + 'static,
{
    stream::unfold(Some((wire, map)), |state| async move {
        let (mut wire, mut map) = state?;
        loop {
            let mapped = match wire.next().await? {
                Ok(message) => map(message),
                Err(status) => Err(Error::from(status)),
            };
            match mapped {
                Ok(Some(event)) => return Some((Ok(event), Some((wire, map)))),
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!(error = %err, "Stream terminated by error.");
                    return Some((Err(err), None));
                }
            }
        }
    })
    .boxed()
}
