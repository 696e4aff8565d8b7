//! Cooperative, single-shot cancellation threaded through every call.
//!
//! The signal is a [`CancellationToken`]. It is checked before dispatch,
//! raced against the transport while a request is in flight, and checked
//! ahead of every streamed chunk. Cancelling a token whose call already
//! finished does nothing.

use futures::StreamExt;
use std::future::Future;

pub use tokio_util::sync::CancellationToken;

use crate::client::TextStream;
use crate::error::{CompletionError, Result};

/// Run `fut` unless `token` fires first.
///
/// An already-cancelled token short-circuits without polling `fut`.
pub async fn run_cancellable<F>(token: &CancellationToken, fut: F) -> Result<F::Output>
where
    F: Future,
{
    if token.is_cancelled() {
        return Err(CompletionError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(CompletionError::Cancelled),
        output = fut => Ok(output),
    }
}

/// Guard a text stream with a token.
///
/// Once the token fires the guarded stream yields exactly one
/// [`CompletionError::Cancelled`] and ends; the inner stream is dropped,
/// which aborts its transport, and anything it had buffered is discarded.
/// The inner stream also ends the guarded stream after its first error.
pub fn cancellable_stream(inner: TextStream, token: CancellationToken) -> TextStream {
    Box::pin(async_stream::stream! {
        let mut inner = inner;
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!("completion stream cancelled");
                    yield Err(CompletionError::Cancelled);
                    break;
                }
                item = inner.next() => match item {
                    Some(Ok(text)) => yield Ok(text),
                    Some(Err(e)) => {
                        yield Err(e);
                        break;
                    }
                    None => break,
                },
            }
        }
    })
}
