//! Draining walk streams through the `Stream` impl.

use std::future::poll_fn;
use std::pin::Pin;

use futures_core::Stream;

/// Poll `stream` until it ends, keeping at most `limit` items.
pub async fn drain<S: Stream + Unpin>(stream: &mut S, limit: usize) -> Vec<S::Item> {
    let mut items = Vec::new();
    while items.len() < limit {
        match poll_fn(|cx| Pin::new(&mut *stream).poll_next(cx)).await {
            Some(item) => items.push(item),
            None => break,
        }
    }
    items
}
