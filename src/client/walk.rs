//! Subtree walking with GETBULK.

use std::collections::VecDeque;
use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::table::OidTable;
use crate::transport::Transport;
use crate::varbind::VarBind;

use super::Client;

type PageFuture = Pin<Box<dyn Future<Output = Result<Vec<VarBind>>> + Send>>;

/// Async stream over the entries of one subtree, fetched a page at a time.
///
/// Created by [`Client::bulk_walk()`] or [`Client::bulk_walk_from()`].
///
/// The walk ends at the first entry that is an exception value or lies
/// outside the subtree (that entry is not yielded), or after a page that
/// held fewer entries than requested. An entry that does not sort after the
/// previous one yields [`Error::NonIncreasingOid`] and ends the walk.
///
/// Each page request depends only on the cursor, so a failed walk can be
/// resumed with [`Client::bulk_walk_from()`] at [`cursor()`](Self::cursor).
pub struct BulkWalk<T: Transport> {
    client: Client<T>,
    root: Oid,
    cursor: Oid,
    page_size: u32,
    pages: usize,
    /// The last page was short; stop once the buffer drains.
    exhausted: bool,
    done: bool,
    buffer: VecDeque<VarBind>,
    pending: Option<PageFuture>,
}

impl<T: Transport> BulkWalk<T> {
    fn new(client: Client<T>, root: Oid, cursor: Oid) -> Self {
        let page_size = client.config().page_size.max(1);
        Self {
            client,
            root,
            cursor,
            page_size,
            pages: 0,
            exhausted: false,
            done: false,
            buffer: VecDeque::new(),
            pending: None,
        }
    }

    pub fn root(&self) -> &Oid {
        &self.root
    }

    /// Last accepted OID (the root before anything was accepted).
    pub fn cursor(&self) -> &Oid {
        &self.cursor
    }

    /// Number of page requests completed so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Check one returned binding against the walk's boundary rules.
    fn accept(&mut self, vb: VarBind) -> Option<Result<VarBind>> {
        if vb.value.is_exception() || !vb.oid.is_descendant_of(&self.root) {
            tracing::trace!(walk.root = %self.root, snmp.oid = %vb.oid, "walk left subtree");
            self.done = true;
            return None;
        }
        if vb.oid <= self.cursor {
            self.done = true;
            return Some(Err(Error::NonIncreasingOid {
                previous: self.cursor.clone(),
                current: vb.oid,
            }));
        }
        self.cursor = vb.oid.clone();
        Some(Ok(vb))
    }
}

impl<T: Transport + 'static> BulkWalk<T> {
    /// Next entry, or `None` once the walk has ended.
    pub async fn next(&mut self) -> Option<Result<VarBind>> {
        poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }
}

impl<T: Transport + 'static> Stream for BulkWalk<T> {
    type Item = Result<VarBind>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.done {
                return Poll::Ready(None);
            }

            if let Some(vb) = this.buffer.pop_front() {
                return Poll::Ready(this.accept(vb));
            }

            if this.exhausted {
                this.done = true;
                return Poll::Ready(None);
            }

            let pending = this.pending.get_or_insert_with(|| {
                let client = this.client.clone();
                let cursor = this.cursor.clone();
                let page_size = this.page_size;
                Box::pin(async move { client.get_bulk(&cursor, page_size).await })
            });

            match pending.as_mut().poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(result) => {
                    this.pending = None;
                    match result {
                        Ok(varbinds) => {
                            this.pages += 1;
                            this.exhausted = varbinds.len() < this.page_size as usize;
                            this.buffer.extend(varbinds);
                        }
                        Err(e) => {
                            this.done = true;
                            return Poll::Ready(Some(Err(e)));
                        }
                    }
                }
            }
        }
    }
}

impl<T: Transport + 'static> Client<T> {
    /// Stream the entries of the subtree under `root`.
    pub fn bulk_walk(&self, root: Oid) -> BulkWalk<T> {
        BulkWalk::new(self.clone(), root.clone(), root)
    }

    /// Stream the entries of the subtree under `root` that sort after
    /// `cursor`.
    pub fn bulk_walk_from(&self, root: Oid, cursor: Oid) -> BulkWalk<T> {
        BulkWalk::new(self.clone(), root, cursor)
    }

    /// Walk a table column into an [`OidTable`] keyed by row index.
    ///
    /// Every entry must sit exactly one arc below `root`; anything else is
    /// [`Error::MalformedIndex`]. An empty subtree gives an empty table.
    #[instrument(
        level = "debug",
        skip(self, root),
        fields(snmp.target = %self.peer_addr(), walk.root = %root)
    )]
    pub async fn walk_table(&self, root: &Oid) -> Result<OidTable> {
        let mut walk = self.bulk_walk(root.clone());
        let mut table = OidTable::new(root.clone());

        while let Some(vb) = walk.next().await {
            let vb = vb?;
            let index = match vb.oid.suffix(root) {
                Some(&[index]) => index,
                _ => {
                    return Err(Error::MalformedIndex {
                        root: root.clone(),
                        oid: vb.oid,
                    });
                }
            };
            table.insert(index, vb.value);
        }

        tracing::debug!(
            walk.entries = table.len(),
            walk.pages = walk.pages(),
            "walk complete"
        );
        Ok(table)
    }
}
