//! Single-entry cache for the list of chroots Copr supports.
//!
//! The list only changes when Copr adds or retires a distribution release,
//! so one fetch per client is enough. The cache is owned by whoever owns the
//! client (see [`super::CoprService`]) and can be reset explicitly.

use std::future::Future;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::CoprError;
use crate::Result;

/// Memoized chroot list, populated at most once until [`ChrootCache::reset`].
#[derive(Debug, Default)]
pub struct ChrootCache {
    chroots: OnceCell<Vec<String>>,
}

impl ChrootCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the list has been fetched.
    pub fn is_populated(&self) -> bool {
        self.chroots.initialized()
    }

    /// Cached value, if any.
    pub fn get(&self) -> Option<&[String]> {
        self.chroots.get().map(Vec::as_slice)
    }

    /// Return the cached list, running `fetch` only if it is not populated.
    ///
    /// Concurrent callers wait for the same fetch. A failed fetch leaves the
    /// cache empty so the next call tries again.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<&[String]>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>>>,
    {
        let chroots = self
            .chroots
            .get_or_try_init(|| async move {
                let chroots = fetch().await?;
                debug!(count = chroots.len(), "cached copr chroot list");
                Ok::<_, CoprError>(chroots)
            })
            .await?;
        Ok(chroots.as_slice())
    }

    /// Drop the cached list so the next lookup fetches again.
    pub fn reset(&mut self) {
        self.chroots.take();
    }
}
