//! A Copr client together with its memoized chroot list.

use tracing::info;

use super::api::CoprApi;
use super::cache::ChrootCache;
use super::collector;
use crate::build_status::BuildStateList;
use crate::chroot::ChrootFilter;
use crate::Result;

/// Owns a [`CoprApi`] client and the chroot cache that belongs to it.
///
/// The chroot list is fetched at most once per service instance. Build
/// states are never cached.
pub struct CoprService<C> {
    client: C,
    chroots: ChrootCache,
}

impl<C: CoprApi> CoprService<C> {
    pub fn new(client: C) -> Self {
        CoprService {
            client,
            chroots: ChrootCache::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// All chroots Copr currently supports (memoized).
    pub async fn all_chroots(&self) -> Result<Vec<String>> {
        let chroots = self
            .chroots
            .get_or_fetch(|| self.client.mock_chroot_list())
            .await?;
        Ok(chroots.to_vec())
    }

    /// Supported chroots matching `filter`, sorted.
    pub async fn chroots_matching(&self, filter: &ChrootFilter) -> Result<Vec<String>> {
        let chroots = self.all_chroots().await?;
        let selected = filter.apply(&chroots);
        info!(
            pattern = filter.pattern(),
            total = chroots.len(),
            selected = selected.len(),
            "filtered copr chroots"
        );
        Ok(selected)
    }

    pub fn chroot_cache_populated(&self) -> bool {
        self.chroots.is_populated()
    }

    /// Forget the memoized chroot list.
    pub fn reset_chroot_cache(&mut self) {
        self.chroots.reset();
    }

    pub async fn project_exists(&self, ownername: &str, projectname: &str) -> Result<bool> {
        collector::project_exists(&self.client, ownername, projectname).await
    }

    pub async fn build_states(&self, ownername: &str, projectname: &str) -> Result<BuildStateList> {
        collector::get_all_build_states(&self.client, ownername, projectname).await
    }
}
