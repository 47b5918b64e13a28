//! Explicitly owned spatial index for tools that rebuild on demand
//!
//! Instead of a global tree with a hidden dirty flag, a [`SpatialContext`]
//! is created by whoever needs spatial queries and passed to the systems
//! that use it. Callers mark it stale with [`invalidate`](SpatialContext::invalidate)
//! when the scene changes and rebuild it from a [`BoundsSource`].

use log::{debug, warn};
use slotmap::{Key, SlotMap};

use crate::config::OctreeConfig;
use crate::error::OctreeResult;
use crate::geometry::AABB;
use super::{Handle, LooseOctree};

/// Something with world-space bounds
pub trait Bounded {
    /// Current world-space bounds
    fn bounds(&self) -> AABB;
}

/// Collection of objects the index can be rebuilt from
pub trait BoundsSource<H> {
    /// Every object currently in the source with its bounds
    fn bounds_entries(&self) -> Box<dyn Iterator<Item = (H, AABB)> + '_>;

    /// Check if the source still holds `handle`
    fn contains(&self, handle: H) -> bool;
}

impl<H: Handle> BoundsSource<H> for [(H, AABB)] {
    fn bounds_entries(&self) -> Box<dyn Iterator<Item = (H, AABB)> + '_> {
        Box::new(self.iter().copied())
    }

    fn contains(&self, handle: H) -> bool {
        self.iter().any(|(h, _)| *h == handle)
    }
}

impl<K, V> BoundsSource<K> for SlotMap<K, V>
where
    K: Key + Handle,
    V: Bounded,
{
    fn bounds_entries(&self) -> Box<dyn Iterator<Item = (K, AABB)> + '_> {
        Box::new(self.iter().map(|(key, value)| (key, value.bounds())))
    }

    fn contains(&self, handle: K) -> bool {
        self.contains_key(handle)
    }
}

/// Owner of a loose octree that is rebuilt from a source when stale
#[derive(Debug, Clone)]
pub struct SpatialContext<H> {
    config: OctreeConfig,
    tree: LooseOctree<H>,
    stale: bool,
}

impl<H: Handle> SpatialContext<H> {
    /// Create a stale context; the first query must be preceded by a rebuild
    pub fn new(config: OctreeConfig) -> OctreeResult<Self> {
        config.validate()?;

        Ok(Self {
            tree: LooseOctree::from_config(&config),
            config,
            stale: true,
        })
    }

    /// The configuration every rebuild starts from
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Mark the index as out of date
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Check if the index needs a rebuild
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Drop everything and insert every object `source` yields
    ///
    /// Returns the number of entries inserted. On the first failed insert
    /// the error is returned and the context stays stale.
    pub fn rebuild<S>(&mut self, source: &S) -> OctreeResult<usize>
    where
        S: BoundsSource<H> + ?Sized,
    {
        self.tree = LooseOctree::from_config(&self.config);
        self.stale = true;

        for (handle, bounds) in source.bounds_entries() {
            if let Err(e) = self.tree.insert(handle, bounds) {
                warn!("Spatial context rebuild failed for {:?}: {}", handle, e);
                return Err(e);
            }
        }

        self.stale = false;
        debug!("Spatial context rebuilt with {} entries", self.tree.count());
        Ok(self.tree.count())
    }

    /// Rebuild only if the index is stale
    pub fn ensure_current<S>(&mut self, source: &S) -> OctreeResult<&LooseOctree<H>>
    where
        S: BoundsSource<H> + ?Sized,
    {
        if self.stale {
            self.rebuild(source)?;
        }
        Ok(&self.tree)
    }

    /// The index, if it is current
    pub fn tree(&self) -> Option<&LooseOctree<H>> {
        (!self.stale).then_some(&self.tree)
    }

    /// Overlap query that drops handles `source` no longer holds
    ///
    /// Returns nothing while the context is stale.
    pub fn get_colliding_live<S>(&self, source: &S, query: &AABB) -> Vec<H>
    where
        S: BoundsSource<H> + ?Sized,
    {
        let Some(tree) = self.tree() else {
            return Vec::new();
        };

        let mut hits = tree.get_colliding(query);
        hits.retain(|handle| source.contains(*handle));
        hits
    }
}
