use std::time::Instant;

use ethereum_types::H256;
use log::debug;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::{CACHE_ROUNDS, NODE_BYTES};

/// The per-epoch light cache.
///
/// Immutable once built; safe to share between any number of concurrent
/// verifications.
#[derive(Clone, PartialEq, Eq)]
pub struct Cache {
    nodes: Vec<Node>,
}

impl Cache {
    /// Builds the cache of `cache_size` bytes from `seed`.
    ///
    /// `cache_size` has to be a non-zero multiple of the node size. Sizes from
    /// [`Params::cache_size`](crate::Params::cache_size) additionally have a
    /// prime node count, but that is not required here.
    pub fn new(cache_size: u64, seed: &H256) -> Result<Self> {
        if cache_size == 0 || cache_size % NODE_BYTES as u64 != 0 {
            return Err(Error::invalid(format!(
                "cache size {} is not a non-zero multiple of {}",
                cache_size, NODE_BYTES
            )));
        }
        let n = usize::try_from(cache_size / NODE_BYTES as u64)
            .map_err(|_| Error::OutOfMemory { bytes: cache_size })?;
        if u32::try_from(n).is_err() {
            return Err(Error::invalid(format!(
                "cache of {} nodes exceeds the 32-bit index space",
                n
            )));
        }

        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(n)
            .map_err(|_| Error::OutOfMemory { bytes: cache_size })?;

        let started = Instant::now();
        debug!("building cache: {} nodes, seed {:?}", n, seed);
        make_cache(&mut nodes, n, seed);
        debug!("cache ready in {:?}", started.elapsed());

        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn size(&self) -> u64 {
        (self.nodes.len() * NODE_BYTES) as u64
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, i: usize) -> Option<&Node> {
        self.nodes.get(i)
    }

    /// The cache as one contiguous byte string.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.nodes.iter().flat_map(|n| n.0).collect()
    }
}

impl core::fmt::Debug for Cache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cache").field("nodes", &self.nodes.len()).finish()
    }
}

/// Fills `nodes` with `n` cache nodes.
///
/// The hash chain is strictly sequential and so are the scramble rounds: node
/// `i` of a round reads node `i - 1` of the same round.
fn make_cache(nodes: &mut Vec<Node>, n: usize, seed: &H256) {
    nodes.push(Node::hash_of(seed.as_bytes()));
    for i in 1..n {
        let next = Node::hash_of(nodes[i - 1].as_bytes());
        nodes.push(next);
    }

    for _ in 0..CACHE_ROUNDS {
        for i in 0..n {
            let v = nodes[i].word(0) as usize % n;
            let prev = nodes[(i + n - 1) % n];
            nodes[i] = Node::hash_of(&(prev ^ nodes[v]).0);
        }
    }
}
