use ethereum_types::H256;
use log::trace;

use crate::cache::Cache;
use crate::dataset::calc_dataset_item;
use crate::difficulty::{check_difficulty, quick_check_difficulty};
use crate::error::{Error, Result};
use crate::hashimoto::{hashimoto, PowHash};
use crate::params::Params;

#[derive(Debug, Clone, Copy)]
struct Epoch {
    params: Params,
    block_number: u64,
    number: u64,
    full_size: u64,
}

/// Light client state: the cache of one epoch.
pub struct LightContext {
    cache: Cache,
    seed: H256,
    epoch: Option<Epoch>,
}

impl LightContext {
    /// Builds a cache of `cache_size` bytes from `seed`.
    pub fn new(cache_size: u64, seed: H256) -> Result<Self> {
        let cache = Cache::new(cache_size, &seed)?;
        Ok(Self {
            cache,
            seed,
            epoch: None,
        })
    }

    /// Builds the cache of the epoch holding `block_number`.
    ///
    /// The context remembers the epoch's dataset size and rejects any other
    /// size in [`compute`](Self::compute).
    pub fn for_block(params: &Params, block_number: u64) -> Result<Self> {
        let cache_size = params.cache_size(block_number)?;
        let full_size = params.dataset_size(block_number)?;
        let seed = params.seedhash(block_number)?;
        let mut light = Self::new(cache_size, seed)?;
        light.epoch = Some(Epoch {
            params: *params,
            block_number,
            number: params.epoch(block_number),
            full_size,
        });
        Ok(light)
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn cache_size(&self) -> u64 {
        self.cache.size()
    }

    pub fn seed(&self) -> &H256 {
        &self.seed
    }

    /// Block the context was built for, if built through
    /// [`for_block`](Self::for_block).
    pub fn block_number(&self) -> Option<u64> {
        self.epoch.map(|e| e.block_number)
    }

    pub fn epoch(&self) -> Option<u64> {
        self.epoch.map(|e| e.number)
    }

    /// Dataset size of the context's epoch, when known.
    pub fn expected_full_size(&self) -> Option<u64> {
        self.epoch.map(|e| e.full_size)
    }

    /// Whether `block_number` falls in the context's epoch. Always false for
    /// contexts built from a raw seed.
    pub fn is_valid_for(&self, block_number: u64) -> bool {
        self.epoch
            .map_or(false, |e| e.params.epoch(block_number) == e.number)
    }

    /// Hashimoto over a dataset of `full_size` bytes, recomputing every
    /// accessed node from the cache.
    pub fn compute(
        &self,
        full_size: u64,
        header_hash: &H256,
        nonce: u64,
    ) -> Result<PowHash> {
        self.check_full_size(full_size)?;
        hashimoto(header_hash, nonce, full_size, |i| {
            Ok(calc_dataset_item(&self.cache, i))
        })
    }

    /// Full verification of a submitted proof.
    ///
    /// Runs the cheap [`quick_check_difficulty`] first and only then the
    /// complete recomputation, which must reproduce `mix_hash` exactly.
    /// `Ok(false)` means the proof is invalid.
    pub fn verify(
        &self,
        full_size: u64,
        header_hash: &H256,
        nonce: u64,
        mix_hash: &H256,
        boundary: &H256,
    ) -> Result<bool> {
        self.check_full_size(full_size)?;
        if !quick_check_difficulty(header_hash, nonce, mix_hash, boundary) {
            trace!("nonce {:#x} rejected by quick check", nonce);
            return Ok(false);
        }
        let out = self.compute(full_size, header_hash, nonce)?;
        if out.mix_hash != *mix_hash {
            trace!("nonce {:#x} has a forged mix digest", nonce);
            return Ok(false);
        }
        Ok(check_difficulty(&out.result, boundary))
    }

    pub(crate) fn check_full_size(&self, full_size: u64) -> Result<()> {
        match self.epoch {
            Some(e) if e.full_size != full_size => Err(Error::invalid(format!(
                "dataset size {} does not match {} for epoch {}",
                full_size, e.full_size, e.number
            ))),
            _ => Ok(()),
        }
    }
}

impl core::fmt::Debug for LightContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LightContext")
            .field("cache_size", &self.cache_size())
            .field("seed", &self.seed)
            .field("epoch", &self.epoch())
            .finish()
    }
}
