use std::ops::ControlFlow;

use ethereum_types::H256;
use log::{info, warn};

use crate::dataset::DatasetBuilder;
use crate::difficulty::check_difficulty;
use crate::error::{AdoptError, Error, Result};
use crate::hashimoto::{hashimoto, PowHash};
use crate::light::LightContext;
use crate::node::Node;
use crate::storage::{DatasetStorage, StorageLocation};

/// A nonce that clears the boundary, with its proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub mix_hash: H256,
    pub result: H256,
}

/// Full client state: a materialized dataset plus the light context it was
/// generated from, which the full context owns from then on.
pub struct FullContext {
    light: LightContext,
    storage: Box<dyn DatasetStorage>,
    seed_hash: H256,
    full_size: u64,
}

impl FullContext {
    /// Generates the dataset of `full_size` bytes at `location`.
    ///
    /// On success the context adopts `light`. On failure `light` comes back
    /// inside the [`AdoptError`] and anything allocated here, a partially
    /// written file included, has been released.
    pub fn new<F>(
        location: StorageLocation,
        seed_hash: H256,
        full_size: u64,
        light: LightContext,
        progress: F,
    ) -> std::result::Result<Self, AdoptError>
    where
        F: FnMut(u32) -> ControlFlow<()>,
    {
        match generate(&location, &seed_hash, full_size, &light, progress) {
            Ok(storage) => Ok(Self {
                light,
                storage,
                seed_hash,
                full_size,
            }),
            Err(error) => Err(AdoptError { error, light }),
        }
    }

    pub fn light(&self) -> &LightContext {
        &self.light
    }

    pub fn seed_hash(&self) -> &H256 {
        &self.seed_hash
    }

    pub fn full_size(&self) -> u64 {
        self.full_size
    }

    /// Releases the dataset and hands back the light context.
    pub fn into_light(self) -> LightContext {
        self.light
    }

    pub fn dataset_node(&self, index: u64) -> Result<Node> {
        Ok(self.storage.read_node(index)?)
    }

    pub fn is_valid_for(&self, block_number: u64) -> bool {
        self.light.is_valid_for(block_number)
    }

    /// Hashimoto reading dataset nodes directly from storage.
    pub fn compute(
        &self,
        full_size: u64,
        header_hash: &H256,
        nonce: u64,
    ) -> Result<PowHash> {
        if full_size != self.full_size {
            return Err(Error::invalid(format!(
                "dataset size {} does not match the generated {}",
                full_size, self.full_size
            )));
        }
        hashimoto(header_hash, nonce, full_size, |i| {
            Ok(self.storage.read_node(i as u64)?)
        })
    }

    /// Tries up to `attempts` nonces from `start_nonce` on, wrapping at
    /// `u64::MAX`, and returns the lowest one whose result clears `boundary`.
    pub fn mine(
        &self,
        header_hash: &H256,
        start_nonce: u64,
        boundary: &H256,
        attempts: u64,
    ) -> Result<Option<Solution>> {
        let attempt = |k: u64| -> Result<Option<Solution>> {
            let nonce = start_nonce.wrapping_add(k);
            let out = self.compute(self.full_size, header_hash, nonce)?;
            Ok(check_difficulty(&out.result, boundary).then_some(Solution {
                nonce,
                mix_hash: out.mix_hash,
                result: out.result,
            }))
        };
        search(attempts, attempt)
    }
}

#[cfg(feature = "parallel")]
fn search<F>(attempts: u64, attempt: F) -> Result<Option<Solution>>
where
    F: Fn(u64) -> Result<Option<Solution>> + Send + Sync,
{
    use rayon::prelude::*;
    (0..attempts)
        .into_par_iter()
        .map(attempt)
        .find_map_first(Result::transpose)
        .transpose()
}

#[cfg(not(feature = "parallel"))]
fn search<F>(attempts: u64, attempt: F) -> Result<Option<Solution>>
where
    F: Fn(u64) -> Result<Option<Solution>>,
{
    for k in 0..attempts {
        if let Some(solution) = attempt(k)? {
            return Ok(Some(solution));
        }
    }
    Ok(None)
}

fn generate<F>(
    location: &StorageLocation,
    seed_hash: &H256,
    full_size: u64,
    light: &LightContext,
    progress: F,
) -> Result<Box<dyn DatasetStorage>>
where
    F: FnMut(u32) -> ControlFlow<()>,
{
    if seed_hash != light.seed() {
        return Err(Error::invalid(format!(
            "seed hash {:?} does not match the cache seed {:?}",
            seed_hash,
            light.seed()
        )));
    }
    light.check_full_size(full_size)?;
    let builder = DatasetBuilder::new(light.cache(), full_size)?;

    let mut storage = location.open(full_size)?;
    let built = builder
        .build(storage.as_mut(), progress)
        .and_then(|_| storage.flush().map_err(Error::from));
    match built {
        Ok(()) => {
            info!("dataset ready at {:?}", location);
            Ok(storage)
        }
        Err(e) => {
            if let Err(rm) = storage.discard() {
                warn!("releasing partial dataset failed: {}", rm);
            }
            Err(e)
        }
    }
}

impl core::fmt::Debug for FullContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FullContext")
            .field("seed_hash", &self.seed_hash)
            .field("full_size", &self.full_size)
            .field("light", &self.light)
            .finish()
    }
}
