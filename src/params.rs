//! Per-epoch size schedule and chain tuning parameters.

use ethereum_types::H256;

use crate::error::{Error, Result};
use crate::miller_rabin::is_prime;
use crate::{keccak_256, MIX_BYTES, NODE_BYTES};

pub const EPOCH_LENGTH: u64 = 30_000;
pub const CACHE_BYTES_INIT: u64 = 1 << 24;
pub const CACHE_BYTES_GROWTH: u64 = 1 << 17;
pub const DATASET_BYTES_INIT: u64 = 1 << 30;
pub const DATASET_BYTES_GROWTH: u64 = 1 << 23;
pub const MAX_EPOCH: u64 = 2048;

/// Growth constants of a chain.
///
/// Light and full clients of one chain must agree on these bit for bit, since
/// every size and seed is a function of them and the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Params {
    /// Blocks per epoch.
    pub epoch_length: u64,
    pub cache_bytes_init: u64,
    pub cache_bytes_growth: u64,
    pub dataset_bytes_init: u64,
    pub dataset_bytes_growth: u64,
    /// Highest epoch the schedule will size. Anything past it is a
    /// configuration error.
    pub max_epoch: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            epoch_length: EPOCH_LENGTH,
            cache_bytes_init: CACHE_BYTES_INIT,
            cache_bytes_growth: CACHE_BYTES_GROWTH,
            dataset_bytes_init: DATASET_BYTES_INIT,
            dataset_bytes_growth: DATASET_BYTES_GROWTH,
            max_epoch: MAX_EPOCH,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        if self.epoch_length == 0 {
            return Err(Error::invalid("epoch length must be non-zero"));
        }
        // Need room for at least one odd candidate below the initial size.
        if self.cache_bytes_init < 4 * NODE_BYTES as u64 {
            return Err(Error::invalid(format!(
                "initial cache size {} is below {} bytes",
                self.cache_bytes_init,
                4 * NODE_BYTES
            )));
        }
        if self.dataset_bytes_init < 4 * MIX_BYTES as u64 {
            return Err(Error::invalid(format!(
                "initial dataset size {} is below {} bytes",
                self.dataset_bytes_init,
                4 * MIX_BYTES
            )));
        }
        Ok(())
    }

    pub fn epoch(&self, block_number: u64) -> u64 {
        block_number / self.epoch_length
    }

    /// Cache size in bytes for the epoch of `block_number`.
    pub fn cache_size(&self, block_number: u64) -> Result<u64> {
        let epoch = self.checked_epoch(block_number)?;
        prime_size(
            self.cache_bytes_init,
            self.cache_bytes_growth,
            epoch,
            NODE_BYTES as u64,
        )
    }

    /// Dataset size in bytes for the epoch of `block_number`.
    pub fn dataset_size(&self, block_number: u64) -> Result<u64> {
        let epoch = self.checked_epoch(block_number)?;
        prime_size(
            self.dataset_bytes_init,
            self.dataset_bytes_growth,
            epoch,
            MIX_BYTES as u64,
        )
    }

    pub fn seedhash(&self, block_number: u64) -> Result<H256> {
        let epoch = self.checked_epoch(block_number)?;
        Ok(get_seedhash(epoch))
    }

    fn checked_epoch(&self, block_number: u64) -> Result<u64> {
        self.validate()?;
        let epoch = self.epoch(block_number);
        if epoch > self.max_epoch {
            return Err(Error::EpochOutOfRange {
                epoch,
                max: self.max_epoch,
            });
        }
        Ok(epoch)
    }
}

/// `init + growth * epoch`, stepped down to the nearest `unit` multiple whose
/// quotient by `unit` is prime.
fn prime_size(init: u64, growth: u64, epoch: u64, unit: u64) -> Result<u64> {
    let mut sz = growth
        .checked_mul(epoch)
        .and_then(|g| g.checked_add(init))
        .ok_or_else(|| Error::invalid(format!("size overflows u64 at epoch {}", epoch)))?;
    sz -= sz % unit;
    if (sz / unit) % 2 == 0 {
        sz -= unit;
    }
    while !is_prime(sz / unit) {
        sz = sz.checked_sub(2 * unit).ok_or_else(|| {
            Error::invalid("no prime size below the configured initial size")
        })?;
    }
    Ok(sz)
}

/// Seed of `epoch`: Keccak-256 applied `epoch` times to 32 zero bytes.
pub fn get_seedhash(epoch: u64) -> H256 {
    let mut s = [0u8; 32];
    for _ in 0..epoch {
        s = keccak_256(&s);
    }
    H256::from(s)
}
