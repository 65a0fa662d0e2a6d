//! Apache-2 licensed memory-hard proof-of-work.
//!
//! A light client holds only the per-epoch [`Cache`] and recomputes dataset
//! nodes on demand; a full client materializes the whole dataset once and
//! looks nodes up directly. Both produce bit-identical results:
//!
//! ```no_run
//! use ccmash::{LightContext, Params};
//! use ethereum_types::H256;
//!
//! let params = Params::default();
//! let light = LightContext::for_block(&params, 22)?;
//! let full_size = params.dataset_size(22)?;
//! let out = light.compute(full_size, &H256::zero(), 0)?;
//! assert_eq!(ccmash::quick_hash(&H256::zero(), 0, &out.mix_hash), out.result);
//! # Ok::<(), ccmash::Error>(())
//! ```
//!
//! H512 and H256 are the pre-standard Keccak-512 and Keccak-256, not SHA3.

use byteorder::{ByteOrder, LittleEndian};
use ethereum_types::{H256, U256};
use sha3::{Digest, Keccak256, Keccak512};

mod cache;
mod dataset;
mod difficulty;
mod error;
mod full;
mod hashimoto;
mod light;
mod miller_rabin;
mod node;
mod params;
mod storage;

pub use cache::Cache;
pub use dataset::{calc_dataset_item, DatasetBuilder};
pub use difficulty::{
    boundary_from_difficulty, check_difficulty, cross_boundary, difficulty_of,
    quick_check_difficulty, quick_hash,
};
pub use error::{AdoptError, Error, Result};
pub use full::{FullContext, Solution};
pub use hashimoto::{hashimoto, PowHash};
pub use light::LightContext;
pub use miller_rabin::is_prime;
pub use node::Node;
pub use params::{
    get_seedhash, Params, CACHE_BYTES_GROWTH, CACHE_BYTES_INIT,
    DATASET_BYTES_GROWTH, DATASET_BYTES_INIT, EPOCH_LENGTH, MAX_EPOCH,
};
pub use storage::{DatasetStorage, FileStorage, MemoryStorage, StorageLocation};

pub const NODE_BYTES: usize = 64;
pub const NODE_WORDS: usize = NODE_BYTES / WORD_BYTES;
pub const MIX_BYTES: usize = 128;
pub const MIX_WORDS: usize = MIX_BYTES / WORD_BYTES;
pub const MIX_NODES: usize = MIX_WORDS / NODE_WORDS;
pub const WORD_BYTES: usize = 4;
pub const DATASET_PARENTS: u32 = 256;
pub const CACHE_ROUNDS: usize = 3;
pub const ACCESSES: usize = 64;

pub const FNV_PRIME: u32 = 0x01000193;

/// Multiply-xor word combiner. Not a hash.
pub fn fnv(v1: u32, v2: u32) -> u32 {
    v1.wrapping_mul(FNV_PRIME) ^ v2
}

pub fn fnv_mix_hash(mix: &mut [u32; MIX_WORDS], data: &[u32; MIX_WORDS]) {
    for (m, d) in mix.iter_mut().zip(data.iter()) {
        *m = fnv(*m, *d);
    }
}

pub fn keccak_512(data: &[u8]) -> [u8; 64] {
    let mut output = [0u8; 64];
    output.copy_from_slice(&Keccak512::digest(data));
    output
}

pub fn keccak_256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Keccak256::digest(data));
    output
}

/// Parses a 32 byte hash, rejecting any other length.
pub fn hash_from_slice(b: &[u8]) -> Result<H256> {
    if b.len() != 32 {
        return Err(Error::InvalidParameters(format!(
            "expected a 32 byte hash, got {} bytes",
            b.len()
        )));
    }
    Ok(H256::from_slice(b))
}

pub fn epoch(block_number: u64) -> u64 {
    Params::default().epoch(block_number)
}

/// Cache size in bytes for `block_number` under the default [`Params`].
pub fn get_cache_size(block_number: u64) -> Result<u64> {
    Params::default().cache_size(block_number)
}

/// Dataset size in bytes for `block_number` under the default [`Params`].
pub fn get_full_size(block_number: u64) -> Result<u64> {
    Params::default().dataset_size(block_number)
}

pub(crate) fn u256_to_h256(v: U256) -> H256 {
    let mut out = [0u8; 32];
    v.to_big_endian(&mut out);
    H256::from(out)
}

pub(crate) fn h256_to_u256(h: &H256) -> U256 {
    U256::from_big_endian(h.as_bytes())
}

pub(crate) fn read_words<const N: usize>(bytes: &[u8]) -> [u32; N] {
    let mut out = [0u32; N];
    LittleEndian::read_u32_into(&bytes[..N * WORD_BYTES], &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn keccak_empty() {
        assert_eq!(
            keccak_256(&[]),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
        assert_eq!(
            keccak_512(&[]),
            hex!(
                "0eab42de4c3ceb9235fc91acffe746b29c29a8c366b7c60e4e67c466f36a4304"
                "c00fa9caf9d87976ba469bcbe06713b435f091ef2769fb160cdab33d3670680e"
            )
        );
    }

    #[test]
    fn fnv_wraps() {
        assert_eq!(fnv(0, 5), 5);
        assert_eq!(fnv(1, 0), FNV_PRIME);
        assert_eq!(fnv(u32::MAX, 0), u32::MAX.wrapping_mul(FNV_PRIME));
    }

    #[test]
    fn hash_from_slice_checks_length() {
        assert!(hash_from_slice(&[0u8; 31]).is_err());
        assert!(hash_from_slice(&[0u8; 33]).is_err());
        assert_eq!(hash_from_slice(&[1u8; 32]).unwrap(), H256::repeat_byte(1));
    }

    #[test]
    fn default_schedule() {
        assert_eq!(epoch(29_999), 0);
        assert_eq!(epoch(30_000), 1);
        assert_eq!(get_cache_size(0).unwrap(), 16_776_896);
        assert_eq!(get_full_size(0).unwrap(), 1_073_739_904);
    }
}
