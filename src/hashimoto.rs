use byteorder::{ByteOrder, LittleEndian};
use ethereum_types::H256;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::{
    fnv, fnv_mix_hash, keccak_256, keccak_512, read_words, ACCESSES, MIX_BYTES,
    MIX_NODES, MIX_WORDS, NODE_BYTES, NODE_WORDS,
};

/// Output of one hashimoto run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PowHash {
    /// Compared against the boundary.
    pub result: H256,
    /// Compressed mix, published alongside the nonce.
    pub mix_hash: H256,
}

/// `H512(header_hash || nonce)`, the nonce as 8 little-endian bytes.
pub(crate) fn seed_hash(header_hash: &H256, nonce: u64) -> [u8; 64] {
    let mut seed = [0u8; 40];
    seed[..32].copy_from_slice(header_hash.as_bytes());
    seed[32..].copy_from_slice(&nonce.to_le_bytes());
    keccak_512(&seed)
}

/// `H256(seed || compressed_mix)`.
pub(crate) fn final_hash(seed: &[u8; 64], cmix: &[u8; 32]) -> H256 {
    let mut buf = [0u8; 96];
    buf[..64].copy_from_slice(seed);
    buf[64..].copy_from_slice(cmix);
    H256::from(keccak_256(&buf))
}

/// Number of mix-sized pages in a dataset of `full_size` bytes.
pub(crate) fn page_count(full_size: u64) -> Result<u32> {
    if full_size == 0 || full_size % MIX_BYTES as u64 != 0 {
        return Err(Error::invalid(format!(
            "dataset size {} is not a non-zero multiple of {}",
            full_size, MIX_BYTES
        )));
    }
    if full_size / NODE_BYTES as u64 > u32::MAX as u64 {
        return Err(Error::invalid(format!(
            "dataset size {} exceeds the 32-bit node index space",
            full_size
        )));
    }
    Ok((full_size / MIX_BYTES as u64) as u32)
}

/// The mixing loop shared by light and full clients.
///
/// `lookup` returns dataset node `i`: recomputed from the cache by a light
/// client, read from storage by a full one. `full_size` is always the size of
/// the whole dataset, even in light mode.
pub fn hashimoto<F>(
    header_hash: &H256,
    nonce: u64,
    full_size: u64,
    lookup: F,
) -> Result<PowHash>
where
    F: Fn(u32) -> Result<Node>,
{
    let pages = page_count(full_size)?;
    let seed = seed_hash(header_hash, nonce);
    let seed_head = LittleEndian::read_u32(&seed);

    let seed_words: [u32; NODE_WORDS] = read_words(&seed);
    let mut mix = [0u32; MIX_WORDS];
    for (i, w) in mix.iter_mut().enumerate() {
        *w = seed_words[i % NODE_WORDS];
    }

    let mut temp = [0u32; MIX_WORDS];
    for i in 0..ACCESSES {
        let page = fnv(i as u32 ^ seed_head, mix[i % MIX_WORDS]) % pages;
        for n in 0..MIX_NODES {
            let node = lookup(page * MIX_NODES as u32 + n as u32)?;
            temp[n * NODE_WORDS..(n + 1) * NODE_WORDS].copy_from_slice(&node.words());
        }
        fnv_mix_hash(&mut mix, &temp);
    }

    let mut cmix = [0u8; 32];
    for (i, w) in mix.chunks_exact(4).enumerate() {
        let reduced = fnv(fnv(fnv(w[0], w[1]), w[2]), w[3]);
        LittleEndian::write_u32(&mut cmix[i * 4..], reduced);
    }

    Ok(PowHash {
        result: final_hash(&seed, &cmix),
        mix_hash: H256::from(cmix),
    })
}
