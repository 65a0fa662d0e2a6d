use ethereum_types::{H256, U256};

use crate::hashimoto::{final_hash, seed_hash};
use crate::{h256_to_u256, u256_to_h256};

/// Returns whether `hash <= boundary`, both read as big-endian integers.
pub fn check_difficulty(hash: &H256, boundary: &H256) -> bool {
    for (h, b) in hash.as_bytes().iter().zip(boundary.as_bytes()) {
        if h != b {
            return h < b;
        }
    }
    true
}

/// Final hash for a claimed mix digest, without rerunning the mix.
pub fn quick_hash(header_hash: &H256, nonce: u64, mix_hash: &H256) -> H256 {
    let mut cmix = [0u8; 32];
    cmix.copy_from_slice(mix_hash.as_bytes());
    final_hash(&seed_hash(header_hash, nonce), &cmix)
}

/// Cheap admission filter for a submitted `(nonce, mix_hash)`.
///
/// Passing only means the claim *would* clear `boundary` if `mix_hash` were
/// genuine. Accept a proof only after a full recomputation, e.g.
/// [`LightContext::verify`](crate::LightContext::verify).
pub fn quick_check_difficulty(
    header_hash: &H256,
    nonce: u64,
    mix_hash: &H256,
    boundary: &H256,
) -> bool {
    check_difficulty(&quick_hash(header_hash, nonce, mix_hash), boundary)
}

/// `2^256 / difficulty`, saturating at `U256::MAX` for difficulty 0 and 1.
pub fn cross_boundary(difficulty: U256) -> U256 {
    if difficulty <= U256::one() {
        return U256::max_value();
    }
    // 2^256 = MAX + 1, so the quotient only grows when MAX % d == d - 1.
    let (q, r) = U256::max_value().div_mod(difficulty);
    if r == difficulty - 1 {
        q + 1
    } else {
        q
    }
}

pub fn boundary_from_difficulty(difficulty: U256) -> H256 {
    u256_to_h256(cross_boundary(difficulty))
}

/// Difficulty a hash satisfies, the inverse of [`cross_boundary`].
pub fn difficulty_of(hash: &H256) -> U256 {
    cross_boundary(h256_to_u256(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(b: &[u8]) -> H256 {
        let mut out = [0u8; 32];
        out[..b.len()].copy_from_slice(b);
        H256::from(out)
    }

    #[test]
    fn compares_big_endian() {
        assert!(check_difficulty(&h(&[0, 1]), &h(&[0, 2])));
        assert!(!check_difficulty(&h(&[0, 3]), &h(&[0, 2])));
        assert!(check_difficulty(&h(&[0, 2]), &h(&[0, 2])));
        // The first differing byte decides.
        assert!(check_difficulty(&h(&[1, 0xff]), &h(&[2, 0])));
        assert!(!check_difficulty(&H256::repeat_byte(0xff), &H256::zero()));
        assert!(check_difficulty(&H256::zero(), &H256::zero()));
    }

    #[test]
    fn larger_boundary_still_passes() {
        let hash = h(&[0, 0, 0x40, 0x12]);
        let boundaries = [
            h(&[0, 0, 0x40, 0x12]),
            h(&[0, 0, 0x40, 0x13]),
            h(&[0, 1]),
            H256::repeat_byte(0xff),
        ];
        for b in boundaries.iter() {
            assert!(check_difficulty(&hash, b));
        }
    }

    #[test]
    fn quick_check_is_check_of_quick_hash() {
        let header = H256::repeat_byte(0x11);
        let mix = H256::repeat_byte(0x22);
        let hash = quick_hash(&header, 99, &mix);
        for boundary in [H256::zero(), hash, H256::repeat_byte(0x80), H256::repeat_byte(0xff)] {
            assert_eq!(
                quick_check_difficulty(&header, 99, &mix, &boundary),
                check_difficulty(&hash, &boundary)
            );
        }
        assert!(quick_check_difficulty(&header, 99, &mix, &hash));
    }

    #[test]
    fn boundaries() {
        assert_eq!(cross_boundary(U256::zero()), U256::max_value());
        assert_eq!(cross_boundary(U256::one()), U256::max_value());
        assert_eq!(cross_boundary(U256::from(2)), U256::one() << 255);
        assert_eq!(cross_boundary(U256::from(3)), U256::max_value() / 3);
        assert_eq!(cross_boundary(U256::from(1u64 << 32)), U256::one() << 224);
        assert_eq!(boundary_from_difficulty(U256::from(256)), h(&[1]));
        assert_eq!(boundary_from_difficulty(U256::from(65536)), h(&[0, 1]));
        assert_eq!(difficulty_of(&h(&[1])), U256::from(256));
    }
}
