use core::ops::{BitXor, Deref};

use byteorder::{ByteOrder, LittleEndian};

use crate::{fnv, keccak_512, NODE_BYTES, NODE_WORDS};

/// A 64 byte cache or dataset entry.
///
/// Words are always little-endian views over the bytes. Reads and writes go
/// through indices, so no word view ever aliases a mutable byte view.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node(pub [u8; NODE_BYTES]);

impl Node {
    pub const fn zero() -> Self {
        Self([0u8; NODE_BYTES])
    }

    pub fn from_slice(b: &[u8]) -> Self {
        let mut inner = [0u8; NODE_BYTES];
        inner.copy_from_slice(b);
        Self(inner)
    }

    /// `H512(data)` as a node.
    pub fn hash_of(data: &[u8]) -> Self {
        Self(keccak_512(data))
    }

    pub fn word(&self, i: usize) -> u32 {
        LittleEndian::read_u32(&self.0[i * 4..])
    }

    pub fn set_word(&mut self, i: usize, v: u32) {
        LittleEndian::write_u32(&mut self.0[i * 4..], v);
    }

    pub fn double_word(&self, i: usize) -> u64 {
        LittleEndian::read_u64(&self.0[i * 8..])
    }

    pub fn words(&self) -> [u32; NODE_WORDS] {
        let mut out = [0u32; NODE_WORDS];
        LittleEndian::read_u32_into(&self.0, &mut out);
        out
    }

    pub fn from_words(words: &[u32; NODE_WORDS]) -> Self {
        let mut inner = [0u8; NODE_BYTES];
        LittleEndian::write_u32_into(words, &mut inner);
        Self(inner)
    }

    pub fn as_bytes(&self) -> &[u8; NODE_BYTES] {
        &self.0
    }

    /// Combines `other` into `self` word by word with [`fnv`].
    pub fn fnv_mix(&mut self, other: &Node) {
        for w in 0..NODE_WORDS {
            self.set_word(w, fnv(self.word(w), other.word(w)));
        }
    }

    /// Replaces the node with `H512` of its own bytes.
    pub fn rehash(&mut self) {
        *self = Self::hash_of(&self.0);
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::zero()
    }
}

impl core::fmt::Debug for Node {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Node(0x")?;
        for b in self.0.iter() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl BitXor for Node {
    type Output = Node;

    fn bitxor(mut self, rhs: Node) -> Node {
        self.0.iter_mut().zip(rhs.0.iter()).for_each(|(a, b)| *a ^= b);
        self
    }
}

impl Deref for Node {
    type Target = [u8; NODE_BYTES];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; NODE_BYTES]> for Node {
    fn from(b: [u8; NODE_BYTES]) -> Self {
        Self(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_little_endian() {
        let mut node = Node::zero();
        node.0[0] = 0x01;
        node.0[1] = 0x02;
        node.0[4] = 0xff;
        assert_eq!(node.word(0), 0x0201);
        assert_eq!(node.word(1), 0xff);
        assert_eq!(node.double_word(0), 0xff_0000_0201);

        node.set_word(15, 0xdead_beef);
        assert_eq!(&node.0[60..], &[0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(Node::from_words(&node.words()), node);
    }

    #[test]
    fn xor_and_fnv_mix() {
        let a = Node([0xaa; NODE_BYTES]);
        let b = Node([0x0f; NODE_BYTES]);
        assert_eq!((a ^ b).0, [0xa5; NODE_BYTES]);
        assert_eq!(a ^ a, Node::zero());

        let mut m = Node::zero();
        m.set_word(0, 1);
        let mut d = Node::zero();
        d.set_word(0, 7);
        m.fnv_mix(&d);
        assert_eq!(m.word(0), crate::FNV_PRIME ^ 7);
        assert_eq!(m.word(1), 0);
    }
}
