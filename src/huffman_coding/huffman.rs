use std::cmp::Ordering;

use log::trace;
use rustc_hash::FxHashMap;

use super::min_heap::MinHeap;
use crate::error::HuffError;
use crate::tools::freq_count::FreqTable;

/// A node of the prefix tree. Internal nodes own both children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        byte: u8,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } | HuffNode::Internal { weight, .. } => *weight,
        }
    }

    /// Join two subtrees under a new internal node. `left` takes the 0 edge.
    pub fn merge(left: HuffNode, right: HuffNode) -> HuffNode {
        HuffNode::Internal {
            weight: left.weight().saturating_add(right.weight()),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Same shape and same leaf bytes. Weights are not compared.
    pub fn same_shape(&self, other: &HuffNode) -> bool {
        match (self, other) {
            (HuffNode::Leaf { byte: a, .. }, HuffNode::Leaf { byte: b, .. }) => a == b,
            (
                HuffNode::Internal {
                    left: l1, right: r1, ..
                },
                HuffNode::Internal {
                    left: l2, right: r2, ..
                },
            ) => l1.same_shape(l2) && r1.same_shape(r2),
            _ => false,
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            HuffNode::Leaf { .. } => 1,
            HuffNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Walk the tree and record each leaf's root-to-leaf path as its code word.
    fn collect_codes(&self, code: CodeWord, table: &mut FxHashMap<u8, CodeWord>) {
        match self {
            HuffNode::Leaf { byte, .. } => {
                table.insert(*byte, code);
            }
            HuffNode::Internal { left, right, .. } => {
                left.collect_codes(code.child(false), table);
                right.collect_codes(code.child(true), table);
            }
        }
    }
}

/// Heap entry for tree construction. Ties on weight go to the entry inserted first.
#[derive(Debug)]
struct Pending {
    weight: u64,
    seq: usize,
    node: HuffNode,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then(self.seq.cmp(&other.seq))
    }
}

/// A complete prefix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffTree {
    root: HuffNode,
}

impl HuffTree {
    /// Wrap an existing root, e.g. one rebuilt from a header.
    pub fn from_root(root: HuffNode) -> Self {
        Self { root }
    }

    /// Build the optimal tree for `freqs`. Fails with `EmptyInput` when no byte occurs.
    pub fn from_freqs(freqs: &FreqTable) -> Result<Self, HuffError> {
        let distinct = freqs.distinct();
        if distinct == 0 {
            return Err(HuffError::EmptyInput);
        }

        let mut heap = MinHeap::with_capacity(distinct);
        let mut seq = 0;
        for (byte, weight) in freqs.iter() {
            heap.insert(Pending {
                weight,
                seq,
                node: HuffNode::Leaf { byte, weight },
            });
            seq += 1;
        }

        // Pull off the two lightest nodes and join them, first extracted on the left.
        for _ in 0..distinct - 1 {
            let left = heap.delete_min()?;
            let right = heap.delete_min()?;
            let node = HuffNode::merge(left.node, right.node);
            heap.insert(Pending {
                weight: node.weight(),
                seq,
                node,
            });
            seq += 1;
        }

        let root = heap.delete_min()?.node;
        trace!("Built tree with {} leaves, weight {}", distinct, root.weight());
        Ok(Self { root })
    }

    pub fn root(&self) -> &HuffNode {
        &self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    pub fn same_shape(&self, other: &HuffTree) -> bool {
        self.root.same_shape(&other.root)
    }

    /// Derive the byte to code word table. A tree that is a single leaf gets the one-bit code `0`,
    /// so every input byte still costs one body bit.
    pub fn encoding_table(&self) -> EncodingTable {
        let mut codes = FxHashMap::default();
        match &self.root {
            HuffNode::Leaf { byte, .. } => {
                codes.insert(*byte, CodeWord::root().child(false));
            }
            root => root.collect_codes(CodeWord::root(), &mut codes),
        }
        EncodingTable { codes }
    }
}

/// A code word: `len` bits, right-aligned in `bits`, first bit most significant.
/// Trees built from 64-bit counts are never deeper than 128 levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeWord {
    bits: u128,
    len: u8,
}

impl CodeWord {
    /// The empty code word at the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// The code word one edge further down: `false` for left, `true` for right.
    pub fn child(self, bit: bool) -> Self {
        Self {
            bits: self.bits << 1 | bit as u128,
            len: self.len.saturating_add(1),
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bits in transmission order.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len as u32)
            .rev()
            .map(move |i| self.bits.checked_shr(i).unwrap_or(0) & 1 == 1)
    }

    /// True if `self` is a prefix of (or equal to) `other`.
    pub fn is_prefix_of(&self, other: &CodeWord) -> bool {
        self.len <= other.len
            && other
                .bits
                .checked_shr((other.len - self.len) as u32)
                .unwrap_or(0)
                == self.bits
    }
}

impl std::fmt::Display for CodeWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for bit in self.bits() {
            write!(f, "{}", bit as u8)?;
        }
        Ok(())
    }
}

/// Byte value to code word, one entry per leaf of the tree it came from.
#[derive(Debug, Clone)]
pub struct EncodingTable {
    codes: FxHashMap<u8, CodeWord>,
}

impl EncodingTable {
    pub fn get(&self, byte: u8) -> Option<&CodeWord> {
        self.codes.get(&byte)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// (byte, code) pairs in ascending byte order.
    pub fn entries(&self) -> Vec<(u8, CodeWord)> {
        let mut entries: Vec<(u8, CodeWord)> = self.codes.iter().map(|(&b, &c)| (b, c)).collect();
        entries.sort_unstable_by_key(|&(b, _)| b);
        entries
    }

    /// No code word is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let entries = self.entries();
        entries.iter().enumerate().all(|(i, (_, a))| {
            entries
                .iter()
                .enumerate()
                .all(|(j, (_, b))| i == j || !a.is_prefix_of(b))
        })
    }

    /// Number of body bits needed to encode a source with these frequencies. None if a byte
    /// present in `freqs` has no code.
    pub fn body_bits(&self, freqs: &FreqTable) -> Option<u128> {
        freqs.iter().try_fold(0_u128, |acc, (byte, count)| {
            let len = self.get(byte)?.len() as u128;
            Some(acc + len * count as u128)
        })
    }

    /// Pad bits the final body byte will carry: (8 - body_bits mod 8) mod 8.
    pub fn trailing_bits(&self, freqs: &FreqTable) -> Option<u8> {
        self.body_bits(freqs)
            .map(|bits| (8 - (bits % 8) as u8) % 8)
    }

    /// Log the table, one line per byte.
    pub fn report(&self) {
        for (byte, code) in self.entries() {
            trace!("{:#04x} {:>3} {}", byte, code.len(), code);
        }
    }
}
