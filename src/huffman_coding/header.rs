//! Header codec: the tree shape, written preorder as bits.
//!
//! ```text
//! leaf := 1 <8 bits: byte value, MSB first>
//! node := 0 <left:tree> <right:tree>
//! ```
//!
//! Weights are not stored. The encoded tree is padded with 0 bits to a byte boundary.

use std::io::{self, Write};

use super::huffman::{HuffNode, HuffTree};
use crate::bitstream::bitreader::BitReader;
use crate::bitstream::bitwriter::BitWriter;
use crate::error::HuffError;

/// Largest possible tree region: 256 leaves and 255 internal nodes is 2559 bits.
pub const MAX_TREE_BYTES: usize = 320;

/// Deepest legal tree, a chain over all 256 byte values.
const MAX_DEPTH: usize = 255;

/// Placeholder weight given to rebuilt leaves. Decoding only needs the shape.
const REBUILT_WEIGHT: u64 = 1;

/// Write `node` and everything below it, preorder.
pub fn write_tree<W: Write>(bw: &mut BitWriter<W>, node: &HuffNode) -> io::Result<()> {
    match node {
        HuffNode::Leaf { byte, .. } => {
            bw.write_bit(true)?;
            bw.write_byte(*byte)
        }
        HuffNode::Internal { left, right, .. } => {
            bw.write_bit(false)?;
            write_tree(bw, left)?;
            write_tree(bw, right)
        }
    }
}

/// Read one subtree. Running out of bits anywhere inside it is a malformed header.
pub fn read_tree(br: &mut BitReader) -> Result<HuffNode, HuffError> {
    let mut seen = [false; 256];
    read_node(br, 0, &mut seen)
}

fn read_node(br: &mut BitReader, depth: usize, seen: &mut [bool; 256]) -> Result<HuffNode, HuffError> {
    if depth > MAX_DEPTH {
        return Err(HuffError::malformed(format!(
            "tree deeper than {} levels at {}",
            MAX_DEPTH,
            br.loc()
        )));
    }
    match br.bit() {
        Some(true) => {
            let byte = br
                .byte()
                .ok_or_else(|| HuffError::malformed(format!("leaf cut short at {}", br.loc())))?;
            if std::mem::replace(&mut seen[byte as usize], true) {
                return Err(HuffError::malformed(format!(
                    "byte {:#04x} appears in two leaves",
                    byte
                )));
            }
            Ok(HuffNode::Leaf {
                byte,
                weight: REBUILT_WEIGHT,
            })
        }
        Some(false) => {
            let left = read_node(br, depth + 1, seen)?;
            let right = read_node(br, depth + 1, seen)?;
            Ok(HuffNode::merge(left, right))
        }
        None => Err(HuffError::malformed(format!(
            "tree ended early at {}",
            br.loc()
        ))),
    }
}

/// Serialize `tree` into a byte-aligned header region.
pub fn encode_header(tree: &HuffTree) -> io::Result<Vec<u8>> {
    let mut bw = BitWriter::new(Vec::with_capacity(MAX_TREE_BYTES));
    write_tree(&mut bw, tree.root())?;
    bw.finish()
}

/// Rebuild a tree from a header region. The padding after the tree is discarded; any whole
/// byte left over means the region does not hold exactly one tree.
pub fn decode_header(region: Vec<u8>) -> Result<HuffTree, HuffError> {
    if region.len() > MAX_TREE_BYTES {
        return Err(HuffError::malformed(format!(
            "tree region of {} bytes exceeds {}",
            region.len(),
            MAX_TREE_BYTES
        )));
    }
    let mut br = BitReader::new(region);
    let root = read_tree(&mut br)?;
    br.skip_to_byte_boundary();
    if br.bytes_left() > 0 {
        return Err(HuffError::malformed(format!(
            "{} bytes left over after the tree",
            br.bytes_left()
        )));
    }
    Ok(HuffTree::from_root(root))
}
