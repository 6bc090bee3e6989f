//! The huffman module builds the prefix tree and its code words, and moves the tree in and out of
//! the compressed file header.
//!
//! huffzip uses one static tree per file. The tree is built from the byte frequencies of the whole
//! input with a min-heap, the two lightest nodes being joined until a single root remains.
//!
pub mod header;
pub mod huffman;
pub mod min_heap;
