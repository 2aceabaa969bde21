//! Append-only commitment accumulator
//!
//! A fixed-depth binary Merkle tree over note commitments, rebuilt
//! off-chain by replaying the pool's ordered deposit log. Unfilled slots
//! are covered by a deterministic ladder of zero-subtree hashes so the
//! root over n leaves equals the root of the full 2^20 padded tree.

use serde::{Deserialize, Serialize};

use crate::crypto::field::Element;
use crate::crypto::mimc::MimcSponge;
use crate::error::PoolError;

/// Depth of the commitment tree; capacity 2^20 deposits.
pub const TREE_DEPTH: usize = 20;

/// Zero-subtree hashes for unfilled slots.
///
/// `result[0] = hash2(0, 0)` is the parent of two empty leaves;
/// `result[i] = hash2(result[i-1], result[i-1])` covers a vacant subtree of
/// height i+1. An empty leaf itself is the zero element.
pub fn zero_hashes(sponge: &MimcSponge, levels: usize) -> Vec<Element> {
    let mut hashes = Vec::with_capacity(levels);
    let zero = Element::zero();
    let mut current = sponge.hash2(&zero, &zero);
    hashes.push(current);
    for _ in 1..levels {
        current = sponge.hash2(&current, &current);
        hashes.push(current);
    }
    hashes
}

/// Sibling hashes and direction bits proving a leaf belongs under a root.
///
/// `directions[i]` is true when the path node at level i is a right child,
/// i.e. the sibling is the left operand. Derived on demand, not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    pub leaf_index: u32,
    pub siblings: Vec<Element>,
    pub directions: Vec<bool>,
}

impl MerklePath {
    /// Fold a leaf up the path and return the implied root.
    pub fn compute_root(&self, leaf: &Element, sponge: &MimcSponge) -> Element {
        let mut current = *leaf;
        for (sibling, is_right) in self.siblings.iter().zip(&self.directions) {
            current = if *is_right {
                sponge.hash2(sibling, &current)
            } else {
                sponge.hash2(&current, sibling)
            };
        }
        current
    }

    pub fn verify(&self, leaf: &Element, root: &Element, sponge: &MimcSponge) -> bool {
        self.compute_root(leaf, sponge) == *root
    }
}

/// The rebuilt accumulator. Leaves are commitments in deposit order; the
/// authoritative copy of the root lives on-chain and must be compared
/// against before any proof is generated.
pub struct MerkleTree {
    depth: usize,
    leaves: Vec<Element>,
    zeros: Vec<Element>,
    sponge: MimcSponge,
}

impl MerkleTree {
    pub fn new(depth: usize) -> Self {
        let sponge = MimcSponge::new();
        let zeros = zero_hashes(&sponge, depth);
        Self {
            depth,
            leaves: Vec::new(),
            zeros,
            sponge,
        }
    }

    pub fn with_leaves(depth: usize, leaves: Vec<Element>) -> Result<Self, PoolError> {
        if leaves.len() > 1usize << depth {
            return Err(PoolError::TreeFull);
        }
        let mut tree = Self::new(depth);
        tree.leaves = leaves;
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn leaves(&self) -> &[Element] {
        &self.leaves
    }

    /// Append a commitment; returns its leaf index.
    pub fn insert(&mut self, leaf: Element) -> Result<u32, PoolError> {
        if self.leaves.len() >= 1usize << self.depth {
            return Err(PoolError::TreeFull);
        }
        self.leaves.push(leaf);
        Ok((self.leaves.len() - 1) as u32)
    }

    /// First leaf index holding this commitment. High-entropy note
    /// generation makes duplicate commitments negligible, so first match
    /// is sufficient.
    pub fn find_leaf_index(&self, commitment: &Element) -> Option<usize> {
        self.leaves.iter().position(|leaf| leaf == commitment)
    }

    /// The zero node covering a vacant slot at the given level
    /// (level 0 = leaves).
    fn zero_at(&self, level: usize) -> Element {
        if level == 0 {
            Element::zero()
        } else {
            self.zeros[level - 1]
        }
    }

    /// Root of the tree as padded to the full 2^depth leaf count.
    pub fn root(&self) -> Element {
        let mut nodes = self.leaves.clone();
        for level in 0..self.depth {
            nodes = self.parent_level(&nodes, level);
        }
        nodes.first().copied().unwrap_or_else(|| self.zero_at(self.depth))
    }

    /// Sibling path for the leaf at `leaf_index`.
    pub fn path(&self, leaf_index: usize) -> Result<MerklePath, PoolError> {
        if leaf_index >= self.leaves.len() {
            return Err(PoolError::LeafOutOfRange {
                index: leaf_index,
                len: self.leaves.len(),
            });
        }

        let mut siblings = Vec::with_capacity(self.depth);
        let mut directions = Vec::with_capacity(self.depth);
        let mut nodes = self.leaves.clone();
        let mut index = leaf_index;

        for level in 0..self.depth {
            let sibling_index = index ^ 1;
            let sibling = nodes
                .get(sibling_index)
                .copied()
                .unwrap_or_else(|| self.zero_at(level));
            siblings.push(sibling);
            directions.push(index & 1 == 1);

            nodes = self.parent_level(&nodes, level);
            index >>= 1;
        }

        Ok(MerklePath {
            leaf_index: leaf_index as u32,
            siblings,
            directions,
        })
    }

    /// Pairwise-hash one level into the next, zero-padding a missing right
    /// operand.
    fn parent_level(&self, nodes: &[Element], level: usize) -> Vec<Element> {
        let mut parents = Vec::with_capacity((nodes.len() + 1) / 2);
        for pair in nodes.chunks(2) {
            let left = pair[0];
            let right = pair.get(1).copied().unwrap_or_else(|| self.zero_at(level));
            parents.push(self.sponge.hash2(&left, &right));
        }
        parents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn random_leaf() -> Element {
        Element::random(&mut OsRng)
    }

    #[test]
    fn test_zero_hash_ladder() {
        let sponge = MimcSponge::new();
        let zeros = zero_hashes(&sponge, TREE_DEPTH);
        assert_eq!(zeros.len(), TREE_DEPTH);

        let zero = Element::zero();
        assert_eq!(zeros[0], sponge.hash2(&zero, &zero));
        for i in 1..TREE_DEPTH {
            assert_eq!(zeros[i], sponge.hash2(&zeros[i - 1], &zeros[i - 1]));
        }
    }

    #[test]
    fn test_empty_tree_root_is_zero_subtree() {
        let tree = MerkleTree::new(TREE_DEPTH);
        let sponge = MimcSponge::new();
        let zeros = zero_hashes(&sponge, TREE_DEPTH);
        assert_eq!(tree.root(), zeros[TREE_DEPTH - 1]);
    }

    #[test]
    fn test_single_leaf_root_matches_manual_fold() {
        // One leaf folded manually against 20 levels of zero hashes.
        let sponge = MimcSponge::new();
        let leaf = random_leaf();

        let mut tree = MerkleTree::new(TREE_DEPTH);
        tree.insert(leaf).unwrap();

        let mut expected = sponge.hash2(&leaf, &Element::zero());
        let zeros = zero_hashes(&sponge, TREE_DEPTH);
        for zero in zeros.iter().take(TREE_DEPTH - 1) {
            expected = sponge.hash2(&expected, zero);
        }

        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn test_path_shape_for_second_leaf() {
        // For leaves [c0, c1, c2], the path for c1 starts as a right child
        // with c0 as its first sibling.
        let c0 = random_leaf();
        let c1 = random_leaf();
        let c2 = random_leaf();
        let tree = MerkleTree::with_leaves(TREE_DEPTH, vec![c0, c1, c2]).unwrap();

        let path = tree.path(1).unwrap();
        assert!(path.directions[0]);
        assert_eq!(path.siblings[0], c0);
    }

    #[test]
    fn test_paths_verify_against_root() {
        let sponge = MimcSponge::new();
        let leaves: Vec<Element> = (0..5).map(|_| random_leaf()).collect();
        let tree = MerkleTree::with_leaves(TREE_DEPTH, leaves.clone()).unwrap();
        let root = tree.root();

        for (i, leaf) in leaves.iter().enumerate() {
            let path = tree.path(i).unwrap();
            assert_eq!(path.leaf_index, i as u32);
            assert_eq!(path.siblings.len(), TREE_DEPTH);
            assert!(path.verify(leaf, &root, &sponge), "path {} failed", i);
        }
    }

    #[test]
    fn test_path_rejects_wrong_leaf() {
        let sponge = MimcSponge::new();
        let leaves: Vec<Element> = (0..4).map(|_| random_leaf()).collect();
        let tree = MerkleTree::with_leaves(TREE_DEPTH, leaves).unwrap();
        let root = tree.root();

        let path = tree.path(2).unwrap();
        assert!(!path.verify(&random_leaf(), &root, &sponge));
    }

    #[test]
    fn test_find_leaf_index() {
        let leaves: Vec<Element> = (0..6).map(|_| random_leaf()).collect();
        let tree = MerkleTree::with_leaves(TREE_DEPTH, leaves.clone()).unwrap();

        assert_eq!(tree.find_leaf_index(&leaves[4]), Some(4));
        assert_eq!(tree.find_leaf_index(&random_leaf()), None);
    }

    #[test]
    fn test_insert_changes_root() {
        let mut tree = MerkleTree::new(TREE_DEPTH);
        let before = tree.root();
        tree.insert(random_leaf()).unwrap();
        assert_ne!(tree.root(), before);
    }

    #[test]
    fn test_path_out_of_range() {
        let tree = MerkleTree::with_leaves(TREE_DEPTH, vec![random_leaf()]).unwrap();
        assert!(matches!(
            tree.path(3),
            Err(PoolError::LeafOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_small_tree_capacity() {
        let mut tree = MerkleTree::new(2);
        for _ in 0..4 {
            tree.insert(random_leaf()).unwrap();
        }
        assert!(matches!(tree.insert(random_leaf()), Err(PoolError::TreeFull)));
    }
}
