// SPDX-License-Identifier: Apache-2.0

//! Discovery and refinement of comparator-based sorting networks.
//!
//! The pipeline works on collections of layered networks: enumerate candidate
//! prefixes layer by layer, prune prefixes whose reachable-output sets are
//! subset-isomorphic to another prefix's, emit CNF instances whose models are
//! sorting suffixes of a target depth, and decode solver output back into
//! verified networks.

pub mod clean_up;
pub mod cnf;
pub mod container;
pub mod decode;
pub mod encode;
pub mod extend;
pub mod isomorphism;
pub mod mask_cache;
pub mod network;
pub mod output;
pub mod output_bitset;
pub mod perm;
pub mod simplify;
pub mod stack;
pub mod window;
