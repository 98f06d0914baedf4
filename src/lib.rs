//! skiprank - a rank-indexed skip list.
//!
//! An ordered index over (score, member) pairs with O(log n) expected
//! insertion, deletion, and positional queries, using the per-level span
//! bookkeeping of production sorted-set engines.
//!
//! # Quick Start
//!
//! ```
//! use skiprank::RankedSkipList;
//!
//! let mut board = RankedSkipList::new();
//!
//! board.insert(10.0, "A").unwrap();
//! board.insert(20.0, "B").unwrap();
//! board.insert(15.0, "C").unwrap();
//!
//! // Ranks are 1-based positions in (score, member) order.
//! assert_eq!(board.rank(15.0, "C"), Some(2));
//! assert_eq!(board.entry_at_rank(3).unwrap().member, "B");
//!
//! let top_two: Vec<&str> = board
//!     .range_by_rank(1, 2)
//!     .map(|e| e.member.as_str())
//!     .collect();
//! assert_eq!(top_two, vec!["A", "C"]);
//! ```

pub mod entry;
pub mod error;
pub mod list;

pub use entry::Entry;
pub use error::InsertError;
pub use list::{MAX_LEVEL, RankedSkipList};
