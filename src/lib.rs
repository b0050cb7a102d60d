//! An in-memory ordered index over byte-string keys, meant to sit inside a
//! storage engine as its memtable.
//!
//! The index is a skip list with a fixed number of levels, guarded by a single
//! reader/writer lock:
//!
//! ```
//! use memindex::OrderedIndex;
//!
//! let index = OrderedIndex::new();
//! assert!(!index.set("apple", "red"));
//! assert!(index.set("apple", "green"));
//! assert_eq!(index.get("apple"), Some(b"green".to_vec()));
//! index.delete("apple");
//! assert_eq!(index.get("apple"), None);
//! ```

mod index;
mod level;
mod options;
mod score;

pub use index::{IndexStats, OrderedIndex};
pub use level::{random_height, MAX_LEVEL};
pub use options::Options;
pub use score::key_score;
