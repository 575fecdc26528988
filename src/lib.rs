// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. script::ScriptError)
    clippy::module_name_repetitions
)]

//! # cursor-buffer
//!
//! A mutable text buffer with a single cursor that keeps its own row,
//! column and absolute index up to date while text is inserted, removed
//! and navigated.
//!
//! - Character-wise `forward` / `backward` motion
//! - Row-wise `up` / `down` motion that keeps the column, clamped to the
//!   target row's length
//! - Insertion and removal at the cursor in constant time
//!
//! ## Example
//!
//! ```
//! use cursor_buffer::prelude::*;
//!
//! let mut buf = TextBuffer::from_text("ab\nc\ndefg");
//! assert_eq!((buf.row(), buf.column(), buf.index()), (3, 4, 9));
//!
//! buf.backward();
//! assert!(buf.up());
//! assert_eq!((buf.row(), buf.column()), (2, 1));
//! ```
//!
//! ## Modules
//!
//! - [`list`]: arena-backed doubly-linked list with stable position handles
//! - [`editor`]: the cursor-tracking [`TextBuffer`](editor::TextBuffer) and
//!   edit scripts

pub mod editor;
pub mod list;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::editor::{Edit, Script, ScriptError, TextBuffer};
    pub use crate::list::{List, Pos};
}
