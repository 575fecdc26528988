//! Cursor-addressable text editing.
//!
//! Provides a linked-list backed text buffer whose cursor tracks its own
//! row, column and absolute index, plus a small edit-script format for
//! replaying operation sequences against it.

mod buffer;
mod script;

pub use buffer::TextBuffer;
pub use script::{Edit, Script, ScriptError};
