//! Client-side model of a post's comment thread.
//!
//! The server sends comments already nested; this module keeps that tree in
//! memory, patches it after remote mutations, and flattens it into rows for
//! display. All walks use an explicit stack so thread depth is bounded only
//! by memory.

mod draft;
mod rows;
mod tree;

pub use draft::*;
pub use rows::*;
pub use tree::*;

#[cfg(test)]
pub(crate) mod fixtures;
