//! Core type definitions for Parley

pub mod evaluation;
pub mod message;
pub mod tool;

pub use evaluation::*;
pub use message::*;
pub use tool::*;
