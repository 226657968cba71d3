//! Core interfaces and types.

pub mod error;
pub mod geometry;
pub mod input;
pub mod output;
pub mod screen;
pub mod theme;
pub mod window;
