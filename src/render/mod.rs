//! Painting helpers.

pub mod graphics;
pub mod memory;

pub use graphics::TextGraphics;
