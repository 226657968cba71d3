//! Window management and event loops.

pub mod exception;
pub mod gui_screen;
pub mod gui_thread;
pub mod placement;
pub mod stack;
pub mod task_queue;

pub use gui_screen::{GuiHandle, GuiScreen};
pub use gui_thread::{Status, TextGui, TextGuiThread};
pub use placement::Position;
