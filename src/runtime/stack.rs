//! Z-ordered stack of shown windows.
//!
//! Insertion order is z-order; the last placement is the active window and the
//! only one that receives input.

use std::rc::Rc;

use crate::core::geometry::{TerminalPosition, TerminalSize};
use crate::core::window::Window;
use crate::runtime::placement::{initial_top_left, Position, WindowLayout, WindowPlacement};

#[derive(Debug, Default)]
pub struct WindowStack {
    placements: Vec<WindowPlacement>,
}

impl WindowStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn contains(&self, window: &Rc<dyn Window>) -> bool {
        self.placements.iter().any(|placement| placement.holds(window))
    }

    /// Append `window` above the current top and return its initial corner.
    ///
    /// Returns `None` (and changes nothing) if the window is already shown.
    pub fn push(&mut self, window: Rc<dyn Window>, policy: Position) -> Option<TerminalPosition> {
        if self.contains(&window) {
            return None;
        }
        let top_left = initial_top_left(policy, self.placements.last());
        self.placements
            .push(WindowPlacement::new(window, policy, top_left));
        Some(top_left)
    }

    pub fn pop(&mut self) -> Option<WindowPlacement> {
        self.placements.pop()
    }

    pub fn top(&self) -> Option<&WindowPlacement> {
        self.placements.last()
    }

    pub fn top_window(&self) -> Option<Rc<dyn Window>> {
        self.top().map(|placement| Rc::clone(placement.window()))
    }

    pub fn get(&self, index: usize) -> Option<&WindowPlacement> {
        self.placements.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowPlacement> {
        self.placements.iter()
    }

    /// Whether any placement above `index` is a solo window.
    pub fn has_solo_window_above(&self, index: usize) -> bool {
        self.placements
            .iter()
            .skip(index + 1)
            .any(|placement| placement.window().is_solo_window())
    }

    /// Resolve layouts for every placement that will be painted, bottom to top.
    ///
    /// Placements occluded by a solo window are skipped and keep their previous corner.
    pub fn visible_layouts(&mut self, screen: TerminalSize) -> Vec<(Rc<dyn Window>, WindowLayout)> {
        let occluded: Vec<bool> = (0..self.placements.len())
            .map(|index| self.has_solo_window_above(index))
            .collect();
        self.placements
            .iter_mut()
            .zip(occluded)
            .filter(|(_, occluded)| !occluded)
            .map(|(placement, _)| {
                let layout = placement.resolve(screen);
                (Rc::clone(placement.window()), layout)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::WindowStack;
    use crate::core::geometry::{TerminalPosition, TerminalSize};
    use crate::core::window::Window;
    use crate::render::graphics::TextGraphics;
    use crate::runtime::placement::Position;
    use std::rc::Rc;

    struct Fixed {
        size: TerminalSize,
        solo: bool,
    }

    impl Window for Fixed {
        fn preferred_size(&self) -> TerminalSize {
            self.size
        }

        fn paint(&self, _graphics: &mut TextGraphics<'_>) {}

        fn is_solo_window(&self) -> bool {
            self.solo
        }
    }

    fn window(solo: bool) -> Rc<dyn Window> {
        Rc::new(Fixed {
            size: TerminalSize::new(10, 5),
            solo,
        })
    }

    #[test]
    fn overlapping_windows_cascade() {
        let mut stack = WindowStack::new();
        assert_eq!(
            stack.push(window(false), Position::Overlapping),
            Some(TerminalPosition::new(2, 1))
        );
        assert_eq!(
            stack.push(window(false), Position::Overlapping),
            Some(TerminalPosition::new(4, 2))
        );
        assert_eq!(
            stack.push(window(false), Position::Overlapping),
            Some(TerminalPosition::new(6, 3))
        );
    }

    #[test]
    fn cascade_does_not_follow_centered_window() {
        let mut stack = WindowStack::new();
        stack.push(window(false), Position::Overlapping);
        stack.push(window(false), Position::Center);
        assert_eq!(
            stack.push(window(false), Position::Overlapping),
            Some(TerminalPosition::new(2, 1))
        );
    }

    #[test]
    fn new_corner_window_restarts_cascade() {
        let mut stack = WindowStack::new();
        stack.push(window(false), Position::Overlapping);
        stack.push(window(false), Position::Overlapping);
        assert_eq!(
            stack.push(window(false), Position::NewCornerWindow),
            Some(TerminalPosition::new(2, 1))
        );
        assert_eq!(
            stack.push(window(false), Position::Overlapping),
            Some(TerminalPosition::new(4, 2))
        );
    }

    #[test]
    fn stack_is_lifo_and_rejects_duplicates() {
        let mut stack = WindowStack::new();
        let first = window(false);
        let second = window(false);
        stack.push(Rc::clone(&first), Position::Overlapping);
        stack.push(Rc::clone(&second), Position::Overlapping);
        assert_eq!(stack.push(Rc::clone(&first), Position::Center), None);
        assert_eq!(stack.len(), 2);

        let popped = stack.pop().expect("second window");
        assert!(popped.holds(&second));
        assert!(stack.top().expect("first window").holds(&first));
        stack.pop();
        assert!(stack.pop().is_none());
    }

    #[test]
    fn solo_window_hides_only_windows_below_it() {
        let mut stack = WindowStack::new();
        stack.push(window(false), Position::Overlapping);
        stack.push(window(false), Position::Overlapping);
        stack.push(window(true), Position::Overlapping);
        stack.push(window(false), Position::Overlapping);

        assert!(stack.has_solo_window_above(0));
        assert!(stack.has_solo_window_above(1));
        assert!(!stack.has_solo_window_above(2));
        assert!(!stack.has_solo_window_above(3));

        let layouts = stack.visible_layouts(TerminalSize::new(80, 24));
        let corners: Vec<_> = layouts.iter().map(|(_, layout)| layout.top_left).collect();
        assert_eq!(
            corners,
            vec![TerminalPosition::new(6, 3), TerminalPosition::new(8, 4)]
        );
    }
}
