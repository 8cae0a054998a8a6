//! Input events and first-person controls
//!
//! Window-system events are translated into [`InputEvent`] values by
//! [`crate::render::Window::events`]; consumers never see GLFW types.

pub mod controls;

pub use controls::FirstPersonControls;

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// Space key
    Space,
    /// Escape key
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// A window-system event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// The window gained (`true`) or lost keyboard focus
    Focus(bool),
    /// The window was resized, in screen coordinates
    Resize {
        /// New width
        width: u32,
        /// New height
        height: u32,
    },
    /// A key was pressed or released; repeats are not reported
    Key {
        /// Which key
        key: KeyCode,
        /// `true` on press
        pressed: bool,
    },
    /// The cursor moved, in window coordinates
    CursorMoved {
        /// Horizontal position
        x: f64,
        /// Vertical position
        y: f64,
    },
    /// The user asked to close the window
    CloseRequested,
}
