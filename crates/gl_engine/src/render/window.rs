//! GLFW-based window with an OpenGL context
//!
//! Creates a window holding an OpenGL 3.3 core, forward-compatible context,
//! makes it current and loads GL entry points for [`GlowApi`]. Window events
//! are translated into [`InputEvent`] values so the rest of the crate never
//! sees GLFW types.

use glfw::{Action, Context, Key, WindowEvent};
use thiserror::Error;

use crate::core::config::WindowConfig;
use crate::input::{InputEvent, KeyCode};

use super::gl::GlowApi;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialised
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window or its context could not be created
    #[error("Window creation failed ({width}x{height}, OpenGL {major}.{minor} core)")]
    CreationFailed {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Requested context major version
        major: u32,
        /// Requested context minor version
        minor: u32,
    },
}

/// Result alias for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window owning the current OpenGL context
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
}

impl Window {
    /// Create the window and make its context current on this thread
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        // Errors are logged; failures surface as `None` or `Err` from GLFW calls
        let on_error = |error: glfw::Error, description: String| {
            log::error!("GLFW error {error:?}: {description}");
        };
        let mut glfw = glfw::init(on_error)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        let (major, minor) = config.gl_version;
        glfw.window_hint(glfw::WindowHint::ContextVersion(major, minor));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed {
                width: config.width,
                height: config.height,
                major,
                minor,
            })?;

        window.make_current();
        glfw.set_swap_interval(if config.vsync {
            glfw::SwapInterval::Sync(1)
        } else {
            glfw::SwapInterval::None
        });

        window.set_key_polling(true);
        window.set_focus_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_cursor_mode(glfw::CursorMode::Hidden);

        log::info!("Created {}x{} window '{}'", config.width, config.height, config.title);
        Ok(Self { glfw, window, events })
    }

    /// Load OpenGL entry points from this window's context
    pub fn load_api(&mut self) -> GlowApi {
        let window = &mut self.window;
        // SAFETY: the context was made current in `new` and lives as long as
        // the window, which the caller keeps alive while rendering.
        unsafe { GlowApi::from_loader(|name| window.get_proc_address(name) as *const _) }
    }

    /// Whether the user asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request (or cancel a request) to close the window
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Process pending window-system events
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drain polled events, translated
    pub fn events(&mut self) -> Vec<InputEvent> {
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| translate_event(event))
            .collect()
    }

    /// Cursor position in window coordinates
    pub fn cursor_pos(&self) -> (f64, f64) {
        self.window.get_cursor_pos()
    }

    /// Move the cursor to the window centre
    pub fn center_cursor(&mut self) {
        let (width, height) = self.size();
        self.window.set_cursor_pos(f64::from(width) / 2.0, f64::from(height) / 2.0);
    }

    /// Window size in screen coordinates
    pub fn size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    /// Seconds since GLFW was initialised
    pub fn time(&self) -> f64 {
        self.glfw.get_time()
    }
}

fn key_code(key: Key) -> Option<KeyCode> {
    Some(match key {
        Key::W => KeyCode::W,
        Key::A => KeyCode::A,
        Key::S => KeyCode::S,
        Key::D => KeyCode::D,
        Key::Space => KeyCode::Space,
        Key::Escape => KeyCode::Escape,
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        _ => return None,
    })
}

fn translate_event(event: WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::Focus(focused) => Some(InputEvent::Focus(focused)),
        WindowEvent::FramebufferSize(width, height) => Some(InputEvent::Resize {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }),
        WindowEvent::Key(key, _, Action::Press, _) => {
            key_code(key).map(|key| InputEvent::Key { key, pressed: true })
        }
        WindowEvent::Key(key, _, Action::Release, _) => {
            key_code(key).map(|key| InputEvent::Key { key, pressed: false })
        }
        WindowEvent::CursorPos(x, y) => Some(InputEvent::CursorMoved { x, y }),
        WindowEvent::Close => Some(InputEvent::CloseRequested),
        _ => None,
    }
}
