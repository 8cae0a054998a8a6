//! Textured cube demo application
//!
//! Loads a mesh and a texture, links the configured shaders and draws the
//! mesh once per configured instance while a first-person camera flies
//! around it (mouse to look, WASD to move, Escape to quit).
//!
//! Usage: `cube_app [LOG_LEVEL] [CONFIG]` where `LOG_LEVEL` is `0` (debug)
//! to `3` (error) and `CONFIG` is a `.toml` or `.ron` file.

use std::error::Error;
use std::sync::Arc;

use gl_engine::foundation::logging;
use gl_engine::prelude::*;
use gl_engine::render::UniformLocation;

/// Everything the render loop needs
///
/// Fields drop in declaration order: GL objects first, the context and
/// window last.
struct CubeApp {
    program: Program<GlowApi>,
    mvp: Option<UniformLocation>,
    vao: VertexArray<GlowApi>,
    mesh: Mesh<GlowApi>,
    texture: Texture<GlowApi>,
    controls: FirstPersonControls,
    timer: Timer,
    instances: Vec<Vec3>,
    context: Arc<RenderContext<GlowApi>>,
    window: Window,
}

impl CubeApp {
    fn new(config: &AppConfig) -> Result<Self, Box<dyn Error>> {
        let mut window = Window::new(&config.window)?;
        let context = RenderContext::new(window.load_api());

        let api = context.api();
        let (width, height) = window.framebuffer_size();
        api.set_viewport(width, height);
        api.enable_depth_test();
        api.enable_back_face_culling();
        api.set_clear_color(config.scene.clear_color);

        let program = build_program(&context, &config.shaders)?;
        let mvp = program.uniform_location(&config.shaders.mvp_uniform);

        let mesh_data = ObjLoader::load_obj(&config.assets.mesh_path)?;
        let image = TextureImage::from_file(&config.assets.texture_path)?;

        let vao = VertexArray::new(&context)?;
        let mut texture = Texture::new(&context, config.assets.uv_attribute)?;
        texture.load(image, mesh_data.tex_coords.clone())?;
        texture.set_sampler_uniform(program.uniform_location(&config.shaders.sampler_uniform));
        texture.bind(&vao)?;

        let mut mesh =
            Mesh::from_mesh_data(&context, &mesh_data, config.assets.position_attribute)?;
        mesh.bind(&vao)?;

        let (win_width, win_height) = window.size();
        let aspect = win_width as f32 / win_height.max(1) as f32;
        window.center_cursor();

        Ok(Self {
            program,
            mvp,
            vao,
            mesh,
            texture,
            controls: FirstPersonControls::from_config(&config.camera, aspect),
            timer: Timer::new(),
            instances: config.scene.instances.iter().map(|&t| Vec3::from(t)).collect(),
            context,
            window,
        })
    }

    fn run(&mut self) -> Result<(), Box<dyn Error>> {
        log::info!(
            "Rendering {} instance(s) of a {}-index mesh with {} texture coordinates",
            self.instances.len(),
            self.mesh.index_count(),
            self.texture.coord_count()
        );
        let mut last_report = 0.0;

        while !self.window.should_close() {
            self.timer.update();
            let api = self.context.api();
            api.clear();

            let cursor = self.window.cursor_pos();
            let size = self.window.size();
            self.controls.update(self.timer.delta_time(), cursor, size);
            if self.controls.is_enabled() {
                self.window.center_cursor();
            }

            self.program.use_program()?;
            let view_projection = self.controls.camera().view_projection();
            for translation in &self.instances {
                if let Some(mvp) = self.mvp {
                    let model = Mat4::translation(*translation);
                    self.program.set_uniform_mat4(mvp, &(view_projection * model));
                }
                self.vao.render();
            }

            self.window.swap_buffers();
            self.window.poll_events();
            for event in self.window.events() {
                match event {
                    InputEvent::CloseRequested
                    | InputEvent::Key { key: KeyCode::Escape, pressed: true } => {
                        self.window.set_should_close(true);
                    }
                    InputEvent::Resize { width, height } => api.set_viewport(width, height),
                    _ => {}
                }
                self.controls.handle_event(&event);
            }

            if self.timer.total_time() - last_report >= 1.0 {
                last_report = self.timer.total_time();
                log::debug!(
                    "FPS: {:.1} (frame {})",
                    self.timer.current_fps(),
                    self.timer.frame_count()
                );
            }
        }

        log::info!("Window closed after {} frames", self.timer.frame_count());
        Ok(())
    }
}

/// Compile every configured stage, attach, and link
fn build_program(
    context: &Arc<RenderContext<GlowApi>>,
    shaders: &ShaderConfig,
) -> Result<Program<GlowApi>, Box<dyn Error>> {
    let program = Program::new(context)?;
    let mut units = Vec::with_capacity(shaders.stages.len());
    for stage in &shaders.stages {
        let shader = Shader::new(context, stage.kind)?;
        shader.compile(&stage.source)?;
        shader.attach(&program)?;
        units.push(shader);
    }

    program.link()?;
    let log = program.link_log();
    if !log.trim().is_empty() {
        log::info!("Program link messages:\n{}", log);
    }
    Ok(program)
}

/// Split the command line into a log level and a config path
fn parse_args(
    args: impl Iterator<Item = String>,
) -> Result<(Option<log::LevelFilter>, Option<String>), String> {
    let mut level = None;
    let mut config = None;
    for arg in args {
        if let Some(parsed) = logging::level_from_arg(&arg) {
            if level.is_some() {
                return Err(format!("log level given more than once ('{arg}')"));
            }
            level = Some(parsed);
        } else if arg.trim().parse::<u8>().is_ok() {
            return Err(format!("log level '{arg}' is not between 0 and 3"));
        } else if config.is_some() {
            return Err(format!("unexpected argument '{arg}'"));
        } else {
            config = Some(arg);
        }
    }
    Ok((level, config))
}

fn load_config(path: Option<&str>) -> Result<AppConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            AppConfig::load_from_file(path)?
        }
        None => AppConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() {
    let (level, config_path) = match parse_args(std::env::args().skip(1)) {
        Ok(parsed) => parsed,
        Err(message) => {
            logging::init(None);
            log::error!("{}; usage: cube_app [LOG_LEVEL] [CONFIG]", message);
            std::process::exit(2);
        }
    };
    logging::init(level);
    log::info!("Starting cube demo");

    let result = load_config(config_path.as_deref())
        .and_then(|config| CubeApp::new(&config))
        .and_then(|mut app| app.run());

    if let Err(e) = result {
        log::error!("Application error: {}", e);
        std::process::exit(1);
    }
    log::info!("Cube demo finished successfully");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_level_and_config() {
        let (level, config) = parse_args(args(&["0", "scene.toml"])).unwrap();
        assert_eq!(level, Some(log::LevelFilter::Debug));
        assert_eq!(config.as_deref(), Some("scene.toml"));
    }

    #[test]
    fn test_parse_config_only() {
        let (level, config) = parse_args(args(&["scene.ron"])).unwrap();
        assert_eq!(level, None);
        assert_eq!(config.as_deref(), Some("scene.ron"));
    }

    #[test]
    fn test_extra_arguments_rejected() {
        assert!(parse_args(args(&["0", "1"])).is_err());
        assert!(parse_args(args(&["7"])).is_err());
        assert!(parse_args(args(&["a.toml", "b.toml"])).is_err());
        assert_eq!(parse_args(args(&[])).unwrap(), (None, None));
    }

    #[test]
    fn test_defaults_load_without_file() {
        assert!(load_config(None).is_ok());
    }
}
