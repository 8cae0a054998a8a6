//! Cross-object tests of the link protocol and vertex-array membership,
//! driven through the headless API.

use std::sync::{Arc, Barrier};
use std::time::Duration;

use super::*;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

const VERTEX: &str = "#version 330 core\nvoid main() { gl_Position = vec4(0.0); }\n";
const FRAGMENT: &str = "#version 330 core\nout vec4 color;\nvoid main() { color = vec4(1.0); }\n";
const BROKEN: &str = "#version 330 core\nvoid main() { \n";

fn context() -> Arc<RenderContext<HeadlessApi>> {
    RenderContext::new(HeadlessApi::new())
}

fn compiled(
    context: &Arc<RenderContext<HeadlessApi>>,
    kind: ShaderKind,
    source: &str,
) -> Shader<HeadlessApi> {
    let shader = Shader::new(context, kind).unwrap();
    shader.compile(source).unwrap();
    shader
}

fn count_calls(context: &RenderContext<HeadlessApi>, pred: impl Fn(&ApiCall) -> bool) -> usize {
    context.api().calls().iter().filter(|call| pred(call)).count()
}

fn triangle(context: &Arc<RenderContext<HeadlessApi>>) -> Mesh<HeadlessApi> {
    let mut mesh = Mesh::new(context, 0).unwrap();
    mesh.load(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2]).unwrap();
    mesh
}

// Link protocol

#[test]
fn test_compile_attach_link_use() {
    let context = context();
    let vertex = compiled(&context, ShaderKind::Vertex, VERTEX);
    let fragment = compiled(&context, ShaderKind::Fragment, FRAGMENT);
    let program = Program::new(&context).unwrap();

    vertex.attach(&program).unwrap();
    fragment.attach(&program).unwrap();
    assert_eq!(program.attached(), vec![vertex.id(), fragment.id()]);
    assert_eq!(vertex.program(), Some(program.id()));

    program.link().unwrap();

    assert!(program.is_linked());
    assert!(program.attached().is_empty());
    assert_eq!(vertex.program(), None);
    assert_eq!(fragment.program(), None);
    assert_eq!(count_calls(&context, |c| matches!(c, ApiCall::DetachShader(..))), 2);

    program.use_program().unwrap();
    assert!(context.api().current_program().is_some());
}

#[test]
fn test_failed_compile_cannot_attach() {
    let context = context();
    let program = Program::new(&context).unwrap();
    let good = compiled(&context, ShaderKind::Vertex, VERTEX);
    good.attach(&program).unwrap();

    let bad = Shader::new(&context, ShaderKind::Fragment).unwrap();
    let err = bad.compile(BROKEN).unwrap_err();
    assert!(matches!(err, ShaderError::CompileFailed { kind: ShaderKind::Fragment, .. }));
    assert!(!bad.is_compiled());
    assert!(!bad.compile_log().is_empty());

    assert_eq!(bad.attach(&program), Err(ShaderError::NotCompiled));
    assert_eq!(program.attached(), vec![good.id()]);
    assert_eq!(bad.program(), None);
}

#[test]
fn test_uncompiled_shader_cannot_attach() {
    let context = context();
    let program = Program::new(&context).unwrap();
    let shader = Shader::new(&context, ShaderKind::Vertex).unwrap();

    assert_eq!(shader.attach(&program), Err(ShaderError::NotCompiled));
    assert!(program.attached().is_empty());
}

#[test]
fn test_compile_runs_once() {
    let context = context();
    let ok = Shader::new(&context, ShaderKind::Vertex).unwrap();
    ok.compile(VERTEX).unwrap();
    assert_eq!(ok.compile(VERTEX), Err(ShaderError::AlreadyCompiled));
    assert!(ok.is_compiled());

    let failed = Shader::new(&context, ShaderKind::Vertex).unwrap();
    assert!(failed.compile(BROKEN).is_err());
    assert_eq!(failed.compile(VERTEX), Err(ShaderError::AlreadyCompiled));
    assert!(!failed.is_compiled());

    assert_eq!(count_calls(&context, |c| matches!(c, ApiCall::CompileShader(_))), 2);
}

#[test]
fn test_concurrent_compiles_run_once() {
    const THREADS: usize = 8;
    let context = context();
    context.api().set_compile_delay(Some(Duration::from_millis(50)));
    let shader = Shader::new(&context, ShaderKind::Vertex).unwrap();
    let barrier = Barrier::new(THREADS);

    let results: Vec<Result<(), ShaderError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    shader.compile(VERTEX)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, ShaderError::CompileInProgress | ShaderError::AlreadyCompiled)));
    assert_eq!(count_calls(&context, |c| matches!(c, ApiCall::CompileShader(_))), 1);
    assert!(shader.is_compiled());
}

#[test]
fn test_shader_attaches_to_one_program() {
    let context = context();
    let first = Program::new(&context).unwrap();
    let second = Program::new(&context).unwrap();
    let shader = compiled(&context, ShaderKind::Vertex, VERTEX);

    shader.attach(&first).unwrap();
    assert_eq!(shader.attach(&first), Err(ShaderError::AlreadyAttached));
    assert_eq!(shader.attach(&second), Err(ShaderError::AlreadyAttached));

    assert_eq!(first.attached().len(), 1);
    assert!(second.attached().is_empty());
    assert_eq!(shader.program(), Some(first.id()));
}

#[test]
fn test_linked_program_takes_no_more_shaders() {
    let context = context();
    let program = Program::new(&context).unwrap();
    let vertex = compiled(&context, ShaderKind::Vertex, VERTEX);
    vertex.attach(&program).unwrap();
    program.link().unwrap();

    let late = compiled(&context, ShaderKind::Fragment, FRAGMENT);
    assert_eq!(late.attach(&program), Err(ShaderError::ProgramLinked));
    // Detached by the link, but still refused by the linked program
    assert_eq!(vertex.attach(&program), Err(ShaderError::ProgramLinked));
    assert!(program.attached().is_empty());
    assert_eq!(late.program(), None);
}

#[test]
fn test_detached_shader_can_join_another_program() {
    let context = context();
    let first = Program::new(&context).unwrap();
    let shader = compiled(&context, ShaderKind::Vertex, VERTEX);
    shader.attach(&first).unwrap();
    first.link().unwrap();

    let second = Program::new(&context).unwrap();
    shader.attach(&second).unwrap();
    assert_eq!(second.attached(), vec![shader.id()]);
}

#[test]
fn test_link_preconditions() {
    let context = context();
    let program = Program::new(&context).unwrap();
    assert_eq!(program.link(), Err(ProgramError::NothingAttached));

    let shader = compiled(&context, ShaderKind::Vertex, VERTEX);
    shader.attach(&program).unwrap();
    program.link().unwrap();
    assert_eq!(program.link(), Err(ProgramError::AlreadyLinked));
}

#[test]
fn test_failed_link_keeps_shaders_and_allows_retry() {
    let context = context();
    let program = Program::new(&context).unwrap();
    let vertex = compiled(&context, ShaderKind::Vertex, VERTEX);
    vertex.attach(&program).unwrap();

    context.api().reject_links(true);
    assert!(matches!(program.link(), Err(ProgramError::LinkFailed { .. })));
    assert!(!program.link_log().is_empty());
    assert_eq!(program.attached(), vec![vertex.id()]);
    assert_eq!(vertex.program(), Some(program.id()));
    assert_eq!(program.use_program(), Err(ProgramError::NotLinked));

    context.api().reject_links(false);
    program.link().unwrap();
    assert!(program.attached().is_empty());
}

#[test]
fn test_use_requires_link() {
    let context = context();
    let program = Program::new(&context).unwrap();
    assert_eq!(program.use_program(), Err(ProgramError::NotLinked));
    assert_eq!(context.api().current_program(), None);
}

#[test]
fn test_dropping_attached_shader_leaves_program() {
    let context = context();
    let program = Program::new(&context).unwrap();
    let vertex = compiled(&context, ShaderKind::Vertex, VERTEX);
    let fragment = compiled(&context, ShaderKind::Fragment, FRAGMENT);
    vertex.attach(&program).unwrap();
    fragment.attach(&program).unwrap();

    let fragment_id = fragment.id();
    drop(vertex);

    assert_eq!(program.attached(), vec![fragment_id]);
    assert_eq!(count_calls(&context, |c| matches!(c, ApiCall::DetachShader(..))), 1);
    assert_eq!(context.link_counts(), (1, 1));
}

#[test]
fn test_dropping_program_releases_shaders() {
    let context = context();
    let shader = compiled(&context, ShaderKind::Vertex, VERTEX);
    {
        let program = Program::new(&context).unwrap();
        shader.attach(&program).unwrap();
    }

    assert_eq!(shader.program(), None);
    let replacement = Program::new(&context).unwrap();
    shader.attach(&replacement).unwrap();
}

#[test]
fn test_contexts_do_not_mix() {
    let ours = context();
    let theirs = context();
    let shader = compiled(&ours, ShaderKind::Vertex, VERTEX);
    let program = Program::new(&theirs).unwrap();

    assert_eq!(shader.attach(&program), Err(ShaderError::ForeignContext));

    let vao = VertexArray::new(&theirs).unwrap();
    let mut mesh = triangle(&ours);
    assert_eq!(mesh.bind(&vao), Err(ObjectError::ForeignContext));
}

#[test]
fn test_uniform_helpers() {
    let context = context();
    let program = Program::new(&context).unwrap();
    let shader = compiled(&context, ShaderKind::Vertex, VERTEX);
    shader.attach(&program).unwrap();
    program.link().unwrap();
    program.use_program().unwrap();

    let mvp = program.uniform_location("MVP").unwrap();
    let model = Mat4::translation(Vec3::new(5.0, 0.0, 0.0));
    program.set_uniform_mat4(mvp, &model);

    assert!(context.api().calls().contains(&ApiCall::UniformMat4(mvp, model.to_column_array())));
}

// Vertex-array membership

#[test]
fn test_bind_registers_once() {
    let context = context();
    let vao = VertexArray::new(&context).unwrap();
    let mut mesh = triangle(&context);

    mesh.bind(&vao).unwrap();
    assert_eq!(vao.members(), vec![mesh.id()]);
    assert_eq!(mesh.owner(), Some(vao.id()));

    assert_eq!(mesh.bind(&vao), Err(ObjectError::AlreadyBound));
    assert_eq!(vao.members(), vec![mesh.id()]);
}

#[test]
fn test_bound_object_does_not_move() {
    let context = context();
    let first = VertexArray::new(&context).unwrap();
    let second = VertexArray::new(&context).unwrap();
    let mut mesh = triangle(&context);
    mesh.bind(&first).unwrap();

    assert_eq!(mesh.bind(&second), Err(ObjectError::AlreadyBound));
    assert_eq!(first.members(), vec![mesh.id()]);
    assert!(second.members().is_empty());
    assert_eq!(mesh.owner(), Some(first.id()));
}

#[test]
fn test_unbind_is_mutual() {
    let context = context();
    let vao = VertexArray::new(&context).unwrap();
    let mut mesh = triangle(&context);
    mesh.bind(&vao).unwrap();

    assert!(mesh.unbind());
    assert!(vao.members().is_empty());
    assert_eq!(mesh.owner(), None);
    assert_eq!(mesh.render(), Err(ObjectError::NotBound));
    assert!(!mesh.unbind());
}

#[test]
fn test_dropped_member_leaves_vertex_array() {
    let context = context();
    let vao = VertexArray::new(&context).unwrap();
    let mut first = triangle(&context);
    let mut second = triangle(&context);
    first.bind(&vao).unwrap();
    second.bind(&vao).unwrap();

    drop(first);

    assert_eq!(vao.members(), vec![second.id()]);
    assert_eq!(vao.render(), 1);
}

#[test]
fn test_dropped_vertex_array_unbinds_members() {
    let context = context();
    let mut mesh = triangle(&context);
    {
        let vao = VertexArray::new(&context).unwrap();
        mesh.bind(&vao).unwrap();
    }

    assert_eq!(mesh.owner(), None);
    assert_eq!(mesh.render(), Err(ObjectError::NotBound));

    let replacement = VertexArray::new(&context).unwrap();
    mesh.bind(&replacement).unwrap();
    assert_eq!(replacement.members(), vec![mesh.id()]);
}

#[test]
fn test_everything_released_on_drop() {
    let context = context();
    {
        let program = Program::new(&context).unwrap();
        let vertex = compiled(&context, ShaderKind::Vertex, VERTEX);
        vertex.attach(&program).unwrap();
        let vao = VertexArray::new(&context).unwrap();
        let mut mesh = triangle(&context);
        mesh.bind(&vao).unwrap();
        vao.render();
    }

    assert_eq!(context.link_counts(), (0, 0));
    assert_eq!(context.member_counts(), (0, 0));
    assert_eq!(context.api().live_objects(), 0);
}

#[test]
fn test_context_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RenderContext<HeadlessApi>>();
    assert_send_sync::<Shader<HeadlessApi>>();
    assert_send_sync::<Program<HeadlessApi>>();
}
