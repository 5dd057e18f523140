use std::path::PathBuf;

use pocket_arcade::{ShaderError, Stage, validate_files, validate_program};

fn shipped(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(name)
}

fn read(name: &str) -> String {
    std::fs::read_to_string(shipped(name)).unwrap()
}

#[test]
fn shipped_shaders_compile_and_link() {
    validate_files(shipped("Sample_GL.vert"), shipped("Sample_GL.frag")).unwrap();
}

#[test]
fn stages_are_not_interchangeable() {
    let vert = read("Sample_GL.vert");
    let frag = read("Sample_GL.frag");
    // The fragment shader writes no gl_Position and reads an input the vertex stage never sees.
    match validate_program(&frag, &vert) {
        Err(ShaderError::Compile { .. } | ShaderError::Link { .. }) => {}
        other => panic!("swapped stages should not validate, got {other:?}"),
    }
}

#[test]
fn vertex_syntax_error_names_the_vertex_stage() {
    let vert = read("Sample_GL.vert").replace("fragColor = vertexColor;", "fragColor = ;");
    match validate_program(&vert, &read("Sample_GL.frag")) {
        Err(ShaderError::Compile { stage, log, .. }) => {
            assert_eq!(stage, Stage::Vertex);
            assert!(!log.trim().is_empty());
        }
        other => panic!("expected a vertex compile error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_a_read_error() {
    let missing = shipped("does_not_exist.vert");
    match validate_files(&missing, shipped("Sample_GL.frag")) {
        Err(err @ ShaderError::Read { .. }) => {
            assert!(err.to_string().contains("does_not_exist.vert"));
        }
        other => panic!("expected a read error, got {other:?}"),
    }
}

#[test]
fn missing_fragment_file_is_reported_after_vertex_compiles() {
    match validate_files(shipped("Sample_GL.vert"), shipped("nope.frag")) {
        Err(ShaderError::Read { path, .. }) => assert!(path.ends_with("nope.frag")),
        other => panic!("expected a read error, got {other:?}"),
    }
}
