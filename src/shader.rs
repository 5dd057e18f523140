//! GLSL shader program loading.
//!
//! A [`ShaderProgram`] is a vertex and fragment module pair built from two
//! GLSL source files. Loading runs in three steps, each with its own
//! [`ShaderError`] variant:
//!
//! 1. **Read** both files from disk.
//! 2. **Compile** each stage with naga's GLSL front end (re-exported by
//!    wgpu) and validate the resulting module.
//! 3. **Link** the stages: every location the fragment stage reads must be
//!    written by the vertex stage.
//!
//! Steps 2 and 3 need no GPU and are available on their own as
//! [`validate_program`] (in-memory sources) and [`validate_files`]. Only
//! after both pass are the GPU modules created.
//!
//! Every step logs what it did, including the full diagnostic text on
//! failure, so a broken shader shows up on the console even when the caller
//! discards the error.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use wgpu::naga;
use wgpu::naga::front::glsl;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::gpu::GpuContext;

/// Pipeline stage of a shader source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        })
    }
}

/// Errors produced while loading a shader program.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("cannot read shader '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader '{}' failed to compile:\n{log}", path.display())]
    Compile {
        stage: Stage,
        path: PathBuf,
        log: String,
    },
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

/// A compiled and linked vertex/fragment pair.
#[derive(Debug)]
pub struct ShaderProgram {
    pub(crate) vertex: wgpu::ShaderModule,
    pub(crate) fragment: wgpu::ShaderModule,
}

impl ShaderProgram {
    /// Reads, compiles and links the two stages, then creates the GPU modules.
    pub fn load(
        gpu: &GpuContext,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();

        let vs_source = read_source(vertex_path)?;
        let fs_source = read_source(fragment_path)?;

        let vs = compile_stage(Stage::Vertex, vertex_path, &vs_source)?;
        let fs = compile_stage(Stage::Fragment, fragment_path, &fs_source)?;
        link(&vs, &fs)?;

        let vertex = create_module(gpu, Stage::Vertex, vertex_path, vs_source)?;
        let fragment = create_module(gpu, Stage::Fragment, fragment_path, fs_source)?;

        Ok(Self { vertex, fragment })
    }
}

/// Compiles and links in-memory sources without touching the GPU.
pub fn validate_program(vertex_source: &str, fragment_source: &str) -> Result<(), ShaderError> {
    let vs = compile_stage(Stage::Vertex, Path::new("<vertex>"), vertex_source)?;
    let fs = compile_stage(Stage::Fragment, Path::new("<fragment>"), fragment_source)?;
    link(&vs, &fs)
}

/// Reads, compiles and links two shader files without touching the GPU.
pub fn validate_files(
    vertex_path: impl AsRef<Path>,
    fragment_path: impl AsRef<Path>,
) -> Result<(), ShaderError> {
    let (vertex_path, fragment_path) = (vertex_path.as_ref(), fragment_path.as_ref());
    let vs = compile_stage(Stage::Vertex, vertex_path, &read_source(vertex_path)?)?;
    let fs = compile_stage(Stage::Fragment, fragment_path, &read_source(fragment_path)?)?;
    link(&vs, &fs)
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    log::info!("Compiling shader : {}", path.display());
    std::fs::read_to_string(path).map_err(|source| {
        log::error!("cannot read '{}': {source}", path.display());
        ShaderError::Read {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn compile_stage(stage: Stage, path: &Path, source: &str) -> Result<naga::Module, ShaderError> {
    let fail = |log: String| {
        log::error!("{stage} shader '{}':\n{log}", path.display());
        ShaderError::Compile {
            stage,
            path: path.to_path_buf(),
            log,
        }
    };

    let module = glsl::Frontend::default()
        .parse(&glsl::Options::from(stage.to_naga()), source)
        .map_err(|errors| fail(errors.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|error| fail(error.emit_to_string(source)))?;

    log::info!("{stage} shader '{}' compiled", path.display());
    Ok(module)
}

fn link(vertex: &naga::Module, fragment: &naga::Module) -> Result<(), ShaderError> {
    log::info!("Linking program");

    let written = io_locations(vertex, naga::ShaderStage::Vertex, Interface::Outputs);
    let read = io_locations(fragment, naga::ShaderStage::Fragment, Interface::Inputs);

    let missing: Vec<String> = read
        .difference(&written)
        .map(|location| {
            format!("fragment input at location {location} is not written by the vertex stage")
        })
        .collect();

    if missing.is_empty() {
        log::info!("program linked");
        Ok(())
    } else {
        let log = missing.join("\n");
        log::error!("{log}");
        Err(ShaderError::Link { log })
    }
}

#[derive(Clone, Copy)]
enum Interface {
    Inputs,
    Outputs,
}

/// User-defined `location`s on one side of a stage's entry point.
fn io_locations(module: &naga::Module, stage: naga::ShaderStage, side: Interface) -> BTreeSet<u32> {
    let mut locations = BTreeSet::new();

    for entry in module.entry_points.iter().filter(|ep| ep.stage == stage) {
        let bindings: Vec<(Option<&naga::Binding>, naga::Handle<naga::Type>)> = match side {
            Interface::Inputs => entry
                .function
                .arguments
                .iter()
                .map(|arg| (arg.binding.as_ref(), arg.ty))
                .collect(),
            Interface::Outputs => entry
                .function
                .result
                .iter()
                .map(|res| (res.binding.as_ref(), res.ty))
                .collect(),
        };

        for (binding, ty) in bindings {
            match binding {
                Some(binding) => collect_location(binding, &mut locations),
                // Unbound values are structs whose members carry the bindings.
                None => {
                    if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                        for binding in members.iter().filter_map(|m| m.binding.as_ref()) {
                            collect_location(binding, &mut locations);
                        }
                    }
                }
            }
        }
    }

    locations
}

fn collect_location(binding: &naga::Binding, locations: &mut BTreeSet<u32>) {
    if let naga::Binding::Location { location, .. } = binding {
        locations.insert(*location);
    }
}

fn create_module(
    gpu: &GpuContext,
    stage: Stage,
    path: &Path,
    source: String,
) -> Result<wgpu::ShaderModule, ShaderError> {
    gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: path.to_str(),
            source: wgpu::ShaderSource::Glsl {
                shader: source.into(),
                stage: stage.to_naga(),
                defines: Default::default(),
            },
        });

    match pollster::block_on(gpu.device.pop_error_scope()) {
        None => Ok(module),
        Some(error) => {
            let log = error.to_string();
            log::error!("{stage} shader '{}' rejected by device:\n{log}", path.display());
            Err(ShaderError::Compile {
                stage,
                path: path.to_path_buf(),
                log,
            })
        }
    }
}
