use crate::error::{bounded_log, RenderError, Result};
use gfx_hal::pso;
use std::fmt;

pub const VERTEX_SOURCE: &str = r#"#version 450

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec2 a_texcoord;
layout(location = 2) in vec3 a_normal;
layout(location = 3) in vec4 a_color;

layout(location = 0) out vec4 v_color;

void main()
{
    gl_Position = vec4(a_position, 1.0);
    v_color = a_color;
}
"#;

// `time` is declared for later animation work and never written.
pub const FRAGMENT_SOURCE: &str = r#"#version 450

layout(location = 0) in vec4 v_color;

layout(location = 0) out vec4 f_color;

layout(set = 0, binding = 0) uniform Globals {
    float time;
};

void main()
{
    f_color = v_color;
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn glsl_type(self) -> glsl_to_spirv::ShaderType {
        match self {
            ShaderStage::Vertex => glsl_to_spirv::ShaderType::Vertex,
            ShaderStage::Fragment => glsl_to_spirv::ShaderType::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Compiles GLSL source to SPIR-V words.
///
/// On failure the compiler output becomes the error log, bounded to
/// `MAX_LOG_LEN` bytes.
pub fn compile(stage: ShaderStage, source: &str) -> Result<Vec<u32>> {
    let fail = |log: &str| RenderError::ShaderCompile {
        stage,
        log: bounded_log(log),
    };

    let file = glsl_to_spirv::compile(source, stage.glsl_type()).map_err(|err| fail(&err))?;
    let spirv = pso::read_spirv(file).map_err(|err| fail(&err.to_string()))?;
    if spirv.is_empty() {
        return Err(fail("compiler produced no SPIR-V"));
    }
    Ok(spirv)
}
