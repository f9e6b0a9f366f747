use crate::renderer::shader::ShaderStage;
use thiserror::Error;

/// Upper bound on any compiler, linker or validator log carried by an error.
pub const MAX_LOG_LEN: usize = 1024;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create window or graphics context: {0}")]
    ContextCreation(String),

    #[error("failed to compile {stage} shader:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("failed to link shader program:\n{log}")]
    ProgramLink { log: String },

    #[error("shader program failed validation:\n{log}")]
    ProgramValidation { log: String },

    #[error("failed to allocate {what}: {reason}")]
    Resource { what: &'static str, reason: String },

    #[error("failed to present frame: {0}")]
    Frame(String),
}

impl RenderError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RenderError::ContextCreation(_) => 1,
            RenderError::ShaderCompile { .. } => 2,
            RenderError::ProgramLink { .. } => 3,
            RenderError::ProgramValidation { .. } => 4,
            RenderError::Resource { .. } => 5,
            RenderError::Frame(_) => 6,
        }
    }

    pub fn resource(what: &'static str, reason: impl std::fmt::Debug) -> Self {
        RenderError::Resource {
            what,
            reason: format!("{:?}", reason),
        }
    }
}

/// Cuts a diagnostic log down to at most `MAX_LOG_LEN` bytes, on a char boundary.
pub fn bounded_log(log: &str) -> String {
    let log = log.trim_end();
    if log.len() <= MAX_LOG_LEN {
        return log.to_owned();
    }
    let mut end = MAX_LOG_LEN;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_owned()
}

pub type Result<T> = std::result::Result<T, RenderError>;
