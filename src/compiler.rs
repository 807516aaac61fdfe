use crate::config::{Backend, BuildConfig};
use crate::shader::{SourceFile, Stage};

use anyhow::{bail, Context};
use glslang::{
    Compiler, CompilerOptions, ShaderInput, ShaderSource, ShaderStage, SpirvVersion, Target,
    VulkanVersion,
};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Result of one compile attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The artifact was written. `warnings` holds whatever the compiler printed.
    Compiled { warnings: String },
    /// The compiler rejected the source. `code` is `None` when there is no exit code.
    Failed { code: Option<i32>, diagnostics: String },
}

impl Status {
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Compiled { .. })
    }
}

/// The compiler executable could not be started at all.
#[derive(Debug)]
pub struct CompilerLaunchError {
    pub compiler: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for CompilerLaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to launch shader compiler {}: {}", self.compiler.display(), self.source)
    }
}

impl std::error::Error for CompilerLaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Turns one GLSL source into one SPIR-V file.
///
/// An `Err` means no compile could be attempted and the whole batch should
/// stop. A rejected shader is reported as [`Status::Failed`] instead.
pub trait ShaderCompiler: Send + Sync {
    fn compile(&self, source: &SourceFile, output: &Path) -> Result<Status, anyhow::Error>;
}

pub fn from_config(config: &BuildConfig) -> Result<Box<dyn ShaderCompiler>, anyhow::Error> {
    Ok(match config.backend {
        Backend::Glslc => Box::new(Glslc::new(&config.compiler, config.target_env.clone())),
        Backend::Glslang => Box::new(Glslang::new(config.target_env.as_deref())?),
    })
}

/// The external `glslc` executable.
#[derive(Debug, Clone)]
pub struct Glslc {
    path: PathBuf,
    target_env: Option<String>,
}

impl Glslc {
    pub fn new<P: Into<PathBuf>>(path: P, target_env: Option<String>) -> Self {
        Self { path: path.into(), target_env }
    }

    pub fn command(&self, source: &SourceFile, output: &Path) -> Command {
        let mut cmd = Command::new(&self.path);
        if let Some(env) = &self.target_env {
            cmd.arg(format!("--target-env={env}"));
        }
        cmd.arg(source.path()).arg("-o").arg(output);
        cmd
    }
}

impl ShaderCompiler for Glslc {
    fn compile(&self, source: &SourceFile, output: &Path) -> Result<Status, anyhow::Error> {
        let mut cmd = self.command(source, output);
        log::debug!("running {cmd:?}");

        let result = cmd.output().map_err(|source| CompilerLaunchError {
            compiler: self.path.clone(),
            source,
        })?;

        let mut text = String::from_utf8_lossy(&result.stderr).into_owned();
        let stdout = String::from_utf8_lossy(&result.stdout);
        if !stdout.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stdout);
        }

        if result.status.success() {
            Ok(Status::Compiled { warnings: text })
        } else {
            Ok(Status::Failed { code: result.status.code(), diagnostics: text })
        }
    }
}

/// In-process compilation through the glslang library.
pub struct Glslang {
    options: CompilerOptions,
}

impl Glslang {
    pub fn new(target_env: Option<&str>) -> Result<Self, anyhow::Error> {
        let options = match target_env {
            Some(env) => CompilerOptions { target: parse_target(env)?, ..CompilerOptions::default() },
            None => CompilerOptions::default(),
        };
        Ok(Self { options })
    }

    fn compile_code(&self, stage: ShaderStage, path: &Path) -> Result<Vec<u32>, anyhow::Error> {
        let source: ShaderSource = std::fs::read_to_string(path)?.into();
        let compiler = Compiler::acquire().context("glslang could not be initialized")?;
        let input = ShaderInput::new(&source, stage, &self.options, None, None)?;
        let shader = compiler.create_shader(input)?;
        Ok(shader.compile()?)
    }
}

impl ShaderCompiler for Glslang {
    fn compile(&self, source: &SourceFile, output: &Path) -> Result<Status, anyhow::Error> {
        let Some(stage) = source.stage() else {
            return Ok(Status::Failed {
                code: None,
                diagnostics: format!("no shader stage is known for .{} files", source.extension()),
            });
        };
        log::debug!("compiling {} in-process as {stage:?}", source.path().display());

        let code = match self.compile_code(glslang_stage(stage), source.path()) {
            Ok(code) => code,
            Err(err) => {
                return Ok(Status::Failed { code: None, diagnostics: format!("{err:#}") });
            }
        };

        let bytes: Vec<u8> = code.iter().flat_map(|word| word.to_le_bytes()).collect();
        std::fs::write(output, bytes)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        Ok(Status::Compiled { warnings: String::new() })
    }
}

fn glslang_stage(stage: Stage) -> ShaderStage {
    match stage {
        Stage::Vertex => ShaderStage::Vertex,
        Stage::Fragment => ShaderStage::Fragment,
        Stage::RayGeneration => ShaderStage::RayGeneration,
        Stage::RayMiss => ShaderStage::Miss,
        Stage::RayClosestHit => ShaderStage::ClosestHit,
        Stage::Compute => ShaderStage::Compute,
    }
}

/// Accepts the `glslc --target-env` spellings for Vulkan.
fn parse_target(env: &str) -> Result<Target, anyhow::Error> {
    let (version, spirv_version) = match env {
        "vulkan" | "vulkan1.0" => (VulkanVersion::Vulkan1_0, SpirvVersion::SPIRV1_0),
        "vulkan1.1" => (VulkanVersion::Vulkan1_1, SpirvVersion::SPIRV1_3),
        "vulkan1.2" => (VulkanVersion::Vulkan1_2, SpirvVersion::SPIRV1_5),
        "vulkan1.3" => (VulkanVersion::Vulkan1_3, SpirvVersion::SPIRV1_6),
        other => bail!("target environment {other:?} is not supported by the glslang backend"),
    };
    Ok(Target::Vulkan { version, spirv_version })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_with_target_env() {
        let glslc = Glslc::new("glslc", Some("vulkan1.3".to_owned()));
        let src = SourceFile::new("/in/basic.vert").unwrap();
        let cmd = glslc.command(&src, Path::new("/out/basic.vert.spv"));
        assert_eq!(cmd.get_program(), "glslc");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["--target-env=vulkan1.3", "/in/basic.vert", "-o", "/out/basic.vert.spv"]);
    }

    #[test]
    fn command_line_without_target_env() {
        let glslc = Glslc::new("glslc", None);
        let src = SourceFile::new("/in/basic.frag").unwrap();
        let cmd = glslc.command(&src, Path::new("/out/basic.frag.spv"));
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["/in/basic.frag", "-o", "/out/basic.frag.spv"]);
    }

    #[test]
    fn missing_executable_is_a_launch_error() {
        let glslc = Glslc::new("/definitely/not/here/glslc", None);
        let src = SourceFile::new("/in/basic.vert").unwrap();
        let err = glslc.compile(&src, Path::new("/out/basic.vert.spv")).unwrap_err();
        let launch = err.downcast_ref::<CompilerLaunchError>().unwrap();
        assert_eq!(launch.compiler, Path::new("/definitely/not/here/glslc"));
        assert_eq!(launch.source.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn unknown_target_env_is_rejected_in_process() {
        assert!(Glslang::new(Some("opengl4.5")).is_err());
        assert!(Glslang::new(Some("vulkan1.2")).is_ok());
        assert!(Glslang::new(None).is_ok());
    }

    #[test]
    fn in_process_compile_writes_spirv() {
        let dir = std::env::temp_dir().join(format!("shaderbuild-glslang-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("basic.vert");
        std::fs::write(&path, "#version 450\nvoid main() {\n    gl_Position = vec4(0.0);\n}\n").unwrap();
        let src = SourceFile::new(&path).unwrap();
        let out = src.output_path(&dir);

        let status = Glslang::new(Some("vulkan1.3")).unwrap().compile(&src, &out).unwrap();
        assert!(status.is_success(), "{status:?}");
        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(bytes[..4], 0x0723_0203u32.to_le_bytes());

        std::fs::write(&path, "#version 450\nvoid main() { undefined(); }\n").unwrap();
        let status = Glslang::new(None).unwrap().compile(&src, &out).unwrap();
        assert!(matches!(status, Status::Failed { code: None, .. }));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn in_process_rejects_unknown_stage() {
        let src = SourceFile::new("/in/common.glsl").unwrap();
        let status = Glslang::new(None).unwrap().compile(&src, Path::new("/out/x.spv")).unwrap();
        assert!(!status.is_success());
    }
}
