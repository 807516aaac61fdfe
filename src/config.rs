use anyhow::{bail, Context};
use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_TARGET_ENV: &str = "vulkan1.3";
pub const DEFAULT_EXTENSIONS: [&str; 6] = ["vert", "frag", "rgen", "rmiss", "rchit", "comp"];
pub const GLSL_DIR: &str = "resource/shaders/GLSL";
pub const SPIRV_DIR: &str = "resource/shaders/SPIR-V";

const COMPILER_NAME: &str = "glslc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Spawn the external compiler once per file.
    #[default]
    Glslc,
    /// Compile in-process through glslang.
    Glslang,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "glslc" => Ok(Self::Glslc),
            "glslang" => Ok(Self::Glslang),
            other => bail!("unknown backend {other:?}, expected \"glslc\" or \"glslang\""),
        }
    }
}

/// Everything a build run needs. Resolved once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub compiler: PathBuf,
    pub target_env: Option<String>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub extensions: Vec<String>,
    pub backend: Backend,
    pub jobs: usize,
}

impl BuildConfig {
    /// Default layout below `anchor`, with `glslc` looked up on `PATH`.
    pub fn new<P: AsRef<Path>>(anchor: P) -> Self {
        let anchor = anchor.as_ref();
        Self {
            compiler: PathBuf::from(format!("{COMPILER_NAME}{EXE_SUFFIX}")),
            target_env: Some(DEFAULT_TARGET_ENV.to_owned()),
            input_dir: anchor.join(GLSL_DIR),
            output_dir: anchor.join(SPIRV_DIR),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            backend: Backend::default(),
            jobs: 1,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BuildConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = lookup("SHADERBUILD_ROOT").filter(|root| !root.trim().is_empty());
        let anchor = match root {
            Some(root) => PathBuf::from(root),
            None => exe_dir()?,
        };
        let mut config = Self::new(&anchor);

        if let Some(compiler) = lookup("SHADERBUILD_COMPILER") {
            config.compiler = PathBuf::from(compiler);
        } else if let Some(sdk) = lookup("VULKAN_SDK") {
            config.compiler = sdk_compiler(Path::new(&sdk));
        }

        if let Some(env) = lookup("SHADERBUILD_TARGET_ENV") {
            let env = env.trim();
            config.target_env = (!env.is_empty()).then(|| env.to_owned());
        }

        if let Some(list) = lookup("SHADERBUILD_EXTENSIONS") {
            config.extensions = parse_extensions(&list)?;
        }

        if let Some(dir) = lookup("SHADERBUILD_INPUT_DIR") {
            config.input_dir = anchor.join(dir);
        }
        if let Some(dir) = lookup("SHADERBUILD_OUTPUT_DIR") {
            config.output_dir = anchor.join(dir);
        }

        if let Some(backend) = lookup("SHADERBUILD_BACKEND") {
            config.backend = backend.parse()?;
        }

        if let Some(jobs) = lookup("SHADERBUILD_JOBS") {
            config.jobs = match jobs.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => bail!("SHADERBUILD_JOBS must be a positive integer, got {jobs:?}"),
            };
        }

        Ok(config)
    }
}

fn exe_dir() -> Result<PathBuf, anyhow::Error> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let dir = exe.parent().context("Executable path has no parent directory")?;
    Ok(dir.to_path_buf())
}

/// The SDK ships `Bin/` on Windows and `bin/` elsewhere.
fn sdk_compiler(sdk: &Path) -> PathBuf {
    let name = format!("{COMPILER_NAME}{EXE_SUFFIX}");
    let candidates = [sdk.join("Bin").join(&name), sdk.join("bin").join(&name)];
    candidates
        .iter()
        .find(|path| path.is_file())
        .unwrap_or(&candidates[0])
        .clone()
}

fn parse_extensions(list: &str) -> Result<Vec<String>, anyhow::Error> {
    let mut extensions = Vec::new();
    for ext in list.split(',') {
        let ext = ext.trim().trim_start_matches('.');
        if !ext.is_empty() && !extensions.iter().any(|e| e == ext) {
            extensions.push(ext.to_owned());
        }
    }
    if extensions.is_empty() {
        bail!("SHADERBUILD_EXTENSIONS does not name any extension: {list:?}");
    }
    Ok(extensions)
}
