use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Suffix appended to a source file name to get its artifact name.
pub const SPIRV_SUFFIX: &str = "spv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
    RayGeneration,
    RayMiss,
    RayClosestHit,
    Compute,
}

impl Stage {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "vert" => Some(Self::Vertex),
            "frag" => Some(Self::Fragment),
            "rgen" => Some(Self::RayGeneration),
            "rmiss" => Some(Self::RayMiss),
            "rchit" => Some(Self::RayClosestHit),
            "comp" => Some(Self::Compute),
            _ => None,
        }
    }
}

/// A GLSL file found in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    file_name: OsString,
    extension: String,
}

impl SourceFile {
    /// Returns `None` for paths without a file name or without a UTF-8 extension.
    /// The rest of the file name may be any bytes the platform allows.
    pub fn new<P: Into<PathBuf>>(path: P) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_owned();
        let extension = path.extension().and_then(OsStr::to_str)?.to_owned();
        Some(Self { path, file_name, extension })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &OsStr {
        &self.file_name
    }

    /// File name for logs, with invalid UTF-8 replaced.
    pub fn name(&self) -> Cow<'_, str> {
        self.file_name.to_string_lossy()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn stage(&self) -> Option<Stage> {
        Stage::from_extension(&self.extension)
    }

    /// `out_dir/<file name>.spv`, the full file name is kept so `a.vert` and `a.frag` never collide.
    pub fn output_path(&self, out_dir: &Path) -> PathBuf {
        let mut name = self.file_name.clone();
        name.push(".");
        name.push(SPIRV_SUFFIX);
        out_dir.join(name)
    }
}
