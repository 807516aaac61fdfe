pub mod compiler;
pub mod config;
pub mod driver;
pub mod fs;
pub mod shader;

pub use compiler::{CompilerLaunchError, ShaderCompiler, Status};
pub use config::{Backend, BuildConfig};
pub use driver::{BuildReport, Driver, FileOutcome};
pub use shader::{SourceFile, Stage};
