use crate::compiler::{self, ShaderCompiler, Status};
use crate::config::BuildConfig;
use crate::fs;
use crate::shader::SourceFile;

use anyhow::Context;
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub source: SourceFile,
    pub output: PathBuf,
    pub status: Status,
}

/// One outcome per discovered source file, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BuildReport {
    pub fn compiled(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn log_summary(&self) {
        let failed = self.failed().count();
        let total = self.outcomes.len();
        if failed == 0 {
            log::info!("compiled {total} shader(s)");
        } else {
            log::error!("{failed} of {total} shader(s) failed to compile:");
            for outcome in self.failed() {
                log::error!("  {}", outcome.source.path().display());
            }
        }
    }
}

pub struct Driver {
    config: BuildConfig,
    compiler: Box<dyn ShaderCompiler>,
}

impl Driver {
    /// Builds the compiler backend named by `config.backend`.
    pub fn new(config: BuildConfig) -> Result<Self, anyhow::Error> {
        let compiler = compiler::from_config(&config)?;
        Ok(Self { config, compiler })
    }

    pub fn with_compiler(config: BuildConfig, compiler: Box<dyn ShaderCompiler>) -> Self {
        Self { config, compiler }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Compiles every recognized file of the input directory.
    ///
    /// Fails without compiling anything if the input directory cannot be
    /// listed or the output directory cannot be created, and stops at the
    /// first compiler that cannot be launched.
    pub fn run(&self) -> Result<BuildReport, anyhow::Error> {
        let config = &self.config;
        let sources = fs::find_sources(&config.input_dir, config.extensions.as_slice())
            .with_context(|| {
                format!("Failed to list shader sources in {}", config.input_dir.display())
            })?;
        log::debug!("found {} shader source(s) in {}", sources.len(), config.input_dir.display());

        if fs::ensure_dir(&config.output_dir).with_context(|| {
            format!("Failed to create output directory {}", config.output_dir.display())
        })? {
            log::info!("created {}", config.output_dir.display());
        }

        let outcomes = if config.jobs > 1 && sources.len() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.jobs)
                .build()
                .context("Failed to start compile workers")?;
            pool.install(|| {
                sources
                    .into_par_iter()
                    .map(|source| self.compile_one(source))
                    .collect::<Result<Vec<_>, _>>()
            })?
        } else {
            sources
                .into_iter()
                .map(|source| self.compile_one(source))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(BuildReport { outcomes })
    }

    fn compile_one(&self, source: SourceFile) -> Result<FileOutcome, anyhow::Error> {
        let output = source.output_path(&self.config.output_dir);
        let status = self.compiler.compile(&source, &output)?;
        match &status {
            Status::Compiled { warnings } => {
                log::info!("{} -> {}", source.name(), output.display());
                if !warnings.trim().is_empty() {
                    log::warn!("{}:\n{}", source.name(), warnings.trim_end());
                }
            }
            Status::Failed { code, diagnostics } => {
                let code = code.map_or_else(|| "none".to_owned(), |c| c.to_string());
                log::error!(
                    "{} failed (exit code {code}):\n{}",
                    source.path().display(),
                    diagnostics.trim_end(),
                );
            }
        }
        Ok(FileOutcome { source, output, status })
    }
}
