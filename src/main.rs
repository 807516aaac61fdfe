use shaderbuild::{BuildConfig, CompilerLaunchError, Driver};

use anyhow::Context;
use std::process::ExitCode;

/// Every shader compiled.
const EXIT_OK: u8 = 0;
/// At least one shader was rejected by the compiler.
const EXIT_FAILED: u8 = 1;
/// Nothing could be compiled: bad configuration, missing directories or compiler.
const EXIT_FATAL: u8 = 2;

fn run() -> Result<bool, anyhow::Error> {
    let config = BuildConfig::from_env().context("Invalid configuration")?;
    log::debug!("{config:#?}");

    let driver = Driver::new(config)?;
    let report = driver.run()?;
    report.log_summary();
    Ok(report.is_success())
}

fn exit_code(result: &Result<bool, anyhow::Error>) -> u8 {
    match result {
        Ok(true) => EXIT_OK,
        Ok(false) => EXIT_FAILED,
        Err(_) => EXIT_FATAL,
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = run();
    if let Err(err) = &result {
        if err.downcast_ref::<CompilerLaunchError>().is_some() {
            log::error!("Shader compiler is not available, set VULKAN_SDK or SHADERBUILD_COMPILER");
        }
        log::error!("{err:#}");
        log::debug!("{err:#?}");
    }
    ExitCode::from(exit_code(&result))
}
