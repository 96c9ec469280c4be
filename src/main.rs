//! # Main Entry Point
//!
//! Initializes the application:
//! - Domain: Configuration and Types
//! - Infrastructure: LLM client, tool locator and executor
//! - Application: Resolver, Dispatcher, Plan workflow, Logging
//! - Interface: CLI parsing, Command Handlers, Reporter
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;
#[cfg(test)]
mod testing;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use crate::domain::config::AppConfig;
use crate::infrastructure::llm::Client as LlmClient;
use crate::infrastructure::tools::executor::ToolExecutor;
use crate::infrastructure::tools::locator::SystemLocator;
use crate::interface::cli::Cli;
use crate::interface::commands::{self, AppContext};
use crate::interface::report::Reporter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Usage errors exit with 2 from here
    let cli = Cli::parse();
    let mut reporter = Reporter::new(cli.format);

    // 1. Load Configuration
    let config = match AppConfig::load(cli.config.as_deref()).context("Failed to load configuration") {
        Ok(config) => config,
        Err(e) => {
            reporter.fail(&e);
            return ExitCode::FAILURE;
        }
    };

    // 2. Logging Setup (file only)
    let _log_guard = application::logging::init(&config);

    // 3. Initialize Infrastructure
    let local_bin = config.local_bin_dir();
    let ctx = AppContext {
        llm: Arc::new(LlmClient::new(config.ai.clone())),
        locator: Arc::new(SystemLocator::new(local_bin.clone())),
        executor: ToolExecutor::new(local_bin, config.commands.timeout),
        config,
    };

    // 4. Run the command
    match commands::run(&ctx, &mut reporter, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.fail(&e);
            ExitCode::FAILURE
        }
    }
}
