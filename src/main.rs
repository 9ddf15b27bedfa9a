// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_results,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod command;

use std::{process, sync::Arc, time::Duration};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use course_planner::{
    config::{self, AmbiguousAuthPolicy, Config},
    error::Result,
    model::Token,
    service, storage,
};
use log::{error, warn};
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Status(command::status::Command),
    Login(command::login::Command),
    Logout(command::logout::Command),
    #[command(subcommand)]
    Plan(command::plan::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, planner: &command::Planner) -> Result<()> {
        match self {
            Self::Status(cmd) => cmd.execute(planner).await,
            Self::Login(cmd) => cmd.execute(planner).await,
            Self::Logout(cmd) => cmd.execute(planner).await,
            Self::Plan(cmd) => cmd.execute(planner).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the catalog service.
    #[arg(long, env = "PLANNER_URL", default_value = config::DEFAULT_URL, value_parser = Url::parse)]
    url: Url,

    /// Seconds to wait for the catalog service before giving up on a request.
    #[arg(long, env = "PLANNER_TIMEOUT", default_value_t = config::DEFAULT_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Treat the session as logged out when the identity check fails for a
    /// reason other than the service rejecting the token, unless the user was
    /// already verified.
    #[arg(long, env = "PLANNER_FAIL_CLOSED")]
    fail_closed: bool,

    /// Keep the identity token in memory only, so it is gone when the
    /// program exits.
    #[arg(long)]
    no_persist_token: bool,

    #[clap(subcommand)]
    command: Command,
}

fn get_token_storage(args: &Args) -> Box<dyn storage::Storage<Token>> {
    if !args.no_persist_token {
        match storage::File::new("token.json") {
            Ok(file_storage) => return Box::new(file_storage),
            Err(e) => {
                warn!("We need to fall back to in-memory token storage because we can't find a data directory: {}", e);
            }
        }
    }

    Box::new(storage::Memory::<Token>::new())
}

async fn run(args: Args) -> Result<()> {
    let policy = if args.fail_closed {
        AmbiguousAuthPolicy::FailClosed
    } else {
        AmbiguousAuthPolicy::FailOpen
    };
    let config = Config::new(args.url.clone())
        .with_timeout(Duration::from_secs(args.timeout))
        .with_ambiguous_auth_policy(policy);

    let service = Arc::new(service::Http::new(&config)?);
    let planner = command::Planner::new(&config, service, get_token_storage(&args));

    command::Command::execute(args.command, &planner).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("PLANNER_LOG", "warn")
        .write_style("PLANNER_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
