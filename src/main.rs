// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use jera_kube::cli::CliArgs;
use jera_kube::ExitKind;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // RUST_LOG wins over --verbose.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = args.app_context();
    match args.command.execute(&ctx).await {
        Ok(()) => ExitCode::from(ExitKind::Success.code()),
        Err(err) => {
            let kind = ExitKind::from_anyhow(&err);
            if kind == ExitKind::Cancelled {
                eprintln!("\nCancelled");
            } else {
                eprintln!("✗ {:#}", err);
            }
            ExitCode::from(kind.code())
        }
    }
}
