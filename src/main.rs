// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mizan::config::Settings;
use mizan::server::{self, AppState};
use mizan::{cli, commands, db};

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = std::env::var("MIZAN_LOG")
        .ok()
        .and_then(|s| EnvFilter::try_new(s).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    init_tracing(matches.get_count("verbose"));

    let path = match matches.get_one::<String>("db") {
        Some(p) => PathBuf::from(p),
        None => db::db_path()?,
    };
    let conn = db::open_at(&path)?;
    let settings = Settings::load(&conn)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", path.display());
        }
        Some(("calc", sub)) => commands::calculate::handle(sub, &settings)?,
        Some(("client", sub)) => commands::clients::handle(&conn, sub)?,
        Some(("contract", sub)) => {
            let notary = settings.notarizer(&path)?;
            commands::contracts::handle(&conn, sub, &settings, notary.as_ref())?
        }
        Some(("doc", sub)) => commands::documents::handle(&conn, sub, &settings)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("chain", sub)) => commands::chain::handle(&conn, sub, &settings)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub, &settings)?,
        Some(("audit", sub)) => commands::audit::handle(&conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("doctor", sub)) => commands::doctor::handle(&conn, sub)?,
        Some(("serve", sub)) => {
            let addr: SocketAddr = match sub.get_one::<String>("bind") {
                Some(b) => b
                    .parse()
                    .with_context(|| format!("Invalid bind address '{}'", b))?,
                None => settings.bind,
            };
            let notary = settings.notarizer(&path)?;
            let state = AppState::new(conn, notary, settings.status_policy, settings.currency);
            let rt = tokio::runtime::Runtime::new().context("Start async runtime")?;
            rt.block_on(server::run(state, addr))?;
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
