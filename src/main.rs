// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Triptych CLI entrypoint.
//!
//! Serves the live sync protocol over WebSocket at
//! `ws://127.0.0.1:<port>/sync` and keeps the drawing, interchange and
//! canvas files in the sync directory consistent with it.

use std::error::Error;
use std::sync::Arc;

use triptych::sync::watch::spawn_watchers;
use triptych::sync::{SyncEngine, SyncPaths};

const DEFAULT_PORT: u16 = 3000;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<sync-dir>] [--port <port>]\n  {program} [--dir <dir>] [--port <port>]\n\nServes the sync WebSocket at `ws://127.0.0.1:<port>/sync` (default port {DEFAULT_PORT}).\n\nIf sync-dir/--dir is omitted, the current working directory is used. The directory\nholds `drawing.json` (live snapshot), `diagram.ocif.json` (interchange) and\n`diagram.canvas` (canvas); the drawing and canvas files are watched for edits."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    sync_dir: Option<String>,
    port: Option<u16>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dir" => {
                if options.sync_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                options.sync_dir = Some(dir);
            }
            "--port" => {
                if options.port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.port = Some(port);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.sync_dir.is_some() {
                    return Err(());
                }
                options.sync_dir = Some(arg);
            }
        }
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "triptych".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "triptych=info".into()),
            )
            .init();

        let dir = options.sync_dir.unwrap_or_else(|| ".".to_owned());
        let port = options.port.unwrap_or(DEFAULT_PORT);

        let engine = Arc::new(SyncEngine::new(SyncPaths::in_dir(&dir))?);

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        runtime.block_on(async move {
            let watch_guard = spawn_watchers(engine.clone())?;

            let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
            let addr = listener.local_addr()?;
            tracing::info!(dir = %dir, %addr, "triptych sync server listening");

            let router = triptych::server::router(engine);
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("shutting down");
                })
                .await?;

            drop(watch_guard);
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("triptych: {err}");
        std::process::exit(1);
    }
}
