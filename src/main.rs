mod config;
mod replay;
mod services;
mod state;
mod store;

use std::sync::Arc;
use std::time::Duration;

use canvas::engine::PlaceError;
use canvas::focus;
use canvas::grid::GridStore;
use canvas::render;
use clap::Parser;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{Cli, Command, ConfigError, StoreConfig};
use crate::replay::{ReplayCommand, ReplayError};
use crate::services::session::{Session, SessionError, SessionHandle, ViewSnapshot};
use crate::services::sync::LiveSyncConfig;
use crate::state::AppState;
use crate::store::http::HttpStore;
use crate::store::{RemoteStore, StoreError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("placement rejected: {0}")]
    Place(#[from] PlaceError),
    #[error("store did not accept the placement at ({x}, {y})")]
    AppendFailed { x: i32, y: i32 },
    #[error("failed to wait for ctrl-c: {0}")]
    Signal(#[from] std::io::Error),
    #[error("session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenv {
        debug!(error = %e, "no .env file loaded");
    }

    let cli = Cli::parse();
    let viewport = cli.viewport()?;
    let store_config = StoreConfig::from_cli(&cli)?;
    let store: Arc<dyn RemoteStore> = Arc::new(HttpStore::new(&store_config)?);
    let state = AppState::new(store, cli.identity());
    let live = LiveSyncConfig {
        connect_timeout: Duration::from_secs(store_config.timeouts.connect_secs),
        ..LiveSyncConfig::default()
    };

    match cli.command {
        Command::Watch => run_watch(state, viewport, live).await,
        Command::Place { x, y, color } => run_place(state, viewport, live, x, y, color).await,
        Command::Focus => run_focus(&state, viewport).await,
        Command::Replay { input } => run_replay(state, viewport, live, &input).await,
    }
}

/// A session loop spawned onto the runtime, stoppable from the caller.
struct Running {
    handle: SessionHandle,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Running {
    async fn spawn(state: AppState, viewport: (f64, f64), live: LiveSyncConfig) -> Self {
        let session = Session::start_with(state, viewport, live).await;
        let handle = session.handle();
        let (stop, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(session.run(async move {
            if stop_rx.await.is_err() {
                debug!("stop sender dropped; shutting down");
            }
        }));
        Self { handle, stop, task }
    }

    async fn shutdown(self) -> Result<(), CliError> {
        if self.stop.send(()).is_err() {
            debug!("session already stopped");
        }
        self.task.await?;
        Ok(())
    }
}

async fn run_watch(state: AppState, viewport: (f64, f64), live: LiveSyncConfig) -> Result<(), CliError> {
    let session = Session::start_with(state, viewport, live).await;
    info!("watching; press ctrl-c to stop");
    let (signal_tx, signal_rx) = oneshot::channel();
    let task = tokio::spawn(session.run(async move {
        let result = tokio::signal::ctrl_c().await;
        if signal_tx.send(result).is_err() {
            debug!("signal receiver dropped");
        }
    }));
    task.await?;
    if let Ok(result) = signal_rx.await {
        result?;
    }
    Ok(())
}

async fn run_place(
    state: AppState,
    viewport: (f64, f64),
    live: LiveSyncConfig,
    x: i32,
    y: i32,
    color: String,
) -> Result<(), CliError> {
    let running = Running::spawn(state, viewport, live).await;
    let outcome = place_once(&running.handle, x, y, color).await;
    running.shutdown().await?;
    let value = outcome?;
    print_json(&value)
}

async fn place_once(handle: &SessionHandle, x: i32, y: i32, color: String) -> Result<Value, CliError> {
    handle.set_color(color).await?;
    let pending = handle.place(x, y).await??;
    let appended = pending.appended.await.unwrap_or(false);
    if !appended {
        return Err(CliError::AppendFailed { x, y });
    }
    let snapshot = handle.snapshot().await?;
    Ok(json!({
        "x": pending.cell.x,
        "y": pending.cell.y,
        "color": pending.cell.color,
        "author": pending.cell.author_name,
        "cooldown_secs": snapshot.cooldown_secs,
    }))
}

async fn run_focus(state: &AppState, (width, height): (f64, f64)) -> Result<(), CliError> {
    let cells = state.store.fetch_all_cells().await?;
    let mut grid = GridStore::new();
    let stored = grid.load_bulk(cells);
    let focus = focus::initial_focus(&grid);
    let camera = focus::initial_camera(&grid, width, height);
    print_json(&json!({
        "cells": stored,
        "bucket": [focus.bucket.0, focus.bucket.1],
        "world": { "x": focus.world.x, "y": focus.world.y },
        "zoom": focus.zoom,
        "camera": { "pan_x": camera.pan_x, "pan_y": camera.pan_y, "zoom": camera.zoom },
        "transform": render::css_transform(&camera),
    }))
}

async fn run_replay(state: AppState, viewport: (f64, f64), live: LiveSyncConfig, input: &str) -> Result<(), CliError> {
    let commands = replay::read_script(input)?;
    let running = Running::spawn(state, viewport, live).await;
    let outcome = replay_commands(&running.handle, commands).await;
    running.shutdown().await?;
    let snapshot = outcome?;
    print_json(&snapshot_json(&snapshot))
}

async fn replay_commands(handle: &SessionHandle, commands: Vec<ReplayCommand>) -> Result<ViewSnapshot, CliError> {
    let count = commands.len();
    for command in commands {
        match command {
            ReplayCommand::Pointer(event) => handle.pointer(event).await?,
            ReplayCommand::Color(color) => handle.set_color(color).await?,
        }
    }
    info!(count, "replayed script");
    Ok(handle.snapshot().await?)
}

fn snapshot_json(snapshot: &ViewSnapshot) -> Value {
    json!({
        "loading": snapshot.loading,
        "cells": snapshot.cell_count,
        "camera": {
            "pan_x": snapshot.camera.pan_x,
            "pan_y": snapshot.camera.pan_y,
            "zoom": snapshot.camera.zoom,
        },
        "transform": snapshot.transform,
        "zoom_label": snapshot.zoom_label,
        "hover": snapshot.hover.map(|coord| [coord.x(), coord.y()]),
        "hover_outline": snapshot.hover_outline.map(|outline| json!({
            "x": outline.x,
            "y": outline.y,
            "inner_width": outline.inner_width,
            "outer_width": outline.outer_width,
        })),
        "tooltip": snapshot.tooltip,
        "tooltip_anchor": snapshot.tooltip_anchor.map(|at| [at.x, at.y]),
        "color": snapshot.color,
        "can_place": snapshot.can_place,
        "cooldown": snapshot.cooldown_label,
        "last_changed": snapshot.last_changed,
        "pending_appends": snapshot.pending_appends,
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
