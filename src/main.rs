// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use catchonika::capture::{CaptureSession, Source};
use catchonika::config::{ConfigEvent, ConfigFile, ConfigWatcher};
use catchonika::midi::{print_sources, InputHandler, InputSource, MidirInputs};
use catchonika::recording::{DirectorySink, ExportRange, ExportRequest, FileSink, SmfEncoder};
use catchonika::timing::{Clock, Millis};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How often the session is polled for a due sweep
const SWEEP_POLL: Duration = Duration::from_millis(250);

/// Default length of `export` without arguments
const DEFAULT_EXPORT_SECS: f64 = 60.0;

fn print_usage() {
    println!("Catchonika - always-on MIDI capture");
    println!();
    println!("Usage: catchonika [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --list-sources          List available MIDI sources (inputs)");
    println!("  --config <FILE>         Load (and watch) a YAML configuration file");
    println!("  --out <DIR>             Write exported files to DIR");
    println!("  --help                  Show this help message");
    println!();
    print_commands();
}

fn print_commands() {
    println!("Commands while capturing:");
    println!("  export [SECONDS|all] [BPM]   Export the last SECONDS (default 60) or everything");
    println!("  range <START_MS> <END_MS> [BPM]");
    println!("                               Export an explicit window of session time");
    println!("  status                       Show capture status");
    println!("  help                         Show these commands");
    println!("  quit                         Stop capturing");
}

/// A command typed while capturing
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Export(ExportRequest),
    Status,
    Help,
    Quit,
}

fn parse_bpm(arg: Option<&str>) -> Result<Option<f64>> {
    arg.map(|s| {
        s.parse::<f64>()
            .ok()
            .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
            .ok_or_else(|| anyhow!("Invalid BPM: {}", s))
    })
    .transpose()
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match name {
        "export" | "e" => {
            let range = match args.first() {
                None => ExportRange::Last(DEFAULT_EXPORT_SECS),
                Some(&"all") => ExportRange::All,
                Some(secs) => {
                    let secs: f64 = secs
                        .parse()
                        .ok()
                        .filter(|s: &f64| s.is_finite() && *s > 0.0)
                        .ok_or_else(|| anyhow!("Invalid number of seconds: {}", secs))?;
                    ExportRange::Last(secs)
                }
            };
            let mut request = ExportRequest::new(range);
            request.bpm = parse_bpm(args.get(1).copied())?;
            Command::Export(request)
        }
        "range" => {
            if args.len() < 2 {
                return Err(anyhow!("range requires START_MS and END_MS"));
            }
            let start: f64 = args[0]
                .parse()
                .map_err(|_| anyhow!("Invalid start: {}", args[0]))?;
            let end: f64 = args[1]
                .parse()
                .map_err(|_| anyhow!("Invalid end: {}", args[1]))?;
            let mut request = ExportRequest::new(ExportRange::Between(start, end));
            request.bpm = parse_bpm(args.get(2).copied())?;
            Command::Export(request)
        }
        "status" | "s" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(anyhow!("Unknown command: {} (type 'help')", other)),
    };

    Ok(Some(command))
}

fn export(session: &CaptureSession, sink: &dyn FileSink, request: &ExportRequest) {
    match session.export(request) {
        Ok(file) => match sink.deliver(&file.filename, &file.bytes) {
            Ok(path) => println!(
                "Saved {} ({} notes, {} tracks)",
                path.display(),
                file.plan.note_count(),
                file.plan.groups.len()
            ),
            Err(e) => eprintln!("Export failed: could not write {}: {}", file.filename, e),
        },
        Err(e) => eprintln!("Export failed: {}", e),
    }
}

fn refresh_inputs(inputs: &mut MidirInputs, session: &mut CaptureSession, announce: bool) {
    match inputs.refresh() {
        Ok(changes) => {
            session.set_inputs(inputs.sources().len());
            if announce || !changes.is_empty() {
                for source in &changes.connected {
                    println!("+ {}", source);
                }
                for source in &changes.disconnected {
                    println!("- {}", source);
                }
                println!("{}", session.status());
            }
        }
        Err(e) => {
            warn!(error = %e, "MIDI input scan failed");
            session.mark_unavailable(e.to_string());
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.001))
}

async fn run_capture(config_path: Option<PathBuf>, out_dir: Option<PathBuf>) -> Result<()> {
    let config = match &config_path {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    let mut session = CaptureSession::builder()
        .encoder(Arc::new(SmfEncoder::new()))
        .settings(config.session_settings())
        .build()
        .context("Failed to start capture session")?;

    let mut sink = DirectorySink::new(
        out_dir
            .clone()
            .unwrap_or_else(|| config.export.output_dir.clone()),
    );

    // Device callbacks stamp and forward; this task owns the session.
    let (tx, mut rx) = mpsc::unbounded_channel::<(Millis, Vec<u8>, Source)>();
    let clock = session.clock();
    let handler: InputHandler = Arc::new(move |bytes: &[u8], source: &Source| {
        let _ = tx.send((clock.now_ms(), bytes.to_vec(), source.clone()));
    });

    let mut inputs = match MidirInputs::new(handler) {
        Ok(mut inputs) => {
            refresh_inputs(&mut inputs, &mut session, true);
            Some(inputs)
        }
        Err(e) => {
            warn!(error = %e, "capture stays idle");
            session.mark_unavailable(e.to_string());
            println!("{}", session.status());
            None
        }
    };

    let watcher = match &config_path {
        Some(path) => match ConfigWatcher::new(path, None) {
            Ok(watcher) => {
                info!(path = %watcher.watched_path().display(), "watching configuration");
                Some(watcher)
            }
            Err(e) => {
                warn!(error = %e, "configuration hot reload disabled");
                None
            }
        },
        None => None,
    };

    let mut sweep_timer = interval(SWEEP_POLL);
    sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut rescan_timer = interval(secs(config.capture.rescan_interval_secs));
    rescan_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    info!(
        retention_minutes = session.settings().retention_minutes,
        output = %sink.dir().display(),
        "capture started"
    );
    println!("Type 'help' for commands.");

    loop {
        tokio::select! {
            Some((t, bytes, source)) = rx.recv() => {
                session.ingest_at(t, &bytes, &source);
            }
            _ = sweep_timer.tick() => {
                session.tick();
                if let Some(watcher) = &watcher {
                    for event in watcher.recv_all() {
                        match event {
                            ConfigEvent::Reloaded(config) => {
                                session.apply_settings(config.session_settings());
                                rescan_timer = interval(secs(config.capture.rescan_interval_secs));
                                rescan_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
                                if out_dir.is_none() {
                                    sink = DirectorySink::new(&config.export.output_dir);
                                }
                                println!("Configuration reloaded");
                            }
                            ConfigEvent::Error(e) => eprintln!("Configuration not applied: {}", e),
                        }
                    }
                }
            }
            _ = rescan_timer.tick() => {
                if let Some(inputs) = inputs.as_mut() {
                    refresh_inputs(inputs, &mut session, false);
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => match parse_command(&line) {
                        Ok(Some(Command::Export(request))) => export(&session, &sink, &request),
                        Ok(Some(Command::Status)) => println!("{}", session.status()),
                        Ok(Some(Command::Help)) => print_commands(),
                        Ok(Some(Command::Quit)) => break,
                        Ok(None) => {}
                        Err(e) => eprintln!("{}", e),
                    },
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Some(inputs) = inputs.as_mut() {
        inputs.disconnect_all();
    }
    info!("capture stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config_path = None;
    let mut out_dir = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--list-sources" => {
                print_sources()?;
                return Ok(());
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--config" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--out" => {
                let dir = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("--out requires a directory"))?;
                out_dir = Some(PathBuf::from(dir));
                i += 1;
            }
            other => {
                eprintln!("Error: unknown option {}", other);
                eprintln!("Run with --help for usage information");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    run_capture(config_path, out_dir).await
}
