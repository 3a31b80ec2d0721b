use readback::browse::{browse_dir, browse_dir_by_node};
use readback::cli::{Args, Command};
use readback::config;
use readback::filter::Platform;
use readback::orchestrator::read_from_write;
use readback::session::{ConfirmPolicy, Session};
use readback::Settings;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::Path;

fn init_logging(args: &Args, path_config: &config::PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::data_file("readback.log", path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!(
            "Logging to file: {} (level: {:?})",
            log_path.display(),
            log_level
        );
    } else {
        // Console logging with specified verbosity level (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }

    Ok(())
}

fn open_session(scene: &Path, settings: &Settings) -> Result<Session> {
    let mut session = Session::load(scene)
        .with_context(|| format!("Failed to load scene: {}", scene.display()))?;
    session.set_filename_filter(Platform::current(), settings.drive_maps.clone());
    Ok(session)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    init_logging(&args, &path_config)?;
    debug!("Command-line args: {:?}", args);

    let settings = Settings::load_or_default(&path_config);
    info!(
        "Settings: {}",
        config::config_file(config::SETTINGS_FILE, &path_config).display()
    );

    match args.command {
        Command::ReadFromWrite {
            scene,
            yes,
            no,
            project_dir,
            select,
            output,
        } => {
            let mut session = open_session(&scene, &settings)?;
            session.set_confirm_policy(if yes {
                ConfirmPolicy::Yes
            } else if no {
                ConfirmPolicy::No
            } else {
                ConfirmPolicy::Interactive
            });
            if let Some(dir) = project_dir {
                session.root_mut().project_directory = Some(dir);
            }
            if !select.is_empty() {
                session.select(&select)?;
            }

            let report = read_from_write(&mut session, &settings);
            info!(
                "{} created, {} declined, {} failed",
                report.created.len(),
                report.declined.len(),
                report.failed.len()
            );
            for message in session.notifications() {
                eprintln!("{}", message);
            }

            match output {
                Some(path) => session
                    .save(&path)
                    .with_context(|| format!("Failed to write scene: {}", path.display()))?,
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Command::Browse { scene, target } => {
            let mut session = open_session(&scene, &settings)?;
            match target {
                Some(target) => browse_dir(&mut session, target)?,
                None => browse_dir_by_node(&mut session, &settings)?,
            }
            for message in session.notifications() {
                eprintln!("{}", message);
            }
        }
    }

    Ok(())
}
