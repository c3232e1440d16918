use gifreel::cli::{Args, Command};
use gifreel::config::{self, PathConfig, Settings};
use gifreel::core::runner::{run_playback, SleepClock};
use gifreel::entities::{DiscardDecision, Frame, Project};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

fn main() {
    let args = Args::parse();

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    if let Err(e) = init_logging(&args, &path_config) {
        eprintln!("Warning: {:#}", e);
    }

    if let Err(e) = run(args, &path_config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
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

fn run(args: Args, path_config: &PathConfig) -> Result<()> {
    let settings_path = config::config_file(config::SETTINGS_FILE, path_config);
    let mut settings = Settings::load(&settings_path);
    debug!("Command-line args: {:?}", args);
    info!("Settings: {}", settings_path.display());

    match args.command {
        Command::Info { input } => cmd_info(&input, &settings)?,
        Command::Build { inputs, output, duration, durations, mode } => {
            let mut project = Project::new(&settings);
            if let Some(ms) = duration {
                project.timeline.set_default_duration(ms);
            }
            if let Some(mode) = mode {
                project.set_animation_mode(mode);
            }
            project.add_images(&inputs);
            if durations.len() > inputs.len() {
                warn!("{} durations given for {} images, extra ignored", durations.len(), inputs.len());
            }
            for (index, ms) in durations.into_iter().enumerate() {
                project.timeline.set_duration(index, ms);
            }
            let summary = project.save_as(&output)?;
            println!(
                "Saved {} frame(s) ({}x{}) to {}",
                summary.frames,
                summary.width,
                summary.height,
                summary.path.display()
            );
            if summary.dropped > 0 {
                println!("{} frame(s) could not be loaded and were skipped", summary.dropped);
            }
        }
        Command::Retime { input, output, duration, force, frames, drop, reverse } => {
            let mut project = open(&input, &settings)?;
            project.player.stop();

            if let Some(ms) = duration {
                project.timeline.set_default_duration(ms);
            }
            if force {
                project.overwrite_all_durations();
            }
            for (index, ms) in frames {
                if !project.timeline.set_duration(index, ms) {
                    warn!("No frame {} to retime", index);
                }
            }
            let mut drop = drop;
            drop.sort_unstable();
            drop.dedup();
            for index in drop.into_iter().rev() {
                if project.timeline.remove(index).is_none() {
                    warn!("No frame {} to drop", index);
                }
            }
            if reverse {
                reverse_frames(&mut project);
            }

            let summary = match output {
                Some(path) => project.save_as(&path)?,
                None => project.save()?,
            };
            println!("Saved {} frame(s) to {}", summary.frames, summary.path.display());
        }
        Command::Split { input, output, only } => {
            let mut project = open(&input, &settings)?;
            project.player.stop();
            let n = project.timeline.len();
            let wanted: Vec<usize> = if only.is_empty() { (0..n).collect() } else { only };
            for index in wanted {
                if !project.timeline.set_checked(index, true) {
                    warn!("No frame {} to export", index);
                }
            }

            let dir = output
                .or_else(|| settings.last_export_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let written = project.export_checked(&dir)?;
            settings.last_export_dir = Some(dir.clone());
            println!("Exported {} frame(s) to {}", written.len(), dir.display());
        }
        Command::Play { inputs, mode, ticks } => {
            let mut project = if is_single_gif(&inputs) {
                open(&inputs[0], &settings)?
            } else {
                let mut project = Project::new(&settings);
                project.add_images(&inputs);
                project
            };
            if let Some(mode) = mode {
                project.set_animation_mode(mode);
            }
            project.player.stop();

            let mut sink = |index: usize, frame: &Frame| {
                println!("[{:>3}] {} ({} ms)", index, frame.display_name, frame.duration_ms);
            };
            run_playback(&mut project.player, &mut project.timeline, ticks, &mut SleepClock, &mut sink);
        }
    }

    if let Err(e) = settings.save(&settings_path) {
        warn!("Could not save settings: {:#}", e);
    }
    Ok(())
}

fn open(path: &Path, settings: &Settings) -> Result<Project> {
    let mut project = Project::new(settings);
    if !project.open_gif(path, || DiscardDecision::Discard)? {
        bail!("Open cancelled");
    }
    Ok(project)
}

fn cmd_info(input: &Path, settings: &Settings) -> Result<()> {
    let project = open(input, settings)?;
    let timeline = &project.timeline;
    println!("{}: {} frame(s), default {} ms", input.display(), timeline.len(), timeline.default_duration_ms());
    for (index, frame) in timeline.frames().iter().enumerate() {
        let pin = if frame.is_custom_duration { "*" } else { " " };
        println!("[{:>3}] {:<24} {:>6} ms{}", index, frame.display_name, frame.duration_ms, pin);
    }
    let total: u64 = timeline.frames().iter().map(|f| u64::from(f.duration_ms)).sum();
    println!("total {} ms", total);
    Ok(())
}

/// Reverse order with adjacent moves, like repeated "move down" clicks.
fn reverse_frames(project: &mut Project) {
    let n = project.timeline.len();
    for end in (1..n).rev() {
        for index in 0..end {
            project.timeline.move_frame(index, 1);
        }
    }
}

fn is_single_gif(inputs: &[PathBuf]) -> bool {
    inputs.len() == 1
        && inputs[0]
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("gif"))
}
