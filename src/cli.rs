use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::entities::timeline::AnimationMode;

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Raster: image 0.25\n",
    "Vector: resvg\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Animated GIF frame editor
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging to file (default: gifreel.log in the data dir)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the frames of an animated GIF
    Info {
        #[arg(value_name = "GIF")]
        input: PathBuf,
    },

    /// Assemble still images (PNG, JPEG, SVG, ...) into an animated GIF
    Build {
        #[arg(value_name = "IMAGE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output GIF
        #[arg(short = 'o', long = "output", value_name = "GIF")]
        output: PathBuf,

        /// Default frame duration in ms (settings value if omitted)
        #[arg(short = 'd', long = "duration", value_name = "MS")]
        duration: Option<u32>,

        /// Per-frame durations in ms, in input order
        #[arg(long = "durations", value_name = "MS,MS,...", value_delimiter = ',')]
        durations: Vec<u32>,

        /// Animation mode stored with the timeline
        #[arg(short = 'm', long = "mode", value_enum)]
        mode: Option<AnimationMode>,
    },

    /// Re-time and edit an animated GIF
    Retime {
        #[arg(value_name = "GIF")]
        input: PathBuf,

        /// Output GIF (defaults to overwriting the input)
        #[arg(short = 'o', long = "output", value_name = "GIF")]
        output: Option<PathBuf>,

        /// New default duration in ms (pinned frames keep theirs)
        #[arg(short = 'd', long = "duration", value_name = "MS")]
        duration: Option<u32>,

        /// Apply the default duration to every frame, including pinned ones
        #[arg(long = "force")]
        force: bool,

        /// Set one frame's duration (0-based index)
        #[arg(long = "frame", value_name = "IDX=MS", value_parser = parse_frame_duration)]
        frames: Vec<(usize, u32)>,

        /// Remove a frame (0-based index, applied after retiming)
        #[arg(long = "drop", value_name = "IDX")]
        drop: Vec<usize>,

        /// Reverse frame order
        #[arg(long = "reverse")]
        reverse: bool,
    },

    /// Write frames of an animated GIF as individual images
    Split {
        #[arg(value_name = "GIF")]
        input: PathBuf,

        /// Target directory (last export dir, else current dir)
        #[arg(short = 'o', long = "output", value_name = "DIR")]
        output: Option<PathBuf>,

        /// Export only these frames (0-based); all frames if omitted
        #[arg(long = "only", value_name = "IDX")]
        only: Vec<usize>,
    },

    /// Play a GIF or still images in the terminal, printing each frame shown
    Play {
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short = 'm', long = "mode", value_enum)]
        mode: Option<AnimationMode>,

        /// Number of ticks to run
        #[arg(short = 'n', long = "ticks", value_name = "N", default_value = "10")]
        ticks: usize,
    },
}

/// Parse `IDX=MS`
fn parse_frame_duration(s: &str) -> Result<(usize, u32), String> {
    let (idx, ms) = s
        .split_once('=')
        .ok_or_else(|| format!("expected IDX=MS, got '{}'", s))?;
    let idx = idx.trim().parse().map_err(|e| format!("bad index '{}': {}", idx, e))?;
    let ms = ms.trim().parse().map_err(|e| format!("bad duration '{}': {}", ms, e))?;
    Ok((idx, ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_duration() {
        assert_eq!(parse_frame_duration("2=150"), Ok((2, 150)));
        assert_eq!(parse_frame_duration(" 0 = 40 "), Ok((0, 40)));
        assert!(parse_frame_duration("2:150").is_err());
        assert!(parse_frame_duration("x=1").is_err());
    }

    #[test]
    fn test_build_args() {
        let args = Args::try_parse_from([
            "gifreel", "-vv", "build", "a.png", "b.svg", "-o", "out.gif", "--durations", "100,250", "-m", "wave",
        ])
        .unwrap();
        assert_eq!(args.verbosity, 2);
        match args.command {
            Command::Build { inputs, output, durations, mode, duration } => {
                assert_eq!(inputs, vec![PathBuf::from("a.png"), PathBuf::from("b.svg")]);
                assert_eq!(output, PathBuf::from("out.gif"));
                assert_eq!(durations, vec![100, 250]);
                assert_eq!(mode, Some(AnimationMode::Wave));
                assert_eq!(duration, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_retime_args() {
        let args = Args::try_parse_from([
            "gifreel", "retime", "in.gif", "--frame", "1=300", "--frame", "3=50", "--drop", "0", "--reverse",
        ])
        .unwrap();
        match args.command {
            Command::Retime { frames, drop, reverse, output, .. } => {
                assert_eq!(frames, vec![(1, 300), (3, 50)]);
                assert_eq!(drop, vec![0]);
                assert!(reverse);
                assert!(output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
