use clap::{crate_name, crate_version, value_parser, Arg, ArgAction, Command};
use gif_progress::progress::{NoProgress, ProgressBar, ProgressReporter};
use gif_progress::{BarConfig, BarPosition, RGB8};

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    if let Err(e) = bin_main() {
        eprintln!("error: {}", e);
        if let Some(e) = e.source() {
            eprintln!("error: {}", e);
        }
        std::process::exit(1);
    }
}

fn bin_main() -> BinResult<()> {
    let matches = Command::new(crate_name!())
        .version(crate_version!())
        .about("Attaches a progress bar to an animated GIF")
        .arg(Arg::new("in")
            .long("in")
            .short('i')
            .help("Input GIF; standard input if not given")
            .value_name("in.gif")
            .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("out")
            .long("out")
            .short('o')
            .help("Destination file to write to; \"-\" or nothing means stdout")
            .value_name("out.gif")
            .value_parser(value_parser!(OsString)))
        .arg(Arg::new("bar-top")
            .long("bar-top")
            .short('t')
            .help("Put the bar at the top instead of the bottom")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("bar-height")
            .long("bar-height")
            .help("Bar height")
            .value_name("px")
            .value_parser(value_parser!(u16))
            .default_value("5"))
        .arg(Arg::new("bar-color")
            .long("bar-color")
            .short('c')
            .help("Bar color, as #rgb or #rrggbb")
            .value_name("hex")
            .default_value("#ccc"))
        .arg(Arg::new("bar-fps")
            .long("bar-fps")
            .short('f')
            .help("Re-time the animation to this frame rate, so that the bar moves smoothly. \
                   0 keeps the original frames, and moves the bar once per frame")
            .value_name("num")
            .value_parser(value_parser!(u16))
            .default_value("0"))
        .arg(Arg::new("quiet")
            .long("quiet")
            .short('q')
            .help("Do not display anything on standard output/console")
            .action(ArgAction::SetTrue))
        .get_matches_from(wild::args_os());

    let output_path = DestPath::new(matches.get_one::<OsString>("out").map(OsString::as_os_str));
    let quiet = matches.get_flag("quiet");
    init_logging(quiet);

    let bar = BarConfig {
        position: if matches.get_flag("bar-top") { BarPosition::Top } else { BarPosition::Bottom },
        height: matches.get_one::<u16>("bar-height").copied().ok_or("Missing bar height")?,
        color: parse_color(matches.get_one::<String>("bar-color").ok_or("Missing bar color")?)?,
        fps: matches.get_one::<u16>("bar-fps").copied().ok_or("Missing fps")?,
    };

    if bar.height == 0 {
        return Err("Bar height must be at least 1 pixel".into());
    }
    if bar.fps > 100 {
        return Err("100 fps is maximum".into());
    } else if bar.fps > 50 {
        log::warn!("web browsers support max 50 fps");
    }

    let input: Box<dyn Read> = match matches.get_one::<PathBuf>("in") {
        Some(path) => Box::new(BufReader::new(File::open(path)
            .map_err(|e| format!("Can't open {}: {}", path.display(), e))?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut anim = gif_progress::read_animation(input)?;
    if anim.width == 0 || anim.height == 0 {
        return Err("The animation has an empty canvas".into());
    }
    if bar.height > anim.height {
        log::warn!("bar height {} is taller than the animation ({}px)", bar.height, anim.height);
    }

    let seq = gif_progress::apply_bar(&mut anim, &bar)?;

    let mut pb;
    let mut nopb = NoProgress {};
    let progress: &mut dyn ProgressReporter = if quiet || output_path == DestPath::Stdout {
        &mut nopb
    } else {
        pb = ProgressBar::new(seq.frames.len() as u64);
        pb.show_speed = false;
        pb.show_percent = false;
        pb.format(" #_. ");
        pb.message("Frame ");
        pb.set_max_refresh_rate(Some(Duration::from_millis(250)));
        &mut pb
    };

    match output_path {
        DestPath::Path(p) => {
            let file = File::create(p)
                .map_err(|e| format!("Can't write to {}: {}", p.display(), e))?;
            gif_progress::write_sequence(BufWriter::new(file), &seq, progress)?;
        },
        DestPath::Stdout => {
            let mut out = io::stdout().lock();
            gif_progress::write_sequence(&mut out, &seq, progress)?;
            out.flush()?;
        },
    };
    progress.done(&format!("gif-progress created {}", output_path));

    Ok(())
}

fn init_logging(quiet: bool) {
    let default_filter = if quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// `#rgb` or `#rrggbb`, with the `#` being optional
fn parse_color(s: &str) -> BinResult<RGB8> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || format!("Invalid bar color \"{}\"; expected a hex color like #ccc or #33aaff", s);
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid().into());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    match hex.len() {
        3 => {
            let short = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
            Ok(RGB8::new(short(0)?, short(1)?, short(2)?))
        },
        6 => Ok(RGB8::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => Err(invalid().into()),
    }
}

#[derive(PartialEq)]
enum DestPath<'a> {
    Path(&'a Path),
    Stdout,
}

impl<'a> DestPath<'a> {
    pub fn new(path: Option<&'a OsStr>) -> Self {
        match path {
            Some(path) if path != "-" => Self::Path(Path::new(path)),
            _ => Self::Stdout,
        }
    }
}

impl fmt::Display for DestPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Path(orig_path) => {
                let abs_path = dunce::canonicalize(orig_path);
                abs_path.as_ref().map(|p| p.as_path()).unwrap_or(orig_path).display().fmt(f)
            },
            Self::Stdout => f.write_str("stdout"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors() {
        assert_eq!(parse_color("#ccc").unwrap(), RGB8::new(204, 204, 204));
        assert_eq!(parse_color("33aaff").unwrap(), RGB8::new(0x33, 0xaa, 0xff));
        assert_eq!(parse_color(" #FF0000 ").unwrap(), RGB8::new(255, 0, 0));
        assert!(parse_color("#cccc").is_err());
        assert!(parse_color("#ggg").is_err());
        assert!(parse_color("").is_err());
    }

    #[test]
    fn dest_path() {
        assert!(DestPath::new(None) == DestPath::Stdout);
        assert!(DestPath::new(Some(OsStr::new("-"))) == DestPath::Stdout);
        assert!(DestPath::new(Some(OsStr::new("a.gif"))) == DestPath::Path(Path::new("a.gif")));
    }
}
