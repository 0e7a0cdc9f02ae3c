//! Command-line definitions for skycut

use clap::{Args, Parser, Subcommand};
use skycut::{CutoutSize, SizeValue};
use skycut_core::Frame;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skycut")]
#[command(about = "Cut sky-centred regions out of FITS images")]
#[command(version)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with [cutout] and [solver] settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cut every file around one sky position and write FITS cutouts
    Cut(CutArgs),

    /// Print the pixel limits and cutout reference pixel for one file
    Limits(LimitsArgs),

    /// Fit a WCS to matched pixel/sky positions from a CSV file
    Fit(FitArgs),
}

#[derive(Args, Clone, Copy)]
#[group(required = true, multiple = false)]
pub struct SizeArgs {
    /// Cutout size in pixels, `N` or `W,H`
    #[arg(long, value_parser = parse_pair)]
    pub size: Option<[f64; 2]>,

    /// Cutout size in degrees, `D` or `W,H`
    #[arg(long, value_parser = parse_pair)]
    pub size_deg: Option<[f64; 2]>,
}

impl SizeArgs {
    pub fn cutout_size(&self) -> CutoutSize {
        match (self.size, self.size_deg) {
            (Some([w, h]), _) => CutoutSize::per_axis(w, h),
            (None, Some([w, h])) => {
                CutoutSize::per_axis(SizeValue::degrees(w), SizeValue::degrees(h))
            }
            // clap enforces one of the two
            (None, None) => CutoutSize::pixels(0.0),
        }
    }
}

#[derive(Args)]
#[command(allow_negative_numbers = true)]
pub struct CutArgs {
    /// Centre longitude in degrees
    pub ra: f64,

    /// Centre latitude in degrees
    pub dec: f64,

    /// Input FITS images
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub size: SizeArgs,

    /// Frame of the centre coordinates
    #[arg(long, default_value = "icrs", value_parser = parse_frame)]
    pub frame: Frame,

    /// Write one file per image instead of one multi-extension file
    #[arg(long)]
    pub separate: bool,

    /// Drop source header keywords after this one
    #[arg(long)]
    pub drop_after: Option<String>,

    /// Directory for the output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Cut images on all cores
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Args)]
#[command(allow_negative_numbers = true)]
pub struct LimitsArgs {
    /// Centre longitude in degrees
    pub ra: f64,

    /// Centre latitude in degrees
    pub dec: f64,

    /// Input FITS image
    pub file: PathBuf,

    #[command(flatten)]
    pub size: SizeArgs,

    /// Frame of the centre coordinates
    #[arg(long, default_value = "icrs", value_parser = parse_frame)]
    pub frame: Frame,
}

#[derive(Args)]
pub struct FitArgs {
    /// CSV with columns x,y,lon,lat (0-based pixels, degrees)
    pub csv: PathBuf,

    /// Projection code of the fitted WCS
    #[arg(long, default_value = "TAN")]
    pub projection: String,

    /// Degree of the SIP distortion to fit, 0 for none
    #[arg(long)]
    pub sip_degree: Option<u32>,

    /// Reference sky position `LON,LAT`; defaults to the centre of the points
    #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
    pub center: Option<[f64; 2]>,

    /// Frame of the sky columns
    #[arg(long, default_value = "icrs", value_parser = parse_frame)]
    pub frame: Frame,
}

fn parse_pair(s: &str) -> Result<[f64; 2], String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("'{}': {}", s, e))?;
    match values.as_slice() {
        [v] => Ok([*v, *v]),
        [a, b] => Ok([*a, *b]),
        _ => Err(format!("expected one or two comma-separated numbers, got '{}'", s)),
    }
}

fn parse_frame(s: &str) -> Result<Frame, String> {
    Frame::parse(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs() {
        assert_eq!(parse_pair("10").unwrap(), [10.0, 10.0]);
        assert_eq!(parse_pair("10, 5").unwrap(), [10.0, 5.0]);
        assert_eq!(parse_pair("-1.5,2").unwrap(), [-1.5, 2.0]);
        assert!(parse_pair("1,2,3").is_err());
        assert!(parse_pair("ten").is_err());
    }

    #[test]
    fn test_negative_latitude_parses() {
        let cli = Cli::try_parse_from([
            "skycut", "cut", "150.1", "-2.25", "a.fits", "b.fits", "--size", "20,10",
        ])
        .unwrap();
        let Commands::Cut(args) = cli.command else {
            panic!("expected cut");
        };
        assert_eq!(args.dec, -2.25);
        assert_eq!(args.files.len(), 2);
        assert_eq!(
            args.size.cutout_size(),
            CutoutSize::per_axis(20.0, 10.0)
        );
    }

    #[test]
    fn test_size_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["skycut", "cut", "1", "2", "a.fits"]).is_err());
        assert!(Cli::try_parse_from([
            "skycut", "cut", "1", "2", "a.fits", "--size", "5", "--size-deg", "0.1"
        ])
        .is_err());
    }
}
