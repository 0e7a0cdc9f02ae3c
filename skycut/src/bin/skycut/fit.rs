use crate::cli::FitArgs;
use anyhow::{bail, Context};
use skycut::Config;
use skycut_core::{SkyCoord, SkyCoords};
use skycut_images::wcs_keywords;
use skycut_wcs::fit::LevenbergMarquardt;
use skycut_wcs::{PixelTransform, ProjectionPoint, ProjectionSpec, WcsFitter};
use std::path::Path;
use tracing::info;

/// Matched positions read from a `x,y,lon,lat` CSV file.
struct Points {
    x: Vec<f64>,
    y: Vec<f64>,
    lon: Vec<f64>,
    lat: Vec<f64>,
}

pub fn run(args: &FitArgs, config: &Config) -> anyhow::Result<()> {
    let points = read_points(&args.csv)?;
    info!(points = points.x.len(), path = %args.csv.display(), "read matched positions");

    let world = SkyCoords::new(points.lon.clone(), points.lat.clone(), args.frame)?;
    let proj_point = match args.center {
        Some([lon, lat]) => ProjectionPoint::Point(SkyCoord::new(lon, lat, args.frame)?),
        None => ProjectionPoint::Center,
    };
    let sip_degree = args.sip_degree.filter(|&d| d > 0);

    let fitter = WcsFitter::with_solver(LevenbergMarquardt::new(config.solver));
    let wcs = fitter
        .fit(
            (points.x.as_slice(), points.y.as_slice()),
            &world,
            proj_point,
            ProjectionSpec::Code(args.projection.to_uppercase()),
            sip_degree,
        )
        .context("WCS fit failed")?;

    let mut worst: f64 = 0.0;
    for i in 0..points.x.len() {
        let (px, py) = wcs.world_to_pixel(points.lon[i], points.lat[i])?;
        worst = worst.max((px - points.x[i]).hypot(py - points.y[i]));
    }
    info!(max_residual_px = worst, "fit complete");

    for keyword in wcs_keywords(&wcs) {
        let card = keyword.to_card()?;
        println!("{}", String::from_utf8_lossy(&card).trim_end());
    }
    Ok(())
}

fn read_points(path: &Path) -> anyhow::Result<Points> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_points(&text).with_context(|| format!("parsing {}", path.display()))
}

fn parse_points(text: &str) -> anyhow::Result<Points> {
    let mut points = Points {
        x: Vec::new(),
        y: Vec::new(),
        lon: Vec::new(),
        lat: Vec::new(),
    };

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            bail!("line {}: expected 4 columns, found {}", lineno + 1, fields.len());
        }
        let values: Result<Vec<f64>, _> = fields.iter().map(|f| f.parse::<f64>()).collect();
        match values {
            Ok(v) => {
                points.x.push(v[0]);
                points.y.push(v[1]);
                points.lon.push(v[2]);
                points.lat.push(v[3]);
            }
            // A non-numeric first row is a column header.
            Err(_) if points.x.is_empty() && lineno == 0 => continue,
            Err(e) => bail!("line {}: {}", lineno + 1, e),
        }
    }

    if points.x.is_empty() {
        bail!("no points");
    }
    Ok(points)
}
