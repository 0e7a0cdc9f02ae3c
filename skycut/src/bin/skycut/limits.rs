use crate::cli::LimitsArgs;
use anyhow::Context;
use skycut::{cutout_limits, cutout_wcs};
use skycut_core::SkyCoord;
use skycut_images::read_image;

pub fn run(args: &LimitsArgs) -> anyhow::Result<()> {
    let hdu = read_image(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let wcs = hdu
        .wcs()
        .with_context(|| format!("no usable WCS in {}", args.file.display()))?;
    let center = SkyCoord::new(args.ra, args.dec, args.frame)?;

    let limits = cutout_limits(&wcs, &center, &args.size.cutout_size())?;
    let crpix = cutout_wcs(&wcs, &limits).crpix();

    println!("limits  {}", limits);
    println!("shape   {} x {}", limits.width(), limits.height());
    println!("crpix   {:.6} {:.6}", crpix[0], crpix[1]);
    if let Some((ncols, nrows)) = hdu.dimensions() {
        if limits.is_outside(ncols, nrows) {
            println!("cutout lies entirely outside the {} x {} image", ncols, nrows);
        }
    }
    Ok(())
}
