use crate::cli::CutArgs;
use anyhow::Context;
use skycut::{fits_cut, Config, CutoutOutput};
use skycut_core::SkyCoord;

pub fn run(args: &CutArgs, config: &Config) -> anyhow::Result<()> {
    let center = SkyCoord::new(args.ra, args.dec, args.frame)
        .with_context(|| format!("invalid centre ({}, {})", args.ra, args.dec))?;
    let size = args.size.cutout_size();

    let mut options = config.cutout.clone();
    if args.separate {
        options.single_outfile = false;
    }
    if let Some(keyword) = &args.drop_after {
        options.drop_after = Some(keyword.clone());
    }
    if let Some(dir) = &args.output_dir {
        options.output_dir = dir.clone();
    }
    options.parallel |= args.parallel;

    let output = fits_cut(&args.files, &center, &size, &options)
        .with_context(|| format!("cutting {} image(s)", args.files.len()))?;

    match &output {
        CutoutOutput::Single(path) => println!("{}", path.display()),
        CutoutOutput::Separate(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
