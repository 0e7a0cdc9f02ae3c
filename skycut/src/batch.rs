//! Cutting a list of FITS images around one sky position.

use crate::config::CutoutOptions;
use crate::error::{CutoutError, Result};
use crate::extract::{extract_cutout_with_fill, has_valid_data};
use crate::geometry::{cutout_limits, cutout_wcs, PixelLimits};
use crate::size::CutoutSize;
use chrono::Utc;
use rayon::prelude::*;
use skycut_core::{Frame, SkyCoord};
use skycut_images::{read_image, set_wcs, FitsError, FitsWriter, Header, ImageHdu, Keyword};
use skycut_wcs::Wcs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const ORIGIN: &str = "skycut";

/// One image's cutout, ready to be written.
#[derive(Debug, Clone)]
pub struct Cutout {
    pub limits: PixelLimits,
    pub wcs: Wcs,
    pub hdu: ImageHdu,
    /// True when no pixel of the cutout is finite and non-zero.
    pub is_empty: bool,
}

impl Cutout {
    /// `(NAXIS1, NAXIS2)` of the cutout.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.limits.width(), self.limits.height())
    }
}

/// Where a batch ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CutoutOutput {
    Single(PathBuf),
    Separate(Vec<PathBuf>),
}

impl CutoutOutput {
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::Single(path) => std::slice::from_ref(path),
            Self::Separate(paths) => paths,
        }
    }
}

/// Cuts `hdu` around `center`. `source_name` is recorded as `ORIG_FLE`.
pub fn cut_hdu(
    hdu: &ImageHdu,
    source_name: &str,
    center: &SkyCoord,
    size: &CutoutSize,
    options: &CutoutOptions,
) -> Result<Cutout> {
    let data = hdu.data().ok_or(CutoutError::NoData { images: 1 })?;
    let wcs = hdu
        .wcs()
        .map_err(|e| CutoutError::fits(source_name, e))?;

    let limits = cutout_limits(&wcs, center, size)?;
    let pixels = extract_cutout_with_fill(data, &limits, options.fill_value);
    let is_empty = !has_valid_data(&pixels);
    let cut_wcs = cutout_wcs(&wcs, &limits);

    let header = cutout_header(hdu.header(), &cut_wcs, source_name, is_empty, options);
    debug!(source = source_name, %limits, is_empty, "cut image");

    Ok(Cutout {
        limits,
        wcs: cut_wcs,
        hdu: ImageHdu::new(header, pixels),
        is_empty,
    })
}

/// Reads the image HDU of `path` and cuts it.
pub fn cut_file<P: AsRef<Path>>(
    path: P,
    center: &SkyCoord,
    size: &CutoutSize,
    options: &CutoutOptions,
) -> Result<Cutout> {
    let path = path.as_ref();
    let hdu = read_image(path).map_err(|e| CutoutError::fits(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    cut_hdu(&hdu, &name, center, size, options)
}

fn cutout_header(
    source: &Header,
    wcs: &Wcs,
    source_name: &str,
    is_empty: bool,
    options: &CutoutOptions,
) -> Header {
    let mut header = source.clone();
    if let Some(keyword) = &options.drop_after {
        if !header.truncate_after(keyword) {
            debug!(keyword = keyword.as_str(), "drop_after keyword not in header");
        }
    }
    header.retain(|k| !k.is_structural());
    set_wcs(&mut header, wcs);
    header.set_keyword(Keyword::string("ORIG_FLE", source_name).with_comment("Original image file"));
    header.set_keyword(Keyword::logical("EMPTY", is_empty).with_comment("True if cutout has no data"));
    header
}

/// Cuts every input around `center` and writes the results under `options.output_dir`.
///
/// With `single_outfile` all cutouts, empty ones included, go into one file behind a
/// header-only primary HDU. Otherwise each cutout with valid data gets its own file.
/// Fails with [`CutoutError::NoData`] when no cutout has valid data.
pub fn fits_cut<P: AsRef<Path> + Sync>(
    inputs: &[P],
    center: &SkyCoord,
    size: &CutoutSize,
    options: &CutoutOptions,
) -> Result<CutoutOutput> {
    if inputs.is_empty() {
        return Err(CutoutError::NoInputs);
    }

    let cut = |path: &P| cut_file(path, center, size, options);
    let cutouts: Vec<Cutout> = if options.parallel {
        inputs.par_iter().map(cut).collect::<Result<_>>()?
    } else {
        inputs.iter().map(cut).collect::<Result<_>>()?
    };

    for (path, cutout) in inputs.iter().zip(&cutouts) {
        if cutout.is_empty {
            warn!(source = %path.as_ref().display(), "cutout contains no data");
        }
    }
    if cutouts.iter().all(|c| c.is_empty) {
        return Err(CutoutError::NoData {
            images: cutouts.len(),
        });
    }

    std::fs::create_dir_all(&options.output_dir)?;
    let icrs = center.transform_to(Frame::Icrs)?;

    if options.single_outfile {
        let (nx, ny) = cutouts[0].dimensions();
        let path = options.output_dir.join(format!(
            "cutout_{:.7}_{:.7}_{}-x-{}_skycut.fits",
            icrs.lon_deg(),
            icrs.lat_deg(),
            nx,
            ny
        ));
        write_combined(&path, &icrs, &cutouts)?;
        info!(path = %path.display(), extensions = cutouts.len(), "wrote cutout file");
        Ok(CutoutOutput::Single(path))
    } else {
        let mut paths = Vec::new();
        for (input, cutout) in inputs.iter().zip(&cutouts) {
            if cutout.is_empty {
                continue;
            }
            let (nx, ny) = cutout.dimensions();
            let stem = input
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let path = options.output_dir.join(format!(
                "{}_{:.7}_{:.7}_{}-x-{}_cutout.fits",
                stem,
                icrs.lon_deg(),
                icrs.lat_deg(),
                nx,
                ny
            ));
            write_single(&path, cutout)?;
            info!(path = %path.display(), "wrote cutout file");
            paths.push(path);
        }
        Ok(CutoutOutput::Separate(paths))
    }
}

fn write_combined(path: &Path, center: &SkyCoord, cutouts: &[Cutout]) -> Result<()> {
    let primary = [
        Keyword::real("RA_OBJ", center.lon_deg()).with_comment("[deg] right ascension"),
        Keyword::real("DEC_OBJ", center.lat_deg()).with_comment("[deg] declination"),
        Keyword::string("ORIGIN", ORIGIN),
        Keyword::string("DATE", Utc::now().format("%Y-%m-%d").to_string())
            .with_comment("file creation date"),
    ];

    let fits_err = |e: FitsError| CutoutError::fits(path, e);
    let mut writer = FitsWriter::create(path).map_err(fits_err)?;
    writer.write_primary_header(&primary).map_err(fits_err)?;
    for cutout in cutouts {
        if let Some(data) = cutout.hdu.data() {
            writer
                .write_image_extension(data, cutout.hdu.header().keywords())
                .map_err(fits_err)?;
        }
    }
    writer.finish().map_err(fits_err)?;
    Ok(())
}

fn write_single(path: &Path, cutout: &Cutout) -> Result<()> {
    let fits_err = |e: FitsError| CutoutError::fits(path, e);
    let mut writer = FitsWriter::create(path).map_err(fits_err)?;
    writer.write(&cutout.hdu).map_err(fits_err)?;
    writer.finish().map_err(fits_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycut_images::test_utils::SyntheticImage;

    fn image() -> SyntheticImage {
        SyntheticImage::tan(40, 30, [150.0, 2.2], 1e-4)
            .unwrap()
            .keyword(Keyword::string("TELESCOP", "sim"))
            .keyword(Keyword::integer("DUMMY1", 1))
            .keyword(Keyword::integer("DUMMY2", 2))
    }

    #[test]
    fn test_header_carries_shifted_wcs_and_bookkeeping() {
        let source = image();
        let cutout = cut_hdu(
            &source.to_hdu(),
            "field.fits",
            &SkyCoord::icrs(150.0, 2.2),
            &CutoutSize::pixels(10.0),
            &CutoutOptions::default(),
        )
        .unwrap();

        let header = cutout.hdu.header();
        assert_eq!(
            header.get_keyword_value("ORIG_FLE").and_then(|v| v.as_string()),
            Some("field.fits")
        );
        assert_eq!(
            header.get_keyword_value("EMPTY").and_then(|v| v.as_logical()),
            Some(false)
        );
        assert!(header.get_keyword("DUMMY2").is_some());

        let read = cutout.hdu.wcs().unwrap();
        assert_eq!(read.crval(), source.wcs().crval());
        assert_eq!(read.crpix()[0], source.wcs().crpix()[0] - cutout.limits.x[0] as f64);
        assert_eq!(cutout.dimensions(), (10, 10));
    }

    #[test]
    fn test_drop_after_truncates_source_keywords() {
        let options = CutoutOptions::default().with_drop_after("dummy1");
        let cutout = cut_hdu(
            &image().to_hdu(),
            "field.fits",
            &SkyCoord::icrs(150.0, 2.2),
            &CutoutSize::pixels(6.0),
            &options,
        )
        .unwrap();
        let header = cutout.hdu.header();
        assert!(header.get_keyword("TELESCOP").is_some());
        assert!(header.get_keyword("DUMMY1").is_some());
        assert!(header.get_keyword("DUMMY2").is_none());
        // The WCS is rewritten even though it came after DUMMY1 in the source.
        assert!(header.get_keyword("CRPIX1").is_some());
    }

    #[test]
    fn test_cutout_off_the_image_is_flagged_empty() {
        let source = image();
        let (ra, dec) = source.wcs().pix2world(-200.0, 15.0).unwrap();
        let cutout = cut_hdu(
            &source.to_hdu(),
            "field.fits",
            &SkyCoord::icrs(ra, dec),
            &CutoutSize::pixels(8.0),
            &CutoutOptions::default(),
        )
        .unwrap();
        assert!(cutout.is_empty);
        assert_eq!(
            cutout.hdu.header().get_keyword_value("EMPTY"),
            Some(&skycut_images::KeywordValue::Logical(true))
        );
    }

    #[test]
    fn test_empty_input_list() {
        let inputs: [&str; 0] = [];
        let err = fits_cut(
            &inputs,
            &SkyCoord::icrs(0.0, 0.0),
            &CutoutSize::pixels(5.0),
            &CutoutOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CutoutError::NoInputs));
    }
}
