//! Synthetic images with a known WCS for tests in this and dependent crates.

use crate::errors::Result;
use crate::header::{Header, Keyword};
use crate::image::ImageHdu;
use crate::wcs::wcs_keywords;
use crate::writer::write_fits;
use ndarray::Array2;
use skycut_wcs::{Wcs, WcsBuilder};
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelFill {
    /// `1 + x + width * y`, so every pixel is distinct and non-zero.
    Ramp,
    Constant(f64),
}

#[derive(Debug, Clone)]
pub struct SyntheticImage {
    width: usize,
    height: usize,
    wcs: Wcs,
    fill: PixelFill,
    extra: Vec<Keyword>,
    as_extension: bool,
}

impl SyntheticImage {
    /// A north-up TAN image with `scale` degrees per pixel, centred on `center`.
    pub fn tan(width: usize, height: usize, center: [f64; 2], scale: f64) -> Result<Self> {
        let wcs = WcsBuilder::new()
            .crpix((width as f64 + 1.0) / 2.0, (height as f64 + 1.0) / 2.0)
            .crval(center[0], center[1])
            .cd_matrix([[-scale, 0.0], [0.0, scale]])
            .proj_code("TAN")
            .radesys("ICRS")
            .build()?;
        Ok(Self::with_wcs(width, height, wcs))
    }

    pub fn with_wcs(width: usize, height: usize, wcs: Wcs) -> Self {
        Self {
            width,
            height,
            wcs,
            fill: PixelFill::Ramp,
            extra: Vec::new(),
            as_extension: false,
        }
    }

    pub fn fill(mut self, fill: PixelFill) -> Self {
        self.fill = fill;
        self
    }

    pub fn keyword(mut self, keyword: Keyword) -> Self {
        self.extra.push(keyword);
        self
    }

    /// Store the image in an extension behind a header-only primary HDU.
    pub fn in_extension(mut self) -> Self {
        self.as_extension = true;
        self
    }

    pub fn wcs(&self) -> &Wcs {
        &self.wcs
    }

    pub fn data(&self) -> Array2<f64> {
        let width = self.width;
        Array2::from_shape_fn((self.height, self.width), |(y, x)| match self.fill {
            PixelFill::Ramp => (1 + x + width * y) as f64,
            PixelFill::Constant(v) => v,
        })
    }

    pub fn header(&self) -> Header {
        let mut header: Header = self.extra.iter().cloned().collect();
        for keyword in wcs_keywords(&self.wcs) {
            header.add_keyword(keyword);
        }
        header
    }

    pub fn to_hdu(&self) -> ImageHdu {
        ImageHdu::new(self.header(), self.data())
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if self.as_extension {
            let primary = ImageHdu::header_only(Header::new());
            write_fits(path, &[primary, self.to_hdu()])
        } else {
            write_fits(path, &[self.to_hdu()])
        }
    }

    pub fn write_temp(&self) -> Result<NamedTempFile> {
        let file = tempfile::Builder::new().suffix(".fits").tempfile()?;
        self.write(file.path())?;
        Ok(file)
    }
}
