use crate::errors::{FitsError, Result};
use crate::header::Header;
use crate::wcs::wcs_from_header;
use ndarray::Array2;
use skycut_wcs::Wcs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitpix {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Bitpix {
    pub fn from_value(value: i64) -> Result<Self> {
        match value {
            8 => Ok(Self::U8),
            16 => Ok(Self::I16),
            32 => Ok(Self::I32),
            64 => Ok(Self::I64),
            -32 => Ok(Self::F32),
            -64 => Ok(Self::F64),
            other => Err(FitsError::UnsupportedBitpix(other)),
        }
    }

    pub fn value(self) -> i64 {
        match self {
            Self::U8 => 8,
            Self::I16 => 16,
            Self::I32 => 32,
            Self::I64 => 64,
            Self::F32 => -32,
            Self::F64 => -64,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        (self.value().unsigned_abs() / 8) as usize
    }

    pub fn is_integer(self) -> bool {
        self.value() > 0
    }
}

/// One header/data unit. `data` is `None` for header-only HDUs and for HDUs whose
/// payload is not a 2-D image.
///
/// Image data is indexed `[[y, x]]`: rows follow NAXIS2 and columns NAXIS1, with
/// scaling already applied.
#[derive(Debug, Clone)]
pub struct ImageHdu {
    header: Header,
    data: Option<Array2<f64>>,
}

impl ImageHdu {
    pub fn new(header: Header, data: Array2<f64>) -> Self {
        Self {
            header,
            data: Some(data),
        }
    }

    pub fn header_only(header: Header) -> Self {
        Self { header, data: None }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    pub fn data(&self) -> Option<&Array2<f64>> {
        self.data.as_ref()
    }

    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// `(NAXIS1, NAXIS2)`, i.e. width then height.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.data.as_ref().map(|d| (d.ncols(), d.nrows()))
    }

    /// The celestial WCS described by the header.
    pub fn wcs(&self) -> Result<Wcs> {
        wcs_from_header(&self.header)?.ok_or_else(|| FitsError::keyword_not_found("CTYPE1"))
    }

    pub fn into_parts(self) -> (Header, Option<Array2<f64>>) {
        (self.header, self.data)
    }
}
