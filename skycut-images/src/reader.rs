use crate::errors::{FitsError, Result};
use crate::header::{Header, HEADER_BLOCK_SIZE};
use crate::image::{Bitpix, ImageHdu};
use byteorder::{BigEndian, ByteOrder};
use ndarray::Array2;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Sequential HDU reader over any byte stream.
pub struct FitsReader<R: Read> {
    reader: R,
    hdu_index: usize,
    finished: bool,
}

impl FitsReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> FitsReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            hdu_index: 0,
            finished: false,
        }
    }

    /// Reads the next HDU, or `None` once the stream is exhausted.
    pub fn next_hdu(&mut self) -> Result<Option<ImageHdu>> {
        if self.finished {
            return Ok(None);
        }
        let header = match self.read_header()? {
            Some(header) => header,
            None => {
                self.finished = true;
                return Ok(None);
            }
        };

        if self.hdu_index == 0 && !header.is_primary() {
            return Err(FitsError::InvalidFormat(
                "First HDU must be a primary HDU".to_string(),
            ));
        }
        if self.hdu_index > 0 && !header.is_extension() {
            return Err(FitsError::InvalidFormat(
                "Non-primary HDUs must be extensions".to_string(),
            ));
        }

        let layout = DataLayout::from_header(&header)?;
        let data = if layout.is_image() {
            Some(self.read_image_data(&header, &layout)?)
        } else {
            self.skip_bytes(layout.padded_size())?;
            None
        };
        debug!(
            hdu = self.hdu_index,
            axes = ?layout.axes,
            image = data.is_some(),
            "read HDU"
        );
        self.hdu_index += 1;

        Ok(Some(match data {
            Some(data) => ImageHdu::new(header, data),
            None => ImageHdu::header_only(header),
        }))
    }

    pub fn read_all(&mut self) -> Result<Vec<ImageHdu>> {
        let mut hdus = Vec::new();
        while let Some(hdu) = self.next_hdu()? {
            hdus.push(hdu);
        }
        Ok(hdus)
    }

    fn read_header(&mut self) -> Result<Option<Header>> {
        let mut header_data = Vec::new();
        let mut block = vec![0u8; HEADER_BLOCK_SIZE];

        loop {
            let filled = read_block(&mut self.reader, &mut block)?;
            if filled == 0 && header_data.is_empty() {
                return Ok(None);
            }
            if filled < HEADER_BLOCK_SIZE {
                return Err(FitsError::UnexpectedEof);
            }
            // Some writers leave zero padding after the last HDU.
            if header_data.is_empty() && block.iter().all(|&b| b == 0) {
                return Ok(None);
            }

            header_data.extend_from_slice(&block);
            if block_has_end(&block) {
                return Header::parse(&header_data).map(Some);
            }
        }
    }

    fn read_image_data(&mut self, header: &Header, layout: &DataLayout) -> Result<Array2<f64>> {
        let (width, height) = (layout.axes[0], layout.axes[1]);
        let pixels = width * height;
        let bytes_per_pixel = layout.bitpix.bytes_per_pixel();

        let mut raw = vec![0u8; pixels * bytes_per_pixel];
        self.reader.read_exact(&mut raw).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => FitsError::UnexpectedEof,
            _ => FitsError::Io(e),
        })?;
        self.skip_bytes(layout.padded_size() - raw.len())?;

        let scaling = Scaling::from_header(header, layout.bitpix);
        let values: Vec<f64> = raw
            .chunks_exact(bytes_per_pixel)
            .map(|chunk| scaling.apply(decode_pixel(layout.bitpix, chunk)))
            .collect();

        Array2::from_shape_vec((height, width), values)
            .map_err(|e| FitsError::InvalidFormat(format!("image shape: {}", e)))
    }

    fn skip_bytes(&mut self, count: usize) -> Result<()> {
        // The final HDU may be short of its block padding.
        io::copy(&mut (&mut self.reader).take(count as u64), &mut io::sink())?;
        Ok(())
    }
}

fn read_block<R: Read>(reader: &mut R, block: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn block_has_end(block: &[u8]) -> bool {
    block
        .chunks_exact(crate::header::CARD_SIZE)
        .any(|card| &card[..3] == b"END" && card[3..8].iter().all(|&b| b == b' '))
}

fn decode_pixel(bitpix: Bitpix, chunk: &[u8]) -> f64 {
    match bitpix {
        Bitpix::U8 => chunk[0] as f64,
        Bitpix::I16 => BigEndian::read_i16(chunk) as f64,
        Bitpix::I32 => BigEndian::read_i32(chunk) as f64,
        Bitpix::I64 => BigEndian::read_i64(chunk) as f64,
        Bitpix::F32 => BigEndian::read_f32(chunk) as f64,
        Bitpix::F64 => BigEndian::read_f64(chunk),
    }
}

struct DataLayout {
    bitpix: Bitpix,
    axes: Vec<usize>,
    pcount: usize,
    gcount: usize,
}

impl DataLayout {
    fn from_header(header: &Header) -> Result<Self> {
        let bitpix = Bitpix::from_value(header.require_integer("BITPIX")?)?;
        let naxis = header.require_integer("NAXIS")?;
        if !(0..=999).contains(&naxis) {
            return Err(FitsError::InvalidKeywordValue {
                keyword: "NAXIS".to_string(),
                value: naxis.to_string(),
            });
        }

        let axes = (1..=naxis)
            .map(|i| {
                let name = format!("NAXIS{}", i);
                let len = header.require_integer(&name)?;
                usize::try_from(len).map_err(|_| FitsError::InvalidKeywordValue {
                    keyword: name,
                    value: len.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let optional_count = |name: &str, default: usize| {
            header
                .get_keyword_value(name)
                .and_then(|v| v.as_integer())
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(default)
        };

        Ok(Self {
            bitpix,
            pcount: optional_count("PCOUNT", 0),
            gcount: optional_count("GCOUNT", 1),
            axes,
        })
    }

    /// Two-dimensional data, allowing trailing axes of length one.
    fn is_image(&self) -> bool {
        self.axes.len() >= 2
            && self.pcount == 0
            && self.axes[0] > 0
            && self.axes[1] > 0
            && self.axes[2..].iter().all(|&n| n == 1)
    }

    fn data_size(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        let elements: usize = self.axes.iter().product();
        self.bitpix.bytes_per_pixel() * self.gcount * (self.pcount + elements)
    }

    fn padded_size(&self) -> usize {
        self.data_size().div_ceil(HEADER_BLOCK_SIZE) * HEADER_BLOCK_SIZE
    }
}

/// `physical = BZERO + BSCALE * stored`; integer `BLANK` values read as NaN.
struct Scaling {
    bscale: f64,
    bzero: f64,
    blank: Option<f64>,
}

impl Scaling {
    fn from_header(header: &Header, bitpix: Bitpix) -> Self {
        let real = |name: &str| header.get_keyword_value(name).and_then(|v| v.as_real());
        let blank = if bitpix.is_integer() {
            header
                .get_keyword_value("BLANK")
                .and_then(|v| v.as_integer())
                .map(|v| v as f64)
        } else {
            None
        };
        Self {
            bscale: real("BSCALE").unwrap_or(1.0),
            bzero: real("BZERO").unwrap_or(0.0),
            blank,
        }
    }

    fn apply(&self, stored: f64) -> f64 {
        if self.blank == Some(stored) {
            return f64::NAN;
        }
        self.bzero + self.bscale * stored
    }
}

/// Reads every HDU of a FITS file.
pub fn read_fits<P: AsRef<Path>>(path: P) -> Result<Vec<ImageHdu>> {
    FitsReader::open(path)?.read_all()
}

/// Reads the primary HDU if it holds an image, otherwise the first image extension.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<ImageHdu> {
    let path = path.as_ref();
    let mut reader = FitsReader::open(path)?;
    while let Some(hdu) = reader.next_hdu()? {
        if hdu.has_data() {
            return Ok(hdu);
        }
    }
    Err(FitsError::NoImageData(path.display().to_string()))
}
