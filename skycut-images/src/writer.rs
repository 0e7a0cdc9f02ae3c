use crate::errors::Result;
use crate::header::{Header, Keyword, HEADER_BLOCK_SIZE};
use crate::image::{Bitpix, ImageHdu};
use byteorder::{BigEndian, WriteBytesExt};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes HDUs in order. Image data is always stored as `BITPIX = -64`.
pub struct FitsWriter<W: Write> {
    writer: W,
    hdus_written: usize,
}

impl FitsWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> FitsWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            hdus_written: 0,
        }
    }

    /// A primary HDU without data, announcing extensions.
    pub fn write_primary_header(&mut self, keywords: &[Keyword]) -> Result<()> {
        let mut header = Header::new();
        header.add_keyword(Keyword::logical("SIMPLE", true).with_comment("conforms to FITS standard"));
        header.add_keyword(Keyword::integer("BITPIX", 8));
        header.add_keyword(Keyword::integer("NAXIS", 0));
        header.add_keyword(Keyword::logical("EXTEND", true));
        add_user_keywords(&mut header, keywords);
        self.write_hdu(&header, None)
    }

    pub fn write_primary_image(&mut self, data: &Array2<f64>, keywords: &[Keyword]) -> Result<()> {
        let mut header = Header::new();
        header.add_keyword(Keyword::logical("SIMPLE", true).with_comment("conforms to FITS standard"));
        add_image_axes(&mut header, data);
        header.add_keyword(Keyword::logical("EXTEND", true));
        add_user_keywords(&mut header, keywords);
        self.write_hdu(&header, Some(data))
    }

    pub fn write_image_extension(&mut self, data: &Array2<f64>, keywords: &[Keyword]) -> Result<()> {
        let mut header = Header::new();
        header.add_keyword(Keyword::string("XTENSION", "IMAGE").with_comment("Image extension"));
        add_image_axes(&mut header, data);
        header.add_keyword(Keyword::integer("PCOUNT", 0));
        header.add_keyword(Keyword::integer("GCOUNT", 1));
        add_user_keywords(&mut header, keywords);
        self.write_hdu(&header, Some(data))
    }

    /// Writes `hdu` as the primary HDU or as an image extension, depending on position.
    pub fn write(&mut self, hdu: &ImageHdu) -> Result<()> {
        let keywords = hdu.header().keywords();
        match (self.hdus_written, hdu.data()) {
            (0, Some(data)) => self.write_primary_image(data, keywords),
            (0, None) => self.write_primary_header(keywords),
            (_, Some(data)) => self.write_image_extension(data, keywords),
            (_, None) => self.write_image_extension(&Array2::zeros((0, 0)), keywords),
        }
    }

    pub fn hdus_written(&self) -> usize {
        self.hdus_written
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_hdu(&mut self, header: &Header, data: Option<&Array2<f64>>) -> Result<()> {
        self.writer.write_all(&header.to_bytes()?)?;

        if let Some(data) = data.filter(|d| !d.is_empty()) {
            for &value in data.iter() {
                self.writer.write_f64::<BigEndian>(value)?;
            }
            let written = data.len() * Bitpix::F64.bytes_per_pixel();
            let padding = (HEADER_BLOCK_SIZE - written % HEADER_BLOCK_SIZE) % HEADER_BLOCK_SIZE;
            self.writer.write_all(&vec![0u8; padding])?;
        }

        self.hdus_written += 1;
        Ok(())
    }
}

fn add_image_axes(header: &mut Header, data: &Array2<f64>) {
    header.add_keyword(
        Keyword::integer("BITPIX", Bitpix::F64.value()).with_comment("array data type"),
    );
    header.add_keyword(Keyword::integer("NAXIS", 2).with_comment("number of array dimensions"));
    header.add_keyword(Keyword::integer("NAXIS1", data.ncols() as i64));
    header.add_keyword(Keyword::integer("NAXIS2", data.nrows() as i64));
}

fn add_user_keywords(header: &mut Header, keywords: &[Keyword]) {
    for keyword in keywords {
        // Skip mandatory keywords - they're already added for this HDU
        if !keyword.is_structural() {
            header.add_keyword(keyword.clone());
        }
    }
}

/// Writes `hdus` to a new file, the first as the primary HDU.
pub fn write_fits<P: AsRef<Path>>(path: P, hdus: &[ImageHdu]) -> Result<()> {
    let mut writer = FitsWriter::create(path)?;
    for hdu in hdus {
        writer.write(hdu)?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::FitsReader;
    use ndarray::array;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    #[test]
    fn test_primary_image_roundtrip() {
        let data = array![[1.0, 2.0, 3.0], [4.0, f64::NAN, 6.0]];
        let mut writer = FitsWriter::new(Vec::new());
        writer
            .write_primary_image(&data, &[Keyword::string("OBJECT", "M31")])
            .unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes.len() % HEADER_BLOCK_SIZE, 0);

        let hdus = FitsReader::new(Cursor::new(bytes)).read_all().unwrap();
        assert_eq!(hdus.len(), 1);
        let read = hdus[0].data().unwrap();
        assert_eq!(read.dim(), (2, 3));
        assert_eq!(read[[0, 2]], 3.0);
        assert!(read[[1, 1]].is_nan());
        assert_eq!(
            hdus[0].header().get_keyword_value("OBJECT").and_then(|v| v.as_string()),
            Some("M31")
        );
    }

    #[test]
    fn test_structural_keywords_from_source_are_replaced() {
        let data = Array2::from_elem((2, 2), 1.0);
        let source = [
            Keyword::integer("BITPIX", 16),
            Keyword::integer("NAXIS1", 100),
            Keyword::real("BZERO", 32768.0),
            Keyword::string("TELESCOP", "HST"),
        ];
        let mut writer = FitsWriter::new(Vec::new());
        writer.write_primary_image(&data, &source).unwrap();
        let bytes = writer.finish().unwrap();

        let hdus = FitsReader::new(Cursor::new(bytes)).read_all().unwrap();
        let header = hdus[0].header();
        assert_eq!(header.require_integer("BITPIX").unwrap(), -64);
        assert_eq!(header.require_integer("NAXIS1").unwrap(), 2);
        assert!(header.get_keyword("BZERO").is_none());
        assert_eq!(hdus[0].data().unwrap()[[1, 1]], 1.0);
    }

    #[test]
    fn test_multi_extension_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let first = Array2::from_elem((3, 4), 1.0);
        let second = Array2::from_elem((3, 4), 2.0);
        let hdus = vec![
            ImageHdu::header_only([Keyword::real("RA_OBJ", 10.0)].into_iter().collect()),
            ImageHdu::new(Header::new(), first),
            ImageHdu::new(Header::new(), second),
        ];
        write_fits(temp_file.path(), &hdus).unwrap();

        let read = crate::reader::read_fits(temp_file.path()).unwrap();
        assert_eq!(read.len(), 3);
        assert!(read[0].header().is_primary());
        assert!(!read[0].has_data());
        assert!(read[1].header().is_extension());
        assert_eq!(read[2].data().unwrap()[[2, 3]], 2.0);

        let image = crate::reader::read_image(temp_file.path()).unwrap();
        assert_eq!(image.data().unwrap()[[0, 0]], 1.0);
    }
}
