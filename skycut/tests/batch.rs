//! End-to-end cutouts through files on disk.

use ndarray::s;
use skycut::{fits_cut, CutoutError, CutoutOptions, CutoutOutput, CutoutSize};
use skycut_core::SkyCoord;
use skycut_images::test_utils::{PixelFill, SyntheticImage};
use skycut_images::{read_fits, Keyword, KeywordValue};
use skycut_wcs::PixelTransform;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCALE: f64 = 5e-5;

fn write_images(dir: &Path, images: &[SyntheticImage]) -> Vec<PathBuf> {
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let path = dir.join(format!("img{}.fits", i));
            image.write(&path).unwrap();
            path
        })
        .collect()
}

fn options(dir: &Path) -> CutoutOptions {
    CutoutOptions::default().with_output_dir(dir.join("out"))
}

#[test]
fn test_combined_file_has_one_extension_per_image() {
    let dir = TempDir::new().unwrap();
    let center = SkyCoord::icrs(150.0, 2.2);
    let images: Vec<_> = (0..6)
        .map(|i| {
            let offset = i as f64 * 3.0 * SCALE;
            let image = SyntheticImage::tan(60 + 4 * i, 50 + 2 * i, [150.0 + offset, 2.2 - offset], SCALE)
                .unwrap();
            if i % 2 == 1 {
                image.in_extension()
            } else {
                image
            }
        })
        .collect();
    let inputs = write_images(dir.path(), &images);

    let output = fits_cut(&inputs, &center, &CutoutSize::pixels(20.0), &options(dir.path())).unwrap();
    let CutoutOutput::Single(path) = output else {
        panic!("expected a single output file");
    };
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("cutout_150.0000000_2.2000000_20-x-20"), "{}", name);
    assert!(name.ends_with("_skycut.fits"));

    let hdus = read_fits(&path).unwrap();
    assert_eq!(hdus.len(), 7);

    let primary = hdus[0].header();
    assert!(!hdus[0].has_data());
    assert_eq!(
        primary.get_keyword_value("RA_OBJ").and_then(|v| v.as_real()),
        Some(150.0)
    );
    assert_eq!(
        primary.get_keyword_value("ORIGIN").and_then(|v| v.as_string()),
        Some("skycut")
    );
    assert!(primary.get_keyword("DATE").is_some());

    for (i, hdu) in hdus[1..].iter().enumerate() {
        assert_eq!(hdu.dimensions(), Some((20, 20)));
        assert_eq!(
            hdu.header().get_keyword_value("ORIG_FLE").and_then(|v| v.as_string()),
            Some(format!("img{}.fits", i).as_str())
        );

        let wcs = hdu.wcs().unwrap();
        let (lon, lat) = wcs.pixel_to_world(10.0, 10.0).unwrap();
        let separation = SkyCoord::icrs(lon, lat).separation(&center).unwrap();
        assert!(separation.degrees() < 1e-4, "image {}: {}", i, separation.degrees());
    }
}

#[test]
fn test_cutout_hanging_off_the_edge_is_padded_with_nan() {
    let dir = TempDir::new().unwrap();
    let image = SyntheticImage::tan(40, 40, [30.0, -10.0], SCALE).unwrap();
    let (lon, lat) = image.wcs().pixel_to_world(0.0, 20.0).unwrap();
    let inputs = write_images(dir.path(), &[image]);

    let output = fits_cut(
        &inputs,
        &SkyCoord::icrs(lon, lat),
        &CutoutSize::pixels(20.0),
        &options(dir.path()),
    )
    .unwrap();

    let hdus = read_fits(&output.paths()[0]).unwrap();
    let data = hdus[1].data().unwrap();
    assert_eq!(data.dim(), (20, 20));
    assert!(data.slice(s![.., ..10]).iter().all(|v| v.is_nan()));
    assert!(data.slice(s![.., 10..]).iter().all(|v| v.is_finite()));
    assert_eq!(
        hdus[1].header().get_keyword_value("EMPTY"),
        Some(&KeywordValue::Logical(false))
    );
}

fn mixed_batch(dir: &Path) -> Vec<PathBuf> {
    let images: Vec<_> = (0..5)
        .map(|i| {
            let image = SyntheticImage::tan(30, 30, [200.0, 45.0], SCALE).unwrap();
            if i == 1 || i == 3 {
                image.fill(PixelFill::Constant(0.0))
            } else {
                image
            }
        })
        .collect();
    write_images(dir, &images)
}

#[test]
fn test_separate_files_skip_empty_cutouts() {
    let dir = TempDir::new().unwrap();
    let inputs = mixed_batch(dir.path());

    let output = fits_cut(
        &inputs,
        &SkyCoord::icrs(200.0, 45.0),
        &CutoutSize::pixels(8.0),
        &options(dir.path()).with_single_outfile(false),
    )
    .unwrap();

    let CutoutOutput::Separate(paths) = output else {
        panic!("expected separate files");
    };
    assert_eq!(paths.len(), 3);
    for (path, source) in paths.iter().zip(["img0", "img2", "img4"]) {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(source), "{}", name);
        assert!(name.ends_with("_8-x-8_cutout.fits"), "{}", name);
        assert!(path.exists());

        let hdus = read_fits(path).unwrap();
        assert_eq!(hdus.len(), 1);
        assert_eq!(hdus[0].dimensions(), Some((8, 8)));
    }
}

#[test]
fn test_combined_file_keeps_and_flags_empty_cutouts() {
    let dir = TempDir::new().unwrap();
    let inputs = mixed_batch(dir.path());

    let output = fits_cut(
        &inputs,
        &SkyCoord::icrs(200.0, 45.0),
        &CutoutSize::pixels(8.0),
        &options(dir.path()).with_parallel(true),
    )
    .unwrap();

    let hdus = read_fits(&output.paths()[0]).unwrap();
    assert_eq!(hdus.len(), 6);
    let flags: Vec<_> = hdus[1..]
        .iter()
        .map(|hdu| hdu.header().get_keyword_value("EMPTY").and_then(|v| v.as_logical()))
        .collect();
    assert_eq!(
        flags,
        vec![Some(false), Some(true), Some(false), Some(true), Some(false)]
    );
}

#[test]
fn test_batch_without_any_data_fails() {
    let dir = TempDir::new().unwrap();
    let image = SyntheticImage::tan(30, 30, [10.0, 10.0], SCALE)
        .unwrap()
        .fill(PixelFill::Constant(0.0));
    let inputs = write_images(dir.path(), &[image.clone(), image]);

    let err = fits_cut(
        &inputs,
        &SkyCoord::icrs(10.0, 10.0),
        &CutoutSize::pixels(8.0),
        &options(dir.path()),
    )
    .unwrap_err();
    assert!(matches!(err, CutoutError::NoData { images: 2 }));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_drop_after_applies_to_written_headers() {
    let dir = TempDir::new().unwrap();
    let image = SyntheticImage::tan(30, 30, [80.0, -30.0], SCALE)
        .unwrap()
        .keyword(Keyword::string("TELESCOP", "sim"))
        .keyword(Keyword::integer("DUMMY1", 1))
        .keyword(Keyword::integer("DUMMY2", 2));
    let inputs = write_images(dir.path(), &[image]);

    let output = fits_cut(
        &inputs,
        &SkyCoord::icrs(80.0, -30.0),
        &CutoutSize::pixels(10.0),
        &options(dir.path()).with_drop_after("DUMMY1"),
    )
    .unwrap();

    let hdus = read_fits(&output.paths()[0]).unwrap();
    let header = hdus[1].header();
    assert!(header.get_keyword("TELESCOP").is_some());
    assert!(header.get_keyword("DUMMY1").is_some());
    assert!(header.get_keyword("DUMMY2").is_none());
    assert!(hdus[1].wcs().is_ok());
}

#[test]
fn test_missing_input_names_the_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.fits");
    let err = fits_cut(
        &[missing.clone()],
        &SkyCoord::icrs(0.0, 0.0),
        &CutoutSize::pixels(5.0),
        &options(dir.path()),
    )
    .unwrap_err();
    match err {
        CutoutError::Fits { path, .. } => assert_eq!(path, missing.display().to_string()),
        other => panic!("unexpected error {:?}", other),
    }
}
