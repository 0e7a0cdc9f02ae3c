use skycut_core::utils::normalize_longitude_positive;
use skycut_core::Frame;

use crate::coordinate::{CelestialCoord, IntermediateCoord, NativeCoord, PixelCoord};
use crate::distortion::SipPolynomial;
use crate::error::{WcsError, WcsResult};
use crate::linear::LinearTransform;
use crate::spherical::{Projection, ProjectionCode, ProjectionParams, SphericalRotation};

/// Celestial axis pair named by the CTYPE prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordType {
    #[default]
    Equatorial,
    Galactic,
    Ecliptic,
    Generic,
}

impl CoordType {
    pub fn from_ctype_prefix(prefix: &str) -> Self {
        match prefix {
            "RA" | "DEC" => Self::Equatorial,
            "GLON" | "GLAT" => Self::Galactic,
            "ELON" | "ELAT" => Self::Ecliptic,
            _ => Self::Generic,
        }
    }

    pub fn from_frame(frame: Frame) -> Self {
        match frame {
            Frame::Icrs | Frame::Fk5 => Self::Equatorial,
            Frame::Galactic => Self::Galactic,
            Frame::Ecliptic => Self::Ecliptic,
        }
    }

    pub fn prefixes(self) -> (&'static str, &'static str) {
        match self {
            Self::Equatorial => ("RA", "DEC"),
            Self::Galactic => ("GLON", "GLAT"),
            Self::Ecliptic => ("ELON", "ELAT"),
            Self::Generic => ("XLON", "XLAT"),
        }
    }
}

/// Pads a CTYPE prefix with dashes to four characters and appends the code.
pub(crate) fn format_ctype(prefix: &str, code: &str, sip: bool) -> String {
    let dashes = "-".repeat(4usize.saturating_sub(prefix.len()) + 1);
    let suffix = if sip { "-SIP" } else { "" };
    format!("{prefix}{dashes}{code}{suffix}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum WcsKeywordValue {
    Real(f64),
    Integer(i64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WcsKeyword {
    pub name: String,
    pub value: WcsKeywordValue,
}

impl WcsKeyword {
    pub fn real(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: WcsKeywordValue::Real(value),
        }
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: WcsKeywordValue::Integer(value),
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: WcsKeywordValue::String(value.into()),
        }
    }
}

/// A two-dimensional celestial WCS.
///
/// Pixel → world runs through the SIP distortion (on CRPIX-relative offsets), the CD
/// matrix, the projection and the spherical rotation; world → pixel inverts each step.
/// `pix2world`/`world2pix` use FITS 1-based pixels. Cloning is a deep copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Wcs {
    coord_type: CoordType,
    code: ProjectionCode,
    projection: Projection,
    pv: ProjectionParams,
    crval: [f64; 2],
    linear: LinearTransform,
    rotation: SphericalRotation,
    lonpole: Option<f64>,
    latpole: Option<f64>,
    radesys: Option<String>,
    equinox: Option<f64>,
    sip: Option<SipPolynomial>,
}

pub(crate) struct WcsParts {
    pub coord_type: CoordType,
    pub code: ProjectionCode,
    pub pv: ProjectionParams,
    pub crval: [f64; 2],
    pub linear: LinearTransform,
    pub lonpole: Option<f64>,
    pub latpole: Option<f64>,
    pub radesys: Option<String>,
    pub equinox: Option<f64>,
    pub sip: Option<SipPolynomial>,
}

impl Wcs {
    pub(crate) fn from_parts(parts: WcsParts) -> WcsResult<Self> {
        let projection = Projection::from_code(parts.code, &parts.pv)?;
        let rotation = SphericalRotation::from_reference(
            parts.crval,
            projection.native_reference(),
            parts.lonpole,
            parts.latpole,
        )?;
        Ok(Self {
            coord_type: parts.coord_type,
            code: parts.code,
            projection,
            pv: parts.pv,
            crval: parts.crval,
            linear: parts.linear,
            rotation,
            lonpole: parts.lonpole,
            latpole: parts.latpole,
            radesys: parts.radesys,
            equinox: parts.equinox,
            sip: parts.sip,
        })
    }

    pub fn pixel_to_celestial(&self, pixel: PixelCoord) -> WcsResult<CelestialCoord> {
        let [crpix1, crpix2] = self.linear.crpix();
        let (u, v) = self.apply_sip_forward(pixel.x() - crpix1, pixel.y() - crpix2);
        self.intermediate_to_celestial(self.linear.offset_to_intermediate(u, v))
    }

    pub fn celestial_to_pixel(&self, celestial: CelestialCoord) -> WcsResult<PixelCoord> {
        let intermediate = self.celestial_to_intermediate(celestial)?;
        let (u, v) = self.linear.intermediate_to_offset(intermediate);
        let (u, v) = self.apply_sip_inverse(u, v)?;
        let [crpix1, crpix2] = self.linear.crpix();
        Ok(PixelCoord::new(u + crpix1, v + crpix2))
    }

    /// Projection-plane coordinates of a sky position. Independent of CRPIX and CD.
    pub fn celestial_to_intermediate(&self, celestial: CelestialCoord) -> WcsResult<IntermediateCoord> {
        let native = self.rotation.celestial_to_native(celestial);
        self.projection.project(native)
    }

    /// Sky position of a projection-plane point. Longitude is in `[0, 360)`.
    pub fn intermediate_to_celestial(&self, intermediate: IntermediateCoord) -> WcsResult<CelestialCoord> {
        let native: NativeCoord = self.projection.deproject(intermediate)?;
        let celestial = self.rotation.native_to_celestial(native);
        Ok(CelestialCoord::new(
            normalize_longitude_positive(celestial.lon_deg()),
            celestial.lat_deg(),
        ))
    }

    fn apply_sip_forward(&self, u: f64, v: f64) -> (f64, f64) {
        match &self.sip {
            Some(sip) => sip.distort(u, v),
            None => (u, v),
        }
    }

    fn apply_sip_inverse(&self, u: f64, v: f64) -> WcsResult<(f64, f64)> {
        match &self.sip {
            Some(sip) => sip.undistort(u, v),
            None => Ok((u, v)),
        }
    }

    pub fn pix2world(&self, x: f64, y: f64) -> WcsResult<(f64, f64)> {
        let celestial = self.pixel_to_celestial(PixelCoord::new(x, y))?;
        Ok((celestial.lon_deg(), celestial.lat_deg()))
    }

    pub fn world2pix(&self, lon: f64, lat: f64) -> WcsResult<(f64, f64)> {
        if !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(WcsError::out_of_bounds(format!(
                "invalid world coordinate ({lon}, {lat})"
            )));
        }
        let pixel = self.celestial_to_pixel(CelestialCoord::new(lon, lat))?;
        Ok((pixel.x(), pixel.y()))
    }

    #[inline]
    pub fn coord_type(&self) -> CoordType {
        self.coord_type
    }

    #[inline]
    pub fn projection_code(&self) -> ProjectionCode {
        self.code
    }

    #[inline]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    #[inline]
    pub fn pv(&self) -> &ProjectionParams {
        &self.pv
    }

    #[inline]
    pub fn crpix(&self) -> [f64; 2] {
        self.linear.crpix()
    }

    #[inline]
    pub fn crval(&self) -> [f64; 2] {
        self.crval
    }

    #[inline]
    pub fn cd(&self) -> [[f64; 2]; 2] {
        self.linear.cd_matrix()
    }

    #[inline]
    pub fn linear(&self) -> &LinearTransform {
        &self.linear
    }

    #[inline]
    pub fn rotation(&self) -> &SphericalRotation {
        &self.rotation
    }

    #[inline]
    pub fn lonpole(&self) -> Option<f64> {
        self.lonpole
    }

    #[inline]
    pub fn latpole(&self) -> Option<f64> {
        self.latpole
    }

    pub fn radesys(&self) -> Option<&str> {
        self.radesys.as_deref()
    }

    #[inline]
    pub fn equinox(&self) -> Option<f64> {
        self.equinox
    }

    #[inline]
    pub fn sip(&self) -> Option<&SipPolynomial> {
        self.sip.as_ref()
    }

    #[inline]
    pub fn pixel_scale(&self) -> f64 {
        self.linear.pixel_scale()
    }

    /// Degrees per pixel along each axis: the norms of the CD columns.
    #[inline]
    pub fn pixel_scales(&self) -> [f64; 2] {
        self.linear.pixel_scales()
    }

    /// Sky frame of the world axes, or `None` for generic longitude/latitude pairs.
    ///
    /// Equatorial axes read as FK5 only when `RADESYS = 'FK5'`, ICRS otherwise.
    pub fn frame(&self) -> Option<Frame> {
        match self.coord_type {
            CoordType::Equatorial => match self.radesys.as_deref().map(str::trim) {
                Some(s) if s.eq_ignore_ascii_case("FK5") => Some(Frame::Fk5),
                _ => Some(Frame::Icrs),
            },
            CoordType::Galactic => Some(Frame::Galactic),
            CoordType::Ecliptic => Some(Frame::Ecliptic),
            CoordType::Generic => None,
        }
    }

    pub fn ctype(&self) -> [String; 2] {
        let (p1, p2) = self.coord_type.prefixes();
        let sip = self.sip.is_some();
        [
            format_ctype(p1, self.code.as_str(), sip),
            format_ctype(p2, self.code.as_str(), sip),
        ]
    }

    /// Same WCS with the reference pixel moved. SIP follows CRPIX automatically.
    pub fn with_crpix(&self, crpix: [f64; 2]) -> Self {
        Self {
            linear: self.linear.with_crpix(crpix),
            ..self.clone()
        }
    }

    pub fn with_linear(&self, crpix: [f64; 2], cd: [[f64; 2]; 2]) -> WcsResult<Self> {
        Ok(Self {
            linear: LinearTransform::from_cd(crpix, cd)?,
            ..self.clone()
        })
    }

    /// Same WCS re-anchored at a new reference value; the rotation is solved again.
    pub fn with_crval(&self, crval: [f64; 2]) -> WcsResult<Self> {
        let rotation = SphericalRotation::from_reference(
            crval,
            self.projection.native_reference(),
            self.lonpole,
            self.latpole,
        )?;
        Ok(Self {
            crval,
            rotation,
            ..self.clone()
        })
    }

    pub fn with_sip(&self, sip: Option<SipPolynomial>) -> Self {
        Self {
            sip,
            ..self.clone()
        }
    }

    pub fn to_keywords(&self) -> Vec<WcsKeyword> {
        let mut keywords = Vec::new();

        keywords.push(WcsKeyword::integer("WCSAXES", 2));
        keywords.extend(self.ctype_keywords());
        keywords.extend(self.crpix_keywords());
        keywords.extend(self.crval_keywords());
        keywords.extend(self.cd_keywords());
        keywords.extend(self.pole_keywords());
        keywords.extend(self.pv_keywords());
        keywords.extend(self.frame_keywords());
        keywords.extend(self.sip_keywords());

        keywords
    }

    fn ctype_keywords(&self) -> Vec<WcsKeyword> {
        let [c1, c2] = self.ctype();
        vec![WcsKeyword::string("CTYPE1", c1), WcsKeyword::string("CTYPE2", c2)]
    }

    fn crpix_keywords(&self) -> Vec<WcsKeyword> {
        let crpix = self.crpix();
        vec![
            WcsKeyword::real("CRPIX1", crpix[0]),
            WcsKeyword::real("CRPIX2", crpix[1]),
        ]
    }

    fn crval_keywords(&self) -> Vec<WcsKeyword> {
        vec![
            WcsKeyword::real("CRVAL1", self.crval[0]),
            WcsKeyword::real("CRVAL2", self.crval[1]),
        ]
    }

    fn cd_keywords(&self) -> Vec<WcsKeyword> {
        let cd = self.cd();
        vec![
            WcsKeyword::real("CD1_1", cd[0][0]),
            WcsKeyword::real("CD1_2", cd[0][1]),
            WcsKeyword::real("CD2_1", cd[1][0]),
            WcsKeyword::real("CD2_2", cd[1][1]),
        ]
    }

    fn pole_keywords(&self) -> Vec<WcsKeyword> {
        let mut keywords = Vec::new();
        if let Some(lonpole) = self.lonpole {
            keywords.push(WcsKeyword::real("LONPOLE", lonpole));
        }
        if let Some(latpole) = self.latpole {
            keywords.push(WcsKeyword::real("LATPOLE", latpole));
        }
        keywords
    }

    fn pv_keywords(&self) -> Vec<WcsKeyword> {
        self.pv
            .iter()
            .map(|(m, value)| WcsKeyword::real(format!("PV2_{m}"), value))
            .collect()
    }

    fn frame_keywords(&self) -> Vec<WcsKeyword> {
        let mut keywords = Vec::new();
        if let Some(radesys) = &self.radesys {
            keywords.push(WcsKeyword::string("RADESYS", radesys.clone()));
        }
        if let Some(equinox) = self.equinox {
            keywords.push(WcsKeyword::real("EQUINOX", equinox));
        }
        keywords
    }

    fn sip_keywords(&self) -> Vec<WcsKeyword> {
        let Some(sip) = &self.sip else {
            return Vec::new();
        };
        let mut keywords = Vec::new();
        let mut push_grid = |prefix: &str, coeffs: &crate::distortion::SipCoefficients| {
            keywords.push(WcsKeyword::integer(
                format!("{prefix}_ORDER"),
                coeffs.order() as i64,
            ));
            for (p, q, value) in coeffs.terms() {
                keywords.push(WcsKeyword::real(format!("{prefix}_{p}_{q}"), value));
            }
        };
        push_grid("A", sip.a());
        push_grid("B", sip.b());
        if let (Some(ap), Some(bp)) = (sip.ap(), sip.bp()) {
            push_grid("AP", ap);
            push_grid("BP", bp);
        }
        keywords
    }
}
