use std::str::FromStr;

use crate::distortion::{SipCoefficients, SipPolynomial};
use crate::error::{WcsError, WcsResult};
use crate::header::KeywordProvider;
use crate::linear::LinearTransform;
use crate::spherical::{ProjectionCode, ProjectionParams};
use crate::wcs::{CoordType, Wcs, WcsParts};

const MAX_PV_INDEX: u32 = 20;
const MAX_SIP_ORDER: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum MatrixSpec {
    #[default]
    None,
    Cd([[f64; 2]; 2]),
    PcCdelt {
        pc: [[f64; 2]; 2],
        cdelt: [f64; 2],
    },
}

#[derive(Debug, Clone, Default)]
pub struct WcsBuilder {
    crpix: Option<[f64; 2]>,
    crval: Option<[f64; 2]>,
    matrix: MatrixSpec,
    proj_code: Option<String>,
    pv: ProjectionParams,
    lonpole: Option<f64>,
    latpole: Option<f64>,
    coord_type: Option<CoordType>,
    radesys: Option<String>,
    equinox: Option<f64>,
    sip: Option<SipPolynomial>,
}

impl WcsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference pixel, FITS 1-based.
    pub fn crpix(mut self, x: f64, y: f64) -> Self {
        self.crpix = Some([x, y]);
        self
    }

    pub fn crval(mut self, lon: f64, lat: f64) -> Self {
        self.crval = Some([lon, lat]);
        self
    }

    pub fn cd_matrix(mut self, cd: [[f64; 2]; 2]) -> Self {
        self.matrix = MatrixSpec::Cd(cd);
        self
    }

    pub fn pc_cdelt(mut self, pc: [[f64; 2]; 2], cdelt: [f64; 2]) -> Self {
        self.matrix = MatrixSpec::PcCdelt { pc, cdelt };
        self
    }

    pub fn projection(mut self, code: ProjectionCode) -> Self {
        self.proj_code = Some(code.as_str().to_string());
        self
    }

    pub fn proj_code(mut self, code: impl Into<String>) -> Self {
        self.proj_code = Some(code.into());
        self
    }

    /// Sets `PV2_m` on the latitude axis.
    pub fn pv(mut self, m: u32, value: f64) -> Self {
        self.pv.set(m, value);
        self
    }

    pub fn lonpole(mut self, lonpole: f64) -> Self {
        self.lonpole = Some(lonpole);
        self
    }

    pub fn latpole(mut self, latpole: f64) -> Self {
        self.latpole = Some(latpole);
        self
    }

    pub fn coord_type(mut self, coord_type: CoordType) -> Self {
        self.coord_type = Some(coord_type);
        self
    }

    pub fn radesys(mut self, radesys: impl Into<String>) -> Self {
        self.radesys = Some(radesys.into());
        self
    }

    pub fn equinox(mut self, equinox: f64) -> Self {
        self.equinox = Some(equinox);
        self
    }

    pub fn sip(mut self, sip: SipPolynomial) -> Self {
        self.sip = Some(sip);
        self
    }

    pub fn from_header(header: &impl KeywordProvider) -> WcsResult<Self> {
        let ctype1 = header.require_string("CTYPE1")?;
        let ctype2 = header.require_string("CTYPE2")?;

        let lon_axis = parse_ctype(&ctype1)?;
        let lat_axis = parse_ctype(&ctype2)?;

        if lon_axis.code != lat_axis.code {
            return Err(WcsError::invalid_keyword(
                "CTYPE1/CTYPE2",
                format!(
                    "Mismatched projection codes: '{}' vs '{}'",
                    lon_axis.code, lat_axis.code
                ),
            ));
        }
        if is_latitude_prefix(lon_axis.prefix) {
            return Err(WcsError::invalid_keyword(
                "CTYPE1",
                format!("latitude-first axis order is not supported: '{ctype1}'"),
            ));
        }

        let mut builder = Self::new()
            .crpix(header.require_float("CRPIX1")?, header.require_float("CRPIX2")?)
            .crval(header.require_float("CRVAL1")?, header.require_float("CRVAL2")?)
            .coord_type(CoordType::from_ctype_prefix(lon_axis.prefix))
            .proj_code(lon_axis.code);

        builder.matrix = parse_matrix(header)?;
        builder.pv = parse_pv_params(header);
        builder.lonpole = header.get_float("LONPOLE");
        builder.latpole = header.get_float("LATPOLE");
        builder.radesys = header
            .get_string("RADESYS")
            .or_else(|| header.get_string("RADECSYS"))
            .map(|s| s.trim().to_string());
        builder.equinox = header.get_float("EQUINOX");

        let has_sip_suffix = lon_axis.sip || lat_axis.sip;
        builder.sip = parse_sip(header, has_sip_suffix)?;

        Ok(builder)
    }

    pub fn validate(&self) -> WcsResult<()> {
        if self.crpix.is_none() {
            return Err(WcsError::missing_keyword("CRPIX"));
        }
        if self.crval.is_none() {
            return Err(WcsError::missing_keyword("CRVAL"));
        }
        if self.matrix == MatrixSpec::None {
            return Err(WcsError::missing_keyword(
                "Missing transformation matrix (CD or PC+CDELT)",
            ));
        }
        if self.proj_code.is_none() {
            return Err(WcsError::missing_keyword("Missing projection code"));
        }
        if let Some([lon, lat]) = self.crval {
            if !lon.is_finite() || !(-90.0..=90.0).contains(&lat) {
                return Err(WcsError::invalid_keyword(
                    "CRVAL",
                    format!("invalid reference value ({lon}, {lat})"),
                ));
            }
        }
        Ok(())
    }

    pub fn build(self) -> WcsResult<Wcs> {
        self.validate()?;

        let crpix = self.crpix.ok_or_else(|| WcsError::missing_keyword("CRPIX"))?;
        let crval = self.crval.ok_or_else(|| WcsError::missing_keyword("CRVAL"))?;

        let linear = match self.matrix {
            MatrixSpec::Cd(cd) => LinearTransform::from_cd(crpix, cd)?,
            MatrixSpec::PcCdelt { pc, cdelt } => LinearTransform::from_pc_cdelt(crpix, pc, cdelt)?,
            MatrixSpec::None => return Err(WcsError::missing_keyword("CD1_1 or CDELT1")),
        };

        let code = self
            .proj_code
            .as_deref()
            .map(ProjectionCode::from_str)
            .transpose()?
            .ok_or_else(|| WcsError::missing_keyword("Missing projection code"))?;

        Wcs::from_parts(WcsParts {
            coord_type: self.coord_type.unwrap_or_default(),
            code,
            pv: self.pv,
            crval,
            linear,
            lonpole: self.lonpole,
            latpole: self.latpole,
            radesys: self.radesys,
            equinox: self.equinox,
            sip: self.sip,
        })
    }
}

#[derive(Debug, PartialEq)]
struct CtypeParts<'a> {
    prefix: &'a str,
    code: &'a str,
    sip: bool,
}

fn parse_ctype(ctype: &str) -> WcsResult<CtypeParts<'_>> {
    let trimmed = ctype.trim();
    let (body, sip) = match trimmed.strip_suffix("-SIP") {
        Some(body) => (body, true),
        None => (trimmed, false),
    };

    let Some(dash_pos) = body.rfind('-') else {
        return Err(WcsError::invalid_keyword(
            "CTYPE",
            format!("Invalid CTYPE format (no dash separator): '{ctype}'"),
        ));
    };
    if dash_pos == 0 {
        return Err(WcsError::invalid_keyword(
            "CTYPE",
            format!("Invalid CTYPE format: '{ctype}'"),
        ));
    }

    let prefix = body[..dash_pos].trim_end_matches('-');
    let code = &body[dash_pos + 1..];
    if code.is_empty() {
        return Err(WcsError::invalid_keyword(
            "CTYPE",
            format!("Missing projection code in CTYPE: '{ctype}'"),
        ));
    }

    Ok(CtypeParts { prefix, code, sip })
}

fn is_latitude_prefix(prefix: &str) -> bool {
    prefix == "DEC" || prefix.ends_with("LAT")
}

fn parse_matrix(header: &impl KeywordProvider) -> WcsResult<MatrixSpec> {
    let cd11 = header.get_float("CD1_1");
    let cd12 = header.get_float("CD1_2");
    let cd21 = header.get_float("CD2_1");
    let cd22 = header.get_float("CD2_2");

    if cd11.is_some() || cd12.is_some() || cd21.is_some() || cd22.is_some() {
        let cd = [
            [cd11.unwrap_or(0.0), cd12.unwrap_or(0.0)],
            [cd21.unwrap_or(0.0), cd22.unwrap_or(0.0)],
        ];
        return Ok(MatrixSpec::Cd(cd));
    }

    if let (Some(c1), Some(c2)) = (header.get_float("CDELT1"), header.get_float("CDELT2")) {
        let pc = [
            [
                header.get_float("PC1_1").unwrap_or(1.0),
                header.get_float("PC1_2").unwrap_or(0.0),
            ],
            [
                header.get_float("PC2_1").unwrap_or(0.0),
                header.get_float("PC2_2").unwrap_or(1.0),
            ],
        ];
        return Ok(MatrixSpec::PcCdelt {
            pc,
            cdelt: [c1, c2],
        });
    }

    Err(WcsError::missing_keyword(
        "CD1_1 or CDELT1 (no transformation matrix found)",
    ))
}

fn parse_pv_params(header: &impl KeywordProvider) -> ProjectionParams {
    let mut pv = ProjectionParams::new();
    for m in 0..=MAX_PV_INDEX {
        if let Some(value) = header.get_float(&format!("PV2_{m}")) {
            pv.set(m, value);
        }
    }
    pv
}

fn parse_sip(header: &impl KeywordProvider, has_sip_suffix: bool) -> WcsResult<Option<SipPolynomial>> {
    let Some(a_order) = header.get_int("A_ORDER") else {
        if has_sip_suffix {
            return Err(WcsError::missing_keyword("A_ORDER"));
        }
        return Ok(None);
    };
    let b_order = header
        .get_int("B_ORDER")
        .ok_or_else(|| WcsError::missing_keyword("B_ORDER"))?;

    let a = parse_sip_grid(header, "A", a_order)?;
    let b = parse_sip_grid(header, "B", b_order)?;
    let mut sip = SipPolynomial::new(a, b);

    if let (Some(ap_order), Some(bp_order)) = (header.get_int("AP_ORDER"), header.get_int("BP_ORDER")) {
        let ap = parse_sip_grid(header, "AP", ap_order)?;
        let bp = parse_sip_grid(header, "BP", bp_order)?;
        sip = sip.with_inverse(ap, bp);
    }

    Ok(Some(sip))
}

fn parse_sip_grid(header: &impl KeywordProvider, prefix: &str, order: i64) -> WcsResult<SipCoefficients> {
    if !(0..=MAX_SIP_ORDER).contains(&order) {
        return Err(WcsError::invalid_keyword(
            format!("{prefix}_ORDER"),
            format!("order {order} outside 0..={MAX_SIP_ORDER}"),
        ));
    }
    let order = order as usize;
    let mut coeffs = SipCoefficients::zeros(order);
    for p in 0..=order {
        for q in 0..=(order - p) {
            if let Some(value) = header.get_float(&format!("{prefix}_{p}_{q}")) {
                coeffs.set(p, q, value)?;
            }
        }
    }
    Ok(coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::KeywordMap;
    use crate::wcs::WcsKeywordValue;

    fn base_header() -> KeywordMap {
        let mut header = KeywordMap::new();
        header
            .set_string("CTYPE1", "RA---TAN")
            .set_string("CTYPE2", "DEC--TAN")
            .set_float("CRPIX1", 512.0)
            .set_float("CRPIX2", 512.0)
            .set_float("CRVAL1", 180.0)
            .set_float("CRVAL2", 45.0);
        header
    }

    fn with_cd(mut header: KeywordMap) -> KeywordMap {
        header
            .set_float("CD1_1", -0.001)
            .set_float("CD1_2", 0.0)
            .set_float("CD2_1", 0.0)
            .set_float("CD2_2", 0.001);
        header
    }

    fn keywords_to_map(wcs: &Wcs) -> KeywordMap {
        let mut map = KeywordMap::new();
        for keyword in wcs.to_keywords() {
            match keyword.value {
                WcsKeywordValue::Real(v) => map.set_float(keyword.name, v),
                WcsKeywordValue::Integer(v) => map.set_int(keyword.name, v),
                WcsKeywordValue::String(v) => map.set_string(keyword.name, v),
            };
        }
        map
    }

    #[test]
    fn test_parse_ctype_ra_tan() {
        let parts = parse_ctype("RA---TAN").unwrap();
        assert_eq!(parts, CtypeParts { prefix: "RA", code: "TAN", sip: false });
    }

    #[test]
    fn test_parse_ctype_dec_sip() {
        let parts = parse_ctype("DEC--TAN-SIP").unwrap();
        assert_eq!(parts, CtypeParts { prefix: "DEC", code: "TAN", sip: true });
    }

    #[test]
    fn test_parse_ctype_glon_with_whitespace() {
        let parts = parse_ctype("  GLON-CAR  ").unwrap();
        assert_eq!(parts.prefix, "GLON");
        assert_eq!(parts.code, "CAR");
    }

    #[test]
    fn test_parse_ctype_invalid() {
        assert!(parse_ctype("RATAN").is_err());
        assert!(parse_ctype("RA---").is_err());
        assert!(parse_ctype("-TAN").is_err());
    }

    #[test]
    fn test_builder_missing_fields() {
        let err = WcsBuilder::new().crval(0.0, 0.0).build().unwrap_err();
        assert!(matches!(err, WcsError::MissingKeyword { .. }));

        let err = WcsBuilder::new()
            .crpix(1.0, 1.0)
            .crval(0.0, 0.0)
            .proj_code("TAN")
            .build()
            .unwrap_err();
        assert!(matches!(err, WcsError::MissingKeyword { .. }));
    }

    #[test]
    fn test_build_unsupported_projection() {
        let err = WcsBuilder::new()
            .crpix(1.0, 1.0)
            .crval(0.0, 0.0)
            .cd_matrix([[1.0, 0.0], [0.0, 1.0]])
            .proj_code("ZPN")
            .build()
            .unwrap_err();
        assert!(matches!(err, WcsError::UnsupportedProjection { .. }));
    }

    #[test]
    fn test_build_conic_missing_param() {
        let builder = WcsBuilder::new()
            .crpix(1.0, 1.0)
            .crval(0.0, 30.0)
            .cd_matrix([[1.0, 0.0], [0.0, 1.0]])
            .projection(ProjectionCode::Cod);
        assert!(builder.clone().build().is_err());
        let wcs = builder.pv(1, 45.0).build().unwrap();
        assert_eq!(wcs.projection_code(), ProjectionCode::Cod);
    }

    #[test]
    fn test_from_header_cd_matrix() {
        let wcs = WcsBuilder::from_header(&with_cd(base_header()))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(wcs.cd(), [[-0.001, 0.0], [0.0, 0.001]]);
        assert_eq!(wcs.crpix(), [512.0, 512.0]);
        assert_eq!(wcs.crval(), [180.0, 45.0]);
        assert!(wcs.sip().is_none());
    }

    #[test]
    fn test_from_header_pc_cdelt() {
        let mut header = base_header();
        header
            .set_float("CDELT1", -0.002)
            .set_float("CDELT2", 0.002)
            .set_float("PC1_2", 0.5);
        let wcs = WcsBuilder::from_header(&header).unwrap().build().unwrap();
        assert_eq!(wcs.cd(), [[-0.002, -0.001], [0.0, 0.002]]);
    }

    #[test]
    fn test_from_header_missing_matrix() {
        let err = WcsBuilder::from_header(&base_header()).unwrap_err();
        assert!(matches!(err, WcsError::MissingKeyword { .. }));
    }

    #[test]
    fn test_from_header_missing_crpix() {
        let mut header = KeywordMap::new();
        header
            .set_string("CTYPE1", "RA---TAN")
            .set_string("CTYPE2", "DEC--TAN");
        let err = WcsBuilder::from_header(&header).unwrap_err();
        assert!(matches!(err, WcsError::MissingKeyword { keyword } if keyword == "CRPIX1"));
    }

    #[test]
    fn test_from_header_mismatched_projection() {
        let mut header = with_cd(base_header());
        header.set_string("CTYPE2", "DEC--SIN");
        assert!(WcsBuilder::from_header(&header).is_err());
    }

    #[test]
    fn test_from_header_latitude_first_rejected() {
        let mut header = with_cd(base_header());
        header
            .set_string("CTYPE1", "DEC--TAN")
            .set_string("CTYPE2", "RA---TAN");
        assert!(WcsBuilder::from_header(&header).is_err());
    }

    #[test]
    fn test_from_header_pv_and_poles() {
        let mut header = with_cd(base_header());
        header
            .set_string("CTYPE1", "RA---COE")
            .set_string("CTYPE2", "DEC--COE")
            .set_float("PV2_1", 30.0)
            .set_float("PV2_2", 5.0)
            .set_float("LONPOLE", 180.0)
            .set_float("LATPOLE", 45.0);
        let wcs = WcsBuilder::from_header(&header).unwrap().build().unwrap();
        assert_eq!(wcs.pv().get(1), Some(30.0));
        assert_eq!(wcs.pv().get(2), Some(5.0));
        assert_eq!(wcs.lonpole(), Some(180.0));
        assert_eq!(wcs.latpole(), Some(45.0));
    }

    #[test]
    fn test_from_header_ecliptic_coords() {
        let mut header = with_cd(base_header());
        header
            .set_string("CTYPE1", "ELON-CAR")
            .set_string("CTYPE2", "ELAT-CAR")
            .set_float("CRVAL2", 0.0);
        let wcs = WcsBuilder::from_header(&header).unwrap().build().unwrap();
        assert_eq!(wcs.coord_type(), CoordType::Ecliptic);
        assert_eq!(wcs.ctype(), ["ELON-CAR".to_string(), "ELAT-CAR".to_string()]);
    }

    #[test]
    fn test_from_header_sip() {
        let mut header = with_cd(base_header());
        header
            .set_string("CTYPE1", "RA---TAN-SIP")
            .set_string("CTYPE2", "DEC--TAN-SIP")
            .set_int("A_ORDER", 2)
            .set_float("A_2_0", 1e-6)
            .set_float("A_0_2", -2e-6)
            .set_int("B_ORDER", 2)
            .set_float("B_1_1", 3e-6);
        let wcs = WcsBuilder::from_header(&header).unwrap().build().unwrap();
        let sip = wcs.sip().unwrap();
        assert_eq!(sip.a().get(2, 0), 1e-6);
        assert_eq!(sip.a().get(0, 2), -2e-6);
        assert_eq!(sip.b().get(1, 1), 3e-6);
        assert!(sip.ap().is_none());
    }

    #[test]
    fn test_from_header_sip_suffix_without_order() {
        let mut header = with_cd(base_header());
        header
            .set_string("CTYPE1", "RA---TAN-SIP")
            .set_string("CTYPE2", "DEC--TAN-SIP");
        let err = WcsBuilder::from_header(&header).unwrap_err();
        assert!(matches!(err, WcsError::MissingKeyword { keyword } if keyword == "A_ORDER"));
    }

    #[test]
    fn test_keyword_roundtrip_preserves_wcs() {
        let mut a = SipCoefficients::zeros(3);
        a.set(2, 0, 1.5e-6).unwrap();
        a.set(1, 2, -4e-9).unwrap();
        let mut b = SipCoefficients::zeros(3);
        b.set(0, 3, 7e-9).unwrap();
        let mut ap = SipCoefficients::zeros(3);
        ap.set(2, 0, -1.5e-6).unwrap();
        let bp = SipCoefficients::zeros(3);

        let wcs = WcsBuilder::new()
            .crpix(100.25, 200.75)
            .crval(266.4, -28.9)
            .cd_matrix([[-2.8e-4, 1.0e-5], [1.2e-5, 2.8e-4]])
            .proj_code("TAN")
            .radesys("FK5")
            .equinox(2000.0)
            .lonpole(180.0)
            .sip(SipPolynomial::new(a, b).with_inverse(ap, bp))
            .build()
            .unwrap();

        let header = keywords_to_map(&wcs);
        let parsed = WcsBuilder::from_header(&header).unwrap().build().unwrap();
        assert_eq!(parsed, wcs);
    }

    #[test]
    fn test_keyword_roundtrip_other_projection() {
        let wcs = WcsBuilder::new()
            .crpix(10.0, 20.0)
            .crval(83.6, 22.0)
            .cd_matrix([[-0.01, 0.0], [0.0, 0.01]])
            .projection(ProjectionCode::Azp)
            .pv(1, 2.0)
            .pv(2, 30.0)
            .coord_type(CoordType::Galactic)
            .build()
            .unwrap();
        let parsed = WcsBuilder::from_header(&keywords_to_map(&wcs))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(parsed, wcs);
    }
}
