use crate::coordinate::{IntermediateCoord, PixelCoord};
use crate::error::{WcsError, WcsResult};

const DETERMINANT_THRESHOLD: f64 = 1e-30;

/// Pixel ⇄ intermediate world coordinates through CRPIX and the CD matrix.
///
/// `crpix` uses the FITS 1-based convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform {
    crpix: [f64; 2],
    cd: [[f64; 2]; 2],
    cd_inverse: [[f64; 2]; 2],
    determinant: f64,
}

impl LinearTransform {
    pub fn from_cd(crpix: [f64; 2], cd: [[f64; 2]; 2]) -> WcsResult<Self> {
        let determinant = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
        if !determinant.is_finite() || determinant.abs() < DETERMINANT_THRESHOLD {
            return Err(WcsError::non_invertible_matrix(determinant));
        }
        let inv_det = 1.0 / determinant;
        let cd_inverse = [
            [cd[1][1] * inv_det, -cd[0][1] * inv_det],
            [-cd[1][0] * inv_det, cd[0][0] * inv_det],
        ];
        Ok(Self {
            crpix,
            cd,
            cd_inverse,
            determinant,
        })
    }

    /// Folds PCi_j and CDELTi into a single CD matrix.
    pub fn from_pc_cdelt(crpix: [f64; 2], pc: [[f64; 2]; 2], cdelt: [f64; 2]) -> WcsResult<Self> {
        let cd = [
            [cdelt[0] * pc[0][0], cdelt[0] * pc[0][1]],
            [cdelt[1] * pc[1][0], cdelt[1] * pc[1][1]],
        ];
        Self::from_cd(crpix, cd)
    }

    /// Same matrix anchored at a different reference pixel.
    pub fn with_crpix(&self, crpix: [f64; 2]) -> Self {
        Self { crpix, ..*self }
    }

    pub fn pixel_to_intermediate(&self, pixel: PixelCoord) -> IntermediateCoord {
        self.offset_to_intermediate(pixel.x() - self.crpix[0], pixel.y() - self.crpix[1])
    }

    /// Applies CD to an offset already measured from CRPIX.
    #[inline]
    pub fn offset_to_intermediate(&self, dx: f64, dy: f64) -> IntermediateCoord {
        IntermediateCoord::new(
            self.cd[0][0] * dx + self.cd[0][1] * dy,
            self.cd[1][0] * dx + self.cd[1][1] * dy,
        )
    }

    /// Inverse of [`offset_to_intermediate`](Self::offset_to_intermediate).
    #[inline]
    pub fn intermediate_to_offset(&self, inter: IntermediateCoord) -> (f64, f64) {
        let (x, y) = (inter.x_deg(), inter.y_deg());
        (
            self.cd_inverse[0][0] * x + self.cd_inverse[0][1] * y,
            self.cd_inverse[1][0] * x + self.cd_inverse[1][1] * y,
        )
    }

    pub fn intermediate_to_pixel(&self, inter: IntermediateCoord) -> PixelCoord {
        let (dx, dy) = self.intermediate_to_offset(inter);
        PixelCoord::new(dx + self.crpix[0], dy + self.crpix[1])
    }

    #[inline]
    pub fn crpix(&self) -> [f64; 2] {
        self.crpix
    }

    #[inline]
    pub fn cd_matrix(&self) -> [[f64; 2]; 2] {
        self.cd
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.determinant
    }

    /// Geometric-mean plate scale in degrees per pixel.
    #[inline]
    pub fn pixel_scale(&self) -> f64 {
        self.determinant.abs().sqrt()
    }

    /// Per-axis plate scales: the norms of the CD columns, in degrees per pixel.
    pub fn pixel_scales(&self) -> [f64; 2] {
        [
            self.cd[0][0].hypot(self.cd[1][0]),
            self.cd[0][1].hypot(self.cd[1][1]),
        ]
    }
}
