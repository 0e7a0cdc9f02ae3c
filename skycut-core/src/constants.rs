#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const PI: f64 = 3.141592653589793238462643;

#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const HALF_PI: f64 = 1.5707963267948966192313216;

#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const TWOPI: f64 = 6.283185307179586476925287;

#[allow(clippy::excessive_precision)]
pub const DEG_TO_RAD: f64 = 1.745329251994329576923691e-2;

#[allow(clippy::excessive_precision)]
pub const RAD_TO_DEG: f64 = 57.29577951308232087679815;

#[allow(clippy::excessive_precision)]
#[allow(clippy::approx_constant)]
pub const SQRT2: f64 = 1.4142135623730950488;

pub const ARCSEC_PER_DEG: f64 = 3600.0;

/// Mean obliquity of the ecliptic at J2000.0 (IAU 2006), in degrees.
pub const J2000_OBLIQUITY_DEG: f64 = 23.439_291_1;

/// Rotation from Galactic (l, b) unit vectors to ICRS unit vectors.
///
/// Rows are the ICRS x, y, z axes expressed in Galactic coordinates; the
/// transpose maps ICRS to Galactic.
#[allow(clippy::excessive_precision)]
pub const GALACTIC_TO_ICRS: [[f64; 3]; 3] = [
    [
        -0.054875560416215368492398900454,
        0.494109427875583673525222371358,
        -0.867666149019004701181616534570,
    ],
    [
        -0.873437090234885048760383168409,
        -0.444829629960011178146614061616,
        -0.198076373431201528180486091412,
    ],
    [
        -0.483835015548713226831774175116,
        0.746982244497218890527388004556,
        0.455983776175066922272100478348,
    ],
];
