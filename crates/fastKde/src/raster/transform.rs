//! Affine georeferencing and CRS identifiers.
//!
//! ## Purpose
//!
//! This module maps raster pixel indices to planar coordinates and back.
//! [`AffineTransform`] follows the usual six-coefficient convention
//! (`x = a·col + b·row + c`, `y = d·col + e·row + f`); [`Crs`] names the
//! coordinate reference system shared by points, lattice and raster.
//!
//! ## Invariants
//!
//! * `translation(tx, ty) * scale(sx, sy)` maps pixel `(row, col)` to
//!   `(tx + col·sx, ty + row·sy)`.
//! * Axis-aligned transforms with a zero scale on one axis still invert on
//!   the other axis; the degenerate axis maps to pixel 0.
//!
//! ## Non-goals
//!
//! * This module does not reproject between CRSs.

// External dependencies
use std::fmt;
use std::ops::Mul;

// ============================================================================
// Affine Transform
// ============================================================================

/// Pixel → coordinate affine map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    /// x scale per column.
    pub a: f64,
    /// x shear per row.
    pub b: f64,
    /// x offset.
    pub c: f64,
    /// y shear per column.
    pub d: f64,
    /// y scale per row.
    pub e: f64,
    /// y offset.
    pub f: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// Identity transform.
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 1.0,
            f: 0.0,
        }
    }

    /// Pure translation.
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self {
            c: tx,
            f: ty,
            ..Self::identity()
        }
    }

    /// Pure axis scale.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            e: sy,
            ..Self::identity()
        }
    }

    /// Map pixel `(col, row)` to `(x, y)`.
    #[inline]
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Whether the transform has no rotation/shear terms.
    pub fn is_axis_aligned(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    /// Inverse transform, or `None` when singular.
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let a = self.e / det;
        let b = -self.b / det;
        let d = -self.d / det;
        let e = self.a / det;
        Some(Self {
            a,
            b,
            c: -(a * self.c + b * self.f),
            d,
            e,
            f: -(d * self.c + e * self.f),
        })
    }

    /// Fractional `(col, row)` of coordinate `(x, y)`.
    ///
    /// Zero-scale axes of an axis-aligned transform resolve to 0.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        if self.is_axis_aligned() {
            let col = if self.a != 0.0 { (x - self.c) / self.a } else { 0.0 };
            let row = if self.e != 0.0 { (y - self.f) / self.e } else { 0.0 };
            return (col, row);
        }
        match self.invert() {
            Some(inv) => inv.apply(x, y),
            None => (0.0, 0.0),
        }
    }

    /// GeoTIFF `ModelTransformationTag` 4×4 row-major matrix.
    pub fn to_model_transformation(&self) -> [f64; 16] {
        [
            self.a, self.b, 0.0, self.c, //
            self.d, self.e, 0.0, self.f, //
            0.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]
    }

    /// Parse a GeoTIFF `ModelTransformationTag` matrix.
    pub fn from_model_transformation(m: &[f64]) -> Option<Self> {
        if m.len() != 16 {
            return None;
        }
        Some(Self {
            a: m[0],
            b: m[1],
            c: m[3],
            d: m[4],
            e: m[5],
            f: m[7],
        })
    }
}

impl Mul for AffineTransform {
    type Output = AffineTransform;

    /// `self * rhs` applies `rhs` first, then `self`.
    fn mul(self, rhs: AffineTransform) -> AffineTransform {
        AffineTransform {
            a: self.a * rhs.a + self.b * rhs.d,
            b: self.a * rhs.b + self.b * rhs.e,
            c: self.a * rhs.c + self.b * rhs.f + self.c,
            d: self.d * rhs.a + self.e * rhs.d,
            e: self.d * rhs.b + self.e * rhs.e,
            f: self.d * rhs.c + self.e * rhs.f + self.f,
        }
    }
}

// ============================================================================
// CRS
// ============================================================================

/// Coordinate reference system identifier, e.g. `EPSG:2272`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs(String);

impl Crs {
    /// Wrap an identifier, trimming surrounding whitespace.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// EPSG code when the identifier has the form `EPSG:<code>`.
    pub fn epsg(&self) -> Option<u32> {
        let (authority, code) = self.0.split_once(':')?;
        if !authority.trim().eq_ignore_ascii_case("epsg") {
            return None;
        }
        code.trim().parse().ok()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Crs {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Crs {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
