// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Handle (right ascension, declination) coordinates.
 */

use serde::{Deserialize, Serialize};

/// A struct containing a Right Ascension and Declination. All units are in
/// radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RADec {
    /// Right ascension \[radians\]
    pub ra: f64,
    /// Declination \[radians\]
    pub dec: f64,
}

impl RADec {
    /// Make a new `RADec` struct from values in radians.
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    /// Make a new `RADec` struct from values in degrees.
    pub fn from_degrees(ra: f64, dec: f64) -> Self {
        Self::new(ra.to_radians(), dec.to_radians())
    }

    /// Get the (RA, Dec) in degrees. RA is wrapped into [0, 360).
    pub fn to_degrees(self) -> (f64, f64) {
        (self.ra.to_degrees().rem_euclid(360.0), self.dec.to_degrees())
    }

    /// Deproject standard (tangent-plane) coordinates back onto the sphere.
    /// `xi` increases towards the east (increasing RA) and `eta` towards the
    /// north, both in radians, with the plane touching the sphere at
    /// `centre`.
    ///
    /// This is the inverse gnomonic projection, i.e. the "TAN" projection of
    /// FITS world coordinate systems.
    pub fn from_tangent_plane(xi: f64, eta: f64, centre: RADec) -> Self {
        let (s_dec0, c_dec0) = centre.dec.sin_cos();
        let denom = c_dec0 - eta * s_dec0;
        let ra = centre.ra + xi.atan2(denom);
        let dec = ((s_dec0 + eta * c_dec0) / (1.0 + xi * xi + eta * eta).sqrt()).asin();
        Self {
            ra: ra.rem_euclid(std::f64::consts::TAU),
            dec,
        }
    }

    /// Project these coordinates onto the plane tangent to the sphere at
    /// `centre`. Returns `None` for coordinates on the far hemisphere.
    pub fn to_tangent_plane(self, centre: RADec) -> Option<(f64, f64)> {
        let d_ra = self.ra - centre.ra;
        let (s_d_ra, c_d_ra) = d_ra.sin_cos();
        let (s_dec, c_dec) = self.dec.sin_cos();
        let (s_dec0, c_dec0) = centre.dec.sin_cos();
        let cos_c = s_dec0 * s_dec + c_dec0 * c_dec * c_d_ra;
        if cos_c <= 0.0 {
            return None;
        }
        let xi = c_dec * s_d_ra / cos_c;
        let eta = (c_dec0 * s_dec - s_dec0 * c_dec * c_d_ra) / cos_c;
        Some((xi, eta))
    }
}

impl std::fmt::Display for RADec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (ra, dec) = self.to_degrees();
        write!(f, "({ra}°, {dec}°)")
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_tangent_plane_origin_is_centre() {
        let centre = RADec::from_degrees(30.0, 45.0);
        let radec = RADec::from_tangent_plane(0.0, 0.0, centre);
        assert_abs_diff_eq!(radec.ra, centre.ra, epsilon = 1e-12);
        assert_abs_diff_eq!(radec.dec, centre.dec, epsilon = 1e-12);
    }

    #[test]
    fn test_tangent_plane_inverts() {
        let centre = RADec::from_degrees(350.0, -27.0);
        let radec = RADec::from_degrees(1.5, -25.5);
        let (xi, eta) = radec.to_tangent_plane(centre).unwrap();
        // Wrapping past RA = 0 means east is positive.
        assert!(xi > 0.0);
        assert!(eta > 0.0);
        let back = RADec::from_tangent_plane(xi, eta, centre);
        assert_abs_diff_eq!(back.ra, radec.ra, epsilon = 1e-12);
        assert_abs_diff_eq!(back.dec, radec.dec, epsilon = 1e-12);
    }

    #[test]
    fn test_small_offsets_are_angular() {
        // On the equator, a small eta is the declination offset.
        let centre = RADec::from_degrees(10.0, 0.0);
        let radec = RADec::from_tangent_plane(0.0, 1e-4, centre);
        assert_abs_diff_eq!(radec.dec, 1e-4, epsilon = 1e-12);
        assert_abs_diff_eq!(radec.ra, centre.ra, epsilon = 1e-12);
    }

    #[test]
    fn test_far_side_is_none() {
        let centre = RADec::from_degrees(0.0, 0.0);
        assert!(RADec::from_degrees(180.0, 0.0)
            .to_tangent_plane(centre)
            .is_none());
    }
}
