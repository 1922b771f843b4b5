// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A minimal Friedmann-Lemaître-Robertson-Walker cosmology, used to turn a
//! redshift into an angular-diameter distance.

mod error;

pub use error::CosmologyError;

use serde::{Deserialize, Serialize};

use crate::constants::{COSMOLOGY_INTEGRATION_STEPS, VEL_C_KMS};

/// Cosmological parameters. `hubble_constant` is the dimensionless *h*, i.e.
/// H₀ = 100 *h* km/s/Mpc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cosmology {
    pub hubble_constant: f64,
    pub omega_matter: f64,
    pub omega_lambda: f64,
}

impl Default for Cosmology {
    fn default() -> Self {
        Self {
            hubble_constant: 0.71,
            omega_matter: 0.27,
            omega_lambda: 0.73,
        }
    }
}

impl Cosmology {
    pub fn new(
        hubble_constant: f64,
        omega_matter: f64,
        omega_lambda: f64,
    ) -> Result<Cosmology, CosmologyError> {
        if !(hubble_constant > 0.0 && hubble_constant.is_finite()) {
            return Err(CosmologyError::BadHubbleConstant(hubble_constant));
        }
        Ok(Cosmology {
            hubble_constant,
            omega_matter,
            omega_lambda,
        })
    }

    /// Curvature density parameter Ω_k = 1 − Ω_m − Ω_Λ.
    pub fn omega_curvature(&self) -> f64 {
        1.0 - self.omega_matter - self.omega_lambda
    }

    /// The Hubble distance c/H₀ \[Mpc\].
    pub fn hubble_distance(&self) -> f64 {
        VEL_C_KMS / (100.0 * self.hubble_constant)
    }

    /// E(z) = H(z) / H₀.
    fn efunc(&self, z: f64) -> f64 {
        let zp1 = 1.0 + z;
        (self.omega_matter * zp1.powi(3)
            + self.omega_curvature() * zp1 * zp1
            + self.omega_lambda)
            .sqrt()
    }

    /// Line-of-sight comoving distance \[Mpc\].
    pub fn comoving_distance(&self, z: f64) -> Result<f64, CosmologyError> {
        check_redshift(z)?;
        if z == 0.0 {
            return Ok(0.0);
        }

        // Composite Simpson's rule over 1/E(z).
        let n = COSMOLOGY_INTEGRATION_STEPS;
        let h = z / n as f64;
        let mut sum = 1.0 / self.efunc(0.0) + 1.0 / self.efunc(z);
        for i in 1..n {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight / self.efunc(i as f64 * h);
        }
        Ok(self.hubble_distance() * sum * h / 3.0)
    }

    /// Transverse comoving distance \[Mpc\], accounting for the curvature of
    /// open and closed universes.
    pub fn transverse_comoving_distance(&self, z: f64) -> Result<f64, CosmologyError> {
        let dc = self.comoving_distance(z)?;
        let ok = self.omega_curvature();
        let dh = self.hubble_distance();
        let dm = if ok.abs() < 1e-10 {
            dc
        } else if ok > 0.0 {
            let sqrt_ok = ok.sqrt();
            dh / sqrt_ok * (sqrt_ok * dc / dh).sinh()
        } else {
            let sqrt_ok = (-ok).sqrt();
            dh / sqrt_ok * (sqrt_ok * dc / dh).sin()
        };
        Ok(dm)
    }

    /// Angular-diameter distance \[Mpc\].
    pub fn angular_diameter_distance(&self, z: f64) -> Result<f64, CosmologyError> {
        Ok(self.transverse_comoving_distance(z)? / (1.0 + z))
    }
}

fn check_redshift(z: f64) -> Result<(), CosmologyError> {
    if z >= 0.0 && z.is_finite() {
        Ok(())
    } else {
        Err(CosmologyError::BadRedshift(z))
    }
}
