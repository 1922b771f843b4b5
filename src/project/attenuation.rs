// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Deciding which photons survive to be detected.

Two independent filters may apply to projected photons: absorption along the
line of sight (e.g. by the Galaxy) and the energy-dependent effective area of
a detector. Each produces a mask of survivors using its own random draws;
a photon is detected only if it survives both.
 */

use std::fmt::Debug;

use log::trace;
use rand::{Rng, RngCore};

use super::AttenuationError;

/// A curve sampled on an increasing grid, linearly interpolated between
/// samples and zero outside them.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedCurve {
    x: Vec<f64>,
    y: Vec<f64>,
    max: f64,
}

impl TabulatedCurve {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<TabulatedCurve, AttenuationError> {
        if x.is_empty() {
            return Err(AttenuationError::InvalidCurve("there are no samples"));
        }
        if x.len() != y.len() {
            return Err(AttenuationError::InvalidCurve(
                "the grid and the values have different lengths",
            ));
        }
        if x.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(AttenuationError::InvalidCurve(
                "the grid must be strictly increasing",
            ));
        }
        if y.iter().any(|v| !(*v >= 0.0 && v.is_finite())) {
            return Err(AttenuationError::InvalidCurve(
                "values must be non-negative and finite",
            ));
        }
        let max = y.iter().copied().fold(0.0, f64::max);
        Ok(TabulatedCurve { x, y, max })
    }

    pub fn grid(&self) -> &[f64] {
        &self.x
    }

    pub fn values(&self) -> &[f64] {
        &self.y
    }

    /// The largest value of the curve.
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn interpolate(&self, x: f64) -> f64 {
        let n = self.x.len();
        if !(x >= self.x[0] && x <= self.x[n - 1]) {
            return 0.0;
        }
        // The first grid point strictly above x.
        let i = self.x.partition_point(|&g| g <= x);
        if i == n {
            return self.y[n - 1];
        }
        let (x0, x1) = (self.x[i - 1], self.x[i]);
        let (y0, y1) = (self.y[i - 1], self.y[i]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    /// Keep each of `x` with probability `interpolate(x) / max()`.
    fn accept<R: Rng + ?Sized>(&self, x: &[f64], rng: &mut R) -> Vec<bool> {
        x.iter()
            .map(|&x| self.max * rng.gen::<f64>() < self.interpolate(x))
            .collect()
    }
}

/// An energy-dependent absorption model. The curve it prepares is
/// proportional to the probability that a photon of that energy gets through.
/// Only the curve's shape matters; photons are kept with probability
/// `curve(E) / max(curve)`.
pub trait AbsorptionModel: Debug + Send + Sync {
    /// Acquire the absorption curve.
    fn prepare(&self) -> Result<TabulatedCurve, AttenuationError>;

    /// Release anything acquired by [`AbsorptionModel::prepare`].
    fn cleanup(&self) {}
}

/// An absorption curve read from a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableAbsorption {
    pub name: String,
    curve: TabulatedCurve,
}

impl TableAbsorption {
    pub fn new(name: String, curve: TabulatedCurve) -> TableAbsorption {
        TableAbsorption { name, curve }
    }
}

impl AbsorptionModel for TableAbsorption {
    fn prepare(&self) -> Result<TabulatedCurve, AttenuationError> {
        Ok(self.curve.clone())
    }
}

/// Decide which photons with `energies` \[keV\] make it through `model`.
/// [`AbsorptionModel::cleanup`] is called however this returns.
pub fn absorb<R: Rng + ?Sized>(
    model: &dyn AbsorptionModel,
    energies: &[f64],
    rng: &mut R,
) -> Result<Vec<bool>, AttenuationError> {
    let model = scopeguard::guard(model, |model| {
        trace!("Cleaning up the absorption model");
        model.cleanup()
    });
    let curve = model.prepare()?;
    Ok(curve.accept(energies, rng))
}

/// A detector's collecting area as a function of energy.
pub trait EffectiveArea: Debug + Send + Sync {
    /// A name to identify the response by, e.g. its file name.
    fn name(&self) -> &str;

    /// The largest effective area \[cm²\].
    fn max_area(&self) -> f64;

    /// Decide which photons with `energies` \[keV\] are detected. A photon at
    /// an energy with the maximum area is always detected.
    fn detect(&self, energies: &[f64], rng: &mut dyn RngCore) -> Vec<bool>;

    /// The name of a response matrix associated with this effective area.
    fn rmf(&self) -> Option<&str> {
        None
    }
}

/// An ancillary response: effective area tabulated in energy bins.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryResponse {
    name: String,
    /// Effective area \[cm²\] against bin-centre energy \[keV\].
    curve: TabulatedCurve,
    rmf: Option<String>,
}

impl AuxiliaryResponse {
    /// Make a response from the energy bounds \[keV\] and effective areas
    /// \[cm²\] of each bin.
    pub fn new(
        name: String,
        energy_lo: &[f64],
        energy_hi: &[f64],
        areas: Vec<f64>,
        rmf: Option<String>,
    ) -> Result<AuxiliaryResponse, AttenuationError> {
        if energy_lo.len() != energy_hi.len() {
            return Err(AttenuationError::InvalidCurve(
                "the lower and upper bin energies have different lengths",
            ));
        }
        let mid = energy_lo
            .iter()
            .zip(energy_hi)
            .map(|(lo, hi)| 0.5 * (lo + hi))
            .collect();
        let curve = TabulatedCurve::new(mid, areas)?;
        if curve.max() <= 0.0 {
            return Err(AttenuationError::NoArea { name });
        }
        Ok(AuxiliaryResponse { name, curve, rmf })
    }

    pub fn curve(&self) -> &TabulatedCurve {
        &self.curve
    }
}

impl EffectiveArea for AuxiliaryResponse {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_area(&self) -> f64 {
        self.curve.max()
    }

    fn detect(&self, energies: &[f64], rng: &mut dyn RngCore) -> Vec<bool> {
        self.curve.accept(energies, rng)
    }

    fn rmf(&self) -> Option<&str> {
        self.rmf.as_deref()
    }
}
