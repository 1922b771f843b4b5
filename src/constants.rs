// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. Photon energies are in keV,
lengths of the emitting volume in kpc, distances in Mpc, areas in cm² and
times in seconds unless stated otherwise.
 */

/// Speed of light \[km/s\]
pub const VEL_C_KMS: f64 = 299_792.458;

/// Kiloparsecs in a megaparsec.
pub const KPC_PER_MPC: f64 = 1000.0;

/// Ergs in a keV.
pub const ERG_PER_KEV: f64 = 1.602_176_634e-9;

/// The sky position of projected events when none is given \[degrees\].
pub const DEFAULT_SKY_CENTER_DEG: (f64, f64) = (30.0, 45.0);

/// The number of Simpson intervals used when integrating the comoving
/// distance. Must be even.
pub(crate) const COSMOLOGY_INTEGRATION_STEPS: usize = 2000;
