// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Use the "built" crate to generate some useful build-time information,
// including the compiler version and the build time.
fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");
}
