//! Volume mixer
//!
//! Splits the master volume between the primary content signal and the
//! background noise track. The state is an immutable value recomputed
//! whole by a pure function, so a reader can never observe player and
//! noise volumes derived from different master snapshots.

/// Effective volume levels derived from the two user-controlled inputs.
///
/// Invariant: `player_volume + noise_volume == master` (within
/// floating-point tolerance).
///
/// Inputs are expected in [0, 100]; clamping is the caller's contract,
/// not performed here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeState {
    /// Master volume, 0-100, user controlled
    pub master: f64,
    /// Fraction of master allocated to the noise track, 0-100
    pub noise_fraction: f64,
    /// Derived: volume of the primary content signal
    pub player_volume: f64,
    /// Derived: volume of the background noise track
    pub noise_volume: f64,
}

impl VolumeState {
    /// Recompute both derived outputs from the two inputs
    pub fn mix(master: f64, noise_fraction: f64) -> Self {
        let noise_volume = master * (noise_fraction / 100.0);
        Self {
            master,
            noise_fraction,
            player_volume: master - noise_volume,
            noise_volume,
        }
    }

    /// New state with a changed master volume, same noise fraction
    pub fn with_master(self, master: f64) -> Self {
        Self::mix(master, self.noise_fraction)
    }

    /// New state with a changed noise fraction, same master volume
    pub fn with_noise_fraction(self, noise_fraction: f64) -> Self {
        Self::mix(self.master, noise_fraction)
    }
}

impl Default for VolumeState {
    fn default() -> Self {
        Self::mix(100.0, 0.0)
    }
}
