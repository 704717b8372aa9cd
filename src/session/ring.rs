//! Ring layout ownership and rotation animation
//!
//! The ring is a bijection from the four positions to the four symbols. Only
//! this module mutates it, and only at two instants: the mid-flight swap point
//! and animation completion. Input resolution and rendering read the committed
//! layout; the interpolated rotation angle is presentation-only.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ease_out_cubic;

use super::state::{RingPosition, Symbol};

/// Position -> symbol bijection, indexed by [`RingPosition::index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingLayout {
    symbols: [Symbol; 4],
}

impl Default for RingLayout {
    fn default() -> Self {
        Self {
            symbols: Symbol::ALL,
        }
    }
}

impl RingLayout {
    pub fn symbol_at(&self, pos: RingPosition) -> Symbol {
        self.symbols[pos.index()]
    }

    /// Inverse lookup; total because the layout is a bijection
    pub fn position_of(&self, symbol: Symbol) -> RingPosition {
        for pos in RingPosition::ALL {
            if self.symbols[pos.index()] == symbol {
                return pos;
            }
        }
        unreachable!("ring layout holds every symbol exactly once")
    }

    /// Uniform random permutation of the symbols over the positions
    pub fn shuffled<R: Rng>(rng: &mut R) -> Self {
        let mut symbols = Symbol::ALL;
        symbols.shuffle(rng);
        Self { symbols }
    }
}

/// Rotation animation parameters, owned by configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationParams {
    /// Wall-clock length of the spin (seconds); also the pause window length
    pub duration: f64,
    /// Full revolutions of the visual spin
    pub spins: f64,
    /// Fraction of raw elapsed time at which the layout swap commits
    pub swap_fraction: f64,
}

/// In-flight rotation state
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RotationAnim {
    t0: f64,
    params: RotationParams,
    to_layout: RingLayout,
    swapped: bool,
}

/// What one `update` call observed
#[derive(Debug, Clone, Copy, Default)]
pub struct RingUpdate {
    /// Interpolated spin angle in degrees, presentation only
    pub angle_deg: f64,
    /// The authoritative layout swapped during this call
    pub just_swapped: bool,
    /// The rotation finished during this call
    pub just_finished: bool,
}

/// Owns the ring layout and sequences rotations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RingController {
    layout: RingLayout,
    anim: Option<RotationAnim>,
    /// A request made while an animation window was busy; last write wins
    pending: Option<RotationParams>,
}

impl RingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed layout. Never reflects a mid-rotation interpolation.
    pub fn layout(&self) -> &RingLayout {
        &self.layout
    }

    pub fn is_rotating(&self) -> bool {
        self.anim.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Sample a permutation that differs from the current layout in at least
    /// one position. 23 of the 24 permutations qualify, so the rejection loop
    /// exits almost immediately.
    pub fn pick_new_layout<R: Rng>(&self, rng: &mut R) -> RingLayout {
        loop {
            let candidate = RingLayout::shuffled(rng);
            if candidate != self.layout {
                return candidate;
            }
        }
    }

    /// Start a rotation, or queue it while `blocked` (a banner or another
    /// pause window is showing). A newer request overwrites a queued one.
    pub fn request_rotation<R: Rng>(
        &mut self,
        now: f64,
        params: RotationParams,
        blocked: bool,
        rng: &mut R,
    ) {
        if blocked || self.anim.is_some() {
            self.pending = Some(params);
        } else {
            self.begin(now, params, rng);
        }
    }

    /// Promote a queued request once the blocking window has cleared
    pub fn start_pending<R: Rng>(&mut self, now: f64, rng: &mut R) -> Option<RotationParams> {
        let params = self.pending.take()?;
        self.begin(now, params, rng);
        Some(params)
    }

    fn begin<R: Rng>(&mut self, now: f64, params: RotationParams, rng: &mut R) {
        let to_layout = self.pick_new_layout(rng);
        log::debug!("ring rotation started ({}s)", params.duration);
        self.anim = Some(RotationAnim {
            t0: now,
            params,
            to_layout,
            swapped: false,
        });
    }

    /// Advance the animation. The swap commits at `swap_fraction` of raw
    /// elapsed time, not eased progress, so it lands mid-spin rather than at
    /// the visual midpoint.
    pub fn update(&mut self, now: f64) -> RingUpdate {
        let Some(anim) = &mut self.anim else {
            return RingUpdate::default();
        };

        let elapsed = now - anim.t0;
        let raw = (elapsed / anim.params.duration).clamp(0.0, 1.0);

        let mut out = RingUpdate::default();
        if !anim.swapped && raw >= anim.params.swap_fraction {
            self.layout = anim.to_layout;
            anim.swapped = true;
            out.just_swapped = true;
        }

        if elapsed >= anim.params.duration {
            self.layout = anim.to_layout;
            self.anim = None;
            out.just_finished = true;
            return out;
        }

        out.angle_deg = ease_out_cubic(raw) * anim.params.spins * 360.0;
        out
    }
}
