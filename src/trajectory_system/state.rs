//! The 27-slot state vector handed to the equations of motion.
//!
//! Nine 3-slot blocks in fixed order. Scalars (ballast mass, pitch
//! reference) occupy the first slot of their block.

use std::ops::Range;

use crate::constants::{BLOCK_SIZE, STATE_DIM};
use crate::control::configuration::GliderConfig;
use crate::control::trim::TrimState;
use crate::utils::vector3d::Vector3D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBlock {
    Position,
    Orientation,
    Velocity,
    MovableMass,
    BallastOffset,
    AngularVelocity,
    AngularMomentum,
    BallastMass,
    PitchReference,
}

impl StateBlock {
    pub const ALL: [StateBlock; 9] = [
        StateBlock::Position,
        StateBlock::Orientation,
        StateBlock::Velocity,
        StateBlock::MovableMass,
        StateBlock::BallastOffset,
        StateBlock::AngularVelocity,
        StateBlock::AngularMomentum,
        StateBlock::BallastMass,
        StateBlock::PitchReference,
    ];

    /// Blocks rewritten when the vehicle re-trims between phases.
    pub const RETRIM: [StateBlock; 3] = [
        StateBlock::MovableMass,
        StateBlock::BallastOffset,
        StateBlock::BallastMass,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn range(self) -> Range<usize> {
        let start = self.index() * BLOCK_SIZE;
        start..start + BLOCK_SIZE
    }

    pub fn label(self) -> &'static str {
        match self {
            StateBlock::Position => "position",
            StateBlock::Orientation => "orientation",
            StateBlock::Velocity => "velocity",
            StateBlock::MovableMass => "movable_mass",
            StateBlock::BallastOffset => "ballast_offset",
            StateBlock::AngularVelocity => "angular_velocity",
            StateBlock::AngularMomentum => "angular_momentum",
            StateBlock::BallastMass => "ballast_mass",
            StateBlock::PitchReference => "pitch_reference",
        }
    }

    pub fn of_slot(slot: usize) -> Option<StateBlock> {
        StateBlock::ALL.get(slot / BLOCK_SIZE).copied()
    }

    pub fn carries_over(self) -> bool {
        !StateBlock::RETRIM.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GliderState {
    values: [f64; STATE_DIM],
}

impl Default for GliderState {
    fn default() -> Self {
        GliderState::zeros()
    }
}

impl GliderState {
    pub fn zeros() -> Self {
        GliderState {
            values: [0.0; STATE_DIM],
        }
    }

    pub fn from_array(values: [f64; STATE_DIM]) -> Self {
        GliderState { values }
    }

    pub fn as_array(&self) -> &[f64; STATE_DIM] {
        &self.values
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn block(&self, block: StateBlock) -> Vector3D {
        Vector3D::from_slice(&self.values[block.range()])
    }

    pub fn set_block(&mut self, block: StateBlock, value: Vector3D) {
        self.values[block.range()].copy_from_slice(&value.to_array());
    }

    pub fn with_block(mut self, block: StateBlock, value: Vector3D) -> Self {
        self.set_block(block, value);
        self
    }

    pub fn position(&self) -> Vector3D {
        self.block(StateBlock::Position)
    }

    pub fn orientation(&self) -> Vector3D {
        self.block(StateBlock::Orientation)
    }

    pub fn velocity(&self) -> Vector3D {
        self.block(StateBlock::Velocity)
    }

    pub fn angular_velocity(&self) -> Vector3D {
        self.block(StateBlock::AngularVelocity)
    }

    /// Depth below the start point (z is positive down).
    pub fn depth(&self) -> f64 {
        self.values[StateBlock::Position.range().start + 2]
    }

    pub fn ballast_mass(&self) -> f64 {
        self.values[StateBlock::BallastMass.range().start]
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// First non-finite slot, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values.iter().position(|v| !v.is_finite())
    }

    /// Phase-0 state: vehicle at the origin in trim, level except for the
    /// initial pitch.
    pub fn at_rest(config: &GliderConfig, trim: &TrimState) -> Self {
        let theta0 = config.initial_attitude().y;

        GliderState::zeros()
            .with_block(StateBlock::Orientation, Vector3D::new(0.0, theta0, 0.0))
            .with_block(
                StateBlock::Velocity,
                Vector3D::new(trim.v_forward, 0.0, trim.v_vertical),
            )
            .with_block(StateBlock::PitchReference, Vector3D::new(theta0, 0.0, 0.0))
            .apply_trim_overrides(config, trim)
    }

    /// Copy of `self` with the internal masses and the ballast moved to the
    /// new phase's trim. Every other block carries over unchanged.
    pub fn apply_trim_overrides(&self, config: &GliderConfig, trim: &TrimState) -> Self {
        self.with_block(StateBlock::MovableMass, movable_mass_trim(config, trim))
            .with_block(StateBlock::BallastOffset, ballast_offset_trim(config))
            .with_block(
                StateBlock::BallastMass,
                Vector3D::new(trim.ballast_mass, 0.0, 0.0),
            )
    }

    // Linear combination used by the integrator stages.
    pub(crate) fn axpy(&self, scale: f64, other: &GliderState) -> GliderState {
        let mut values = self.values;
        for (v, o) in values.iter_mut().zip(other.values.iter()) {
            *v += scale * o;
        }
        GliderState { values }
    }
}

fn movable_mass_trim(config: &GliderConfig, trim: &TrimState) -> Vector3D {
    Vector3D::new(trim.movable_mass_offset, 0.0, config.geometry.rp3)
}

fn ballast_offset_trim(config: &GliderConfig) -> Vector3D {
    Vector3D::new(config.geometry.rb1, 0.0, config.geometry.rb3)
}
