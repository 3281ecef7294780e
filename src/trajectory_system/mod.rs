pub mod assembler;
pub mod dynamics;
pub mod integrator;
pub mod state;
