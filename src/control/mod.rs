pub mod configuration;
pub mod mission;
pub mod trim;
