pub mod telemetry;
pub mod trim_record;
