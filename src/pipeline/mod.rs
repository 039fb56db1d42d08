pub mod classify;
pub mod cluster;
pub mod confidence;
pub mod detect;
pub mod dominant;
pub mod sample;
