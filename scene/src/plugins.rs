pub mod core;
pub mod simulation;
