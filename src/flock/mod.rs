pub mod boid;
pub mod config;
pub mod constants;
pub mod perception;
pub mod registry;
pub mod spawner;
