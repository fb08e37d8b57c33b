pub mod config;
pub mod frame;
pub mod gpu;
pub mod gui;
pub mod perf;
pub mod renderer;
pub mod world;
