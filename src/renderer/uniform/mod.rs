pub mod global;
pub mod instance;
pub mod joint;
pub mod material;
