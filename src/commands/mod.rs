pub mod check;
pub mod relative;
pub mod render;
