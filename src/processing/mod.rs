pub mod canvas;
pub mod filters;
pub mod geometry;
pub mod render;
pub mod sharpness;
pub mod text;
