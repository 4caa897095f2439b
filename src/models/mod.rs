pub mod image;
pub mod transformation;
pub mod user;

pub use image::*;
pub use transformation::*;
pub use user::*;
