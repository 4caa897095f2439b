pub mod clerk_service;
pub mod cloudinary_service;
pub mod image_service;
pub mod user_service;
pub mod webhook_service;

pub use clerk_service::ClerkClient;
pub use cloudinary_service::CloudinaryClient;
pub use image_service::*;
pub use user_service::*;
pub use webhook_service::*;
