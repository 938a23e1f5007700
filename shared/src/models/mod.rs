//! Domain models for the BASP marketplace

mod business;
mod communication;
mod promotion;
mod review;
mod service_category;
mod user;

pub use business::*;
pub use communication::*;
pub use promotion::*;
pub use review::*;
pub use service_category::*;
pub use user::*;
