//! Business logic services for the BASP marketplace

pub mod auth;
pub mod business;
pub mod communication;
pub mod promotion;
pub mod review;
pub mod service_category;
pub mod user;

pub use auth::AuthService;
pub use business::BusinessService;
pub use communication::CommunicationService;
pub use promotion::PromotionService;
pub use review::ReviewService;
pub use service_category::ServiceCategoryService;
pub use user::UserService;
