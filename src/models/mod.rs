pub mod response;
pub mod token;
pub mod user;

pub use response::ApiResponse;
pub use token::TokenRecord;
pub use user::{NewUser, Role, User, UserProfile, UserSummary};
