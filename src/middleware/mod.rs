pub mod auth;
pub mod extract;
pub mod response;

pub use auth::AuthMember;
pub use extract::{ValidJson, ValidPath, ValidQuery};
pub use response::{ApiResponse, ApiResult};
