pub mod directory;
pub mod json_error;
pub mod jwt;
pub mod login;
pub mod server_config;
pub mod user;

pub use self::directory::Collection;
pub use self::json_error::ErrorResponse;
pub use self::jwt::JwtClaims;
pub use self::login::{LoginData, LoginResponse};
pub use self::user::{Role, UnknownRole, UserSummary};
