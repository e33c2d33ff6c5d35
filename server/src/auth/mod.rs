pub mod error;
pub mod gate;
pub mod login;
pub mod logout;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use gate::{AdminGateLayer, AdminGateService};
pub use login::{authenticate, handle_login};
pub use logout::handle_logout;
pub use password::{hash_password, verify_password};
pub use token::{TOKEN_TTL, TokenCodec, TokenError, TokenSubject};
