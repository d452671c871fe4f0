mod jwt;
mod middleware;
mod password;

pub use jwt::{AccessTokenDetails, JwtError, JwtService};
pub use middleware::{MaybeSession, RequestContext, RequireSession, load_session};
pub use password::{PasswordError, hash_password, verify_password};
