pub mod handlers;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod role_guard;

pub use identity::{Decoded, IdentityClaim};
pub use jwt::TokenService;
pub use role_guard::{AdminCapability, RoleGuard};
