pub mod jwt_service;
pub mod middleware;
#[cfg(test)]
pub(crate) mod jwt_service_test;

pub use jwt_service::{
    Claims, JwtConfig, JwtError, JwtService, RedisRevocationStore, RevocationStore, TokenPair,
    TokenType,
};
pub use middleware::{AuthMiddleware, AuthUser, ClaimsExt};
