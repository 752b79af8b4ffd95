#[cfg(test)]
pub(crate) mod support {
    use crate::auth::jwt_service::*;
    use futures::future::BoxFuture;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Revocation store kept in process memory.
    #[derive(Default)]
    pub struct MemoryRevocationStore {
        revoked: Mutex<HashSet<String>>,
    }

    impl RevocationStore for MemoryRevocationStore {
        fn revoke<'a>(
            &'a self,
            jti: &'a str,
            _ttl_secs: u64,
        ) -> BoxFuture<'a, Result<(), JwtError>> {
            Box::pin(async move {
                self.revoked
                    .lock()
                    .map_err(|e| JwtError::Revocation(e.to_string()))?
                    .insert(jti.to_string());
                Ok(())
            })
        }

        fn is_revoked<'a>(&'a self, jti: &'a str) -> BoxFuture<'a, Result<bool, JwtError>> {
            Box::pin(async move {
                Ok(self
                    .revoked
                    .lock()
                    .map_err(|e| JwtError::Revocation(e.to_string()))?
                    .contains(jti))
            })
        }
    }

    pub fn test_jwt_service() -> JwtService {
        let config = JwtConfig {
            secret_key: "test_secret_key_for_integration_testing_12345".to_string(),
            ..JwtConfig::default()
        };
        JwtService::new(config, Arc::new(MemoryRevocationStore::default()))
    }
}

#[cfg(test)]
mod integration_tests {
    use super::support::test_jwt_service;
    use crate::auth::jwt_service::*;
    use crate::models::user::Role;
    use chrono::Duration;
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn test_token_type_serialization() {
        assert_eq!(serde_json::to_string(&TokenType::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenType::Refresh).unwrap(), "\"refresh\"");
    }

    #[test]
    fn test_generate_token_pair() {
        let service = test_jwt_service();
        let pair = service.generate_token_pair(Uuid::new_v4(), Role::Coach).unwrap();

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 15 * 60);
    }

    #[test]
    fn test_decode_round_trip_claims() {
        let service = test_jwt_service();
        let user_id = Uuid::new_v4();
        let pair = service.generate_token_pair(user_id, Role::Parent).unwrap();

        let claims = service.decode_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role, Role::Parent);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.iss, "academy-backend");
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_access() {
        let service = test_jwt_service();
        let pair = service.generate_token_pair(Uuid::new_v4(), Role::Player).unwrap();

        let result = service
            .validate_token(&pair.refresh_token, TokenType::Access)
            .await;
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_refresh_token_is_single_use() {
        let service = test_jwt_service();
        let user_id = Uuid::new_v4();
        let pair = service.generate_token_pair(user_id, Role::Coach).unwrap();

        let claims = service.redeem_refresh_token(&pair.refresh_token).await.unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);

        let replay = service.redeem_refresh_token(&pair.refresh_token).await;
        assert!(matches!(replay, Err(JwtError::TokenRevoked)));
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let service = test_jwt_service();
        let user_id = Uuid::new_v4();
        let pair = service.generate_token_pair(user_id, Role::Parent).unwrap();

        service.revoke_token(&pair.access_token).await.unwrap();
        service
            .revoke_refresh_token(&pair.refresh_token, user_id)
            .await
            .unwrap();

        let after_logout = service.redeem_refresh_token(&pair.refresh_token).await;
        assert!(matches!(after_logout, Err(JwtError::TokenRevoked)));
    }

    #[tokio::test]
    async fn test_logout_rejects_foreign_or_access_token() {
        let service = test_jwt_service();
        let owner = Uuid::new_v4();
        let pair = service.generate_token_pair(owner, Role::Player).unwrap();

        let foreign = service
            .revoke_refresh_token(&pair.refresh_token, Uuid::new_v4())
            .await;
        assert!(matches!(foreign, Err(JwtError::InvalidToken)));

        let wrong_type = service.revoke_refresh_token(&pair.access_token, owner).await;
        assert!(matches!(wrong_type, Err(JwtError::InvalidToken)));

        // neither call revoked the real refresh token
        assert!(service.redeem_refresh_token(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoked_access_token_rejected() {
        let service = test_jwt_service();
        let pair = service.generate_token_pair(Uuid::new_v4(), Role::Admin).unwrap();

        service.revoke_token(&pair.access_token).await.unwrap();

        let result = service
            .validate_token(&pair.access_token, TokenType::Access)
            .await;
        assert!(matches!(result, Err(JwtError::TokenRevoked)));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let service = test_jwt_service();
        let other = JwtService::new(
            JwtConfig {
                secret_key: "another_secret".to_string(),
                ..JwtConfig::default()
            },
            Arc::new(super::support::MemoryRevocationStore::default()),
        );
        let pair = other.generate_token_pair(Uuid::new_v4(), Role::Admin).unwrap();

        assert!(matches!(
            service.decode_token(&pair.access_token),
            Err(JwtError::TokenValidation(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new(
            JwtConfig {
                secret_key: "expiry_secret".to_string(),
                access_token_expiry: Duration::minutes(-5),
                ..JwtConfig::default()
            },
            Arc::new(super::support::MemoryRevocationStore::default()),
        );
        let pair = service.generate_token_pair(Uuid::new_v4(), Role::Coach).unwrap();

        assert!(matches!(
            service.decode_token(&pair.access_token),
            Err(JwtError::TokenExpired)
        ));
    }
}
