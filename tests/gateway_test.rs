mod common;

use chrono::Duration;
use warp::http::HeaderMap;

use common::{bearer, Harness, CACHE_TTL, SECRET};
use rusty_warden::auth::{Access, Claims, DenyReason, FailureClass, RouteRequirement, TokenManager};
use rusty_warden::clock::Clock;

#[tokio::test]
async fn test_public_route_needs_no_token() {
    let harness = Harness::new();

    let access = harness
        .gateway
        .authorize(&HeaderMap::new(), &RouteRequirement::public())
        .await
        .unwrap();
    assert_eq!(access, Access::Public);

    // Defaults-only requirement keeps the route public
    let requirement = RouteRequirement::any_of(["profile:read"]).mark_public();
    let access = harness
        .gateway
        .authorize(&HeaderMap::new(), &requirement)
        .await
        .unwrap();
    assert_eq!(access, Access::Public);
}

#[tokio::test]
async fn test_public_route_ignores_garbage_header() {
    let harness = Harness::new();
    let access = harness
        .gateway
        .authorize(&bearer("not-a-jwt"), &RouteRequirement::public())
        .await
        .unwrap();
    assert_eq!(access, Access::Public);
}

#[tokio::test]
async fn test_public_flag_with_non_default_permission_is_protected() {
    let harness = Harness::new();
    let requirement = RouteRequirement::any_of(["users:delete"]).mark_public();

    let err = harness
        .gateway
        .authorize(&HeaderMap::new(), &requirement)
        .await
        .unwrap_err();
    assert_eq!(err, DenyReason::MissingToken);
}

#[tokio::test]
async fn test_missing_header_on_protected_route() {
    let harness = Harness::new();

    let err = harness
        .gateway
        .authorize(&HeaderMap::new(), &RouteRequirement::authenticated())
        .await
        .unwrap_err();
    assert_eq!(err, DenyReason::MissingToken);
    assert_eq!(err.class(), FailureClass::Unauthenticated);
    assert_eq!(err.class().status_code(), 401);
}

#[tokio::test]
async fn test_malformed_header_is_missing_token() {
    let harness = Harness::new();
    let mut headers = HeaderMap::new();
    headers.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());

    let err = harness
        .gateway
        .authorize(&headers, &RouteRequirement::authenticated())
        .await
        .unwrap_err();
    assert_eq!(err, DenyReason::MissingToken);
}

#[tokio::test]
async fn test_valid_token_attaches_principal() {
    let harness = Harness::new();
    harness.user_with("alice", Some(&["users:read"])).await;
    let token = harness.token_for("alice");

    let access = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::any_of(["users:read"]))
        .await
        .unwrap();

    let principal = access.principal().unwrap();
    assert_eq!(principal.user_id, "alice");
    assert_eq!(principal.role_id, "alice-role");
    assert!(principal.has_permission("users:read"));
}

#[tokio::test]
async fn test_insufficient_permissions() {
    let harness = Harness::new();
    harness.user_with("bob", Some(&["users:read"])).await;
    let token = harness.token_for("bob");

    let err = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::any_of(["users:update"]))
        .await
        .unwrap_err();
    assert_eq!(err, DenyReason::InsufficientPermissions);
    assert_eq!(err.class(), FailureClass::Unauthorized);
    assert_eq!(err.class().status_code(), 403);
}

#[tokio::test]
async fn test_any_of_semantics() {
    let harness = Harness::new();
    harness.user_with("carol", Some(&["roles:read"])).await;
    let token = harness.token_for("carol");

    let access = harness
        .gateway
        .authorize(
            &bearer(&token),
            &RouteRequirement::any_of(["users:read", "roles:read"]),
        )
        .await;
    assert!(access.is_ok());

    // Empty requirement allows any authenticated principal
    let access = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::authenticated())
        .await;
    assert!(access.is_ok());
}

#[tokio::test]
async fn test_superuser_bypass() {
    let harness = Harness::new();
    harness.user_with("root", Some(&["manage:system"])).await;
    let token = harness.token_for("root");

    for required in ["users:delete", "roles:update", "anything:else"] {
        let access = harness
            .gateway
            .authorize(&bearer(&token), &RouteRequirement::any_of([required]))
            .await;
        assert!(access.is_ok(), "superuser denied for {}", required);
    }
}

#[tokio::test]
async fn test_role_without_permissions_inherits_defaults() {
    let harness = Harness::with_defaults(&["profile:read", "dashboard:view"]);
    harness.user_with("dave", None).await;
    let token = harness.token_for("dave");

    let access = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::any_of(["dashboard:view"]))
        .await
        .unwrap();
    assert!(access.principal().unwrap().has_permission("profile:read"));

    let err = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::any_of(["users:read"]))
        .await
        .unwrap_err();
    assert_eq!(err, DenyReason::InsufficientPermissions);
}

#[tokio::test]
async fn test_expiry_instant_is_expired() {
    let harness = Harness::new();
    harness.user_with("erin", Some(&["users:read"])).await;
    let token = harness.token_for("erin");
    let requirement = RouteRequirement::authenticated();

    harness.clock.advance(Duration::seconds(899));
    assert!(harness.gateway.authorize(&bearer(&token), &requirement).await.is_ok());

    harness.clock.advance(Duration::seconds(1));
    let err = harness
        .gateway
        .authorize(&bearer(&token), &requirement)
        .await
        .unwrap_err();
    assert!(matches!(err, DenyReason::InvalidToken(_)));
}

#[tokio::test]
async fn test_authorize_at_uses_given_instant() {
    let harness = Harness::new();
    harness.user_with("frank", None).await;
    let token = harness.token_for("frank");
    let later = harness.clock.now() + Duration::seconds(3600);

    let err = harness
        .gateway
        .authorize_at(&bearer(&token), &RouteRequirement::authenticated(), later)
        .await
        .unwrap_err();
    assert!(matches!(err, DenyReason::InvalidToken(_)));
}

#[tokio::test]
async fn test_foreign_signature_rejected() {
    let harness = Harness::new();
    harness.user_with("gina", None).await;
    let forger = TokenManager::new("Xy7!other-signing-key-material-0987");
    let token = forger
        .issue("gina", None, harness.clock.now())
        .unwrap()
        .token;

    let err = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::authenticated())
        .await
        .unwrap_err();
    assert!(matches!(err, DenyReason::InvalidToken(_)));
}

#[tokio::test]
async fn test_revoked_token_denied() {
    let harness = Harness::new();
    harness.user_with("hank", Some(&["manage:system"])).await;
    let token = harness.token_for("hank");
    let requirement = RouteRequirement::authenticated();

    assert!(harness.gateway.authorize(&bearer(&token), &requirement).await.is_ok());
    assert!(harness.gateway.revoke_token(&token).await.unwrap());

    let err = harness
        .gateway
        .authorize(&bearer(&token), &requirement)
        .await
        .unwrap_err();
    assert_eq!(err, DenyReason::TokenRevoked);
    assert_eq!(err.class(), FailureClass::Unauthenticated);
}

#[tokio::test]
async fn test_revocation_checked_before_signature() {
    let harness = Harness::new();
    let claims = Claims::new("ghost", None, harness.clock.now(), Duration::seconds(60));
    let foreign = TokenManager::new("Xy7!other-signing-key-material-0987")
        .generate_token(&claims)
        .unwrap();

    // A blacklisted token reports revocation even when the signature is bad
    harness
        .gateway
        .revocation()
        .revoke(&foreign, &claims, harness.clock.now())
        .await
        .unwrap();

    let err = harness
        .gateway
        .authorize(&bearer(&foreign), &RouteRequirement::authenticated())
        .await
        .unwrap_err();
    assert_eq!(err, DenyReason::TokenRevoked);
}

#[tokio::test]
async fn test_expired_token_invalid_regardless_of_revocation() {
    let harness = Harness::new();
    harness.user_with("ivy", None).await;
    let token = harness.token_for("ivy");

    harness.clock.advance(Duration::seconds(300));
    assert!(harness.gateway.revoke_token(&token).await.unwrap());
    assert_eq!(
        harness
            .gateway
            .authorize(&bearer(&token), &RouteRequirement::authenticated())
            .await
            .unwrap_err(),
        DenyReason::TokenRevoked
    );

    // The blacklist record lapses with the token, expiry still rejects it
    harness.clock.advance(Duration::seconds(600));
    let err = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::authenticated())
        .await
        .unwrap_err();
    assert!(matches!(err, DenyReason::InvalidToken(_)));
}

#[tokio::test]
async fn test_huge_cache_ttl_does_not_panic() {
    let harness = Harness::with_cache_ttl(
        &["profile:read"],
        std::time::Duration::from_secs(10_000_000_000_000),
    );
    harness.user_with("kim", None).await;
    let token = harness.token_for("kim");

    let access = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::authenticated())
        .await;
    assert!(access.is_ok());

    let tokens = TokenManager::new(SECRET)
        .with_access_token_ttl(std::time::Duration::from_secs(100_000_000_000_000_000));
    assert!(tokens.issue("kim", None, harness.clock.now()).is_ok());
}

#[tokio::test]
async fn test_revocation_store_outage_fails_closed() {
    let harness = Harness::new();
    harness.user_with("jack", Some(&["manage:system"])).await;
    let token = harness.token_for("jack");
    harness.revocations.set_failing(true);

    let err = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::authenticated())
        .await
        .unwrap_err();
    assert!(matches!(err, DenyReason::StoreUnavailable(_)));
    assert_eq!(err.class(), FailureClass::Unauthenticated);

    harness.revocations.set_failing(false);
    assert!(harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::authenticated())
        .await
        .is_ok());
}

#[tokio::test]
async fn test_identity_store_outage_fails_closed() {
    let harness = Harness::new();
    harness.user_with("kate", None).await;
    let token = harness.token_for("kate");
    harness.identities.set_failing(true);

    let err = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::authenticated())
        .await
        .unwrap_err();
    assert!(matches!(err, DenyReason::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_unknown_user_or_role() {
    let harness = Harness::new();
    let token = harness.token_for("nobody");

    let err = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::authenticated())
        .await
        .unwrap_err();
    assert!(matches!(err, DenyReason::PrincipalNotFound(_)));

    harness.add_user("orphan", "missing-role").await;
    let token = harness.token_for("orphan");
    let err = harness
        .gateway
        .authorize(&bearer(&token), &RouteRequirement::authenticated())
        .await
        .unwrap_err();
    assert!(matches!(err, DenyReason::PrincipalNotFound(_)));
    assert_eq!(err.class(), FailureClass::Unauthenticated);
}

#[tokio::test]
async fn test_identity_reads_are_cached_for_ttl() {
    let harness = Harness::new();
    harness.user_with("lena", Some(&["users:read"])).await;
    let token = harness.token_for("lena");
    let requirement = RouteRequirement::any_of(["users:read"]);

    assert!(harness.gateway.authorize(&bearer(&token), &requirement).await.is_ok());
    assert_eq!(harness.identities.reads(), (1, 1));

    assert!(harness.gateway.authorize(&bearer(&token), &requirement).await.is_ok());
    assert_eq!(harness.identities.reads(), (1, 1));

    // Token lifetime is shorter than the cache TTL, so issue a fresh one
    harness
        .clock
        .advance(Duration::seconds(CACHE_TTL.as_secs() as i64));
    let token = harness.token_for("lena");
    assert!(harness.gateway.authorize(&bearer(&token), &requirement).await.is_ok());
    assert_eq!(harness.identities.reads(), (2, 2));
}

#[tokio::test]
async fn test_role_edit_visible_after_ttl() {
    let harness = Harness::new();
    harness.user_with("mike", Some(&["users:read"])).await;
    let requirement = RouteRequirement::any_of(["users:update"]);

    let token = harness.token_for("mike");
    assert_eq!(
        harness.gateway.authorize(&bearer(&token), &requirement).await.unwrap_err(),
        DenyReason::InsufficientPermissions
    );

    harness
        .add_role("mike-role", Some(&["users:read", "users:update"]))
        .await;
    assert!(harness.gateway.authorize(&bearer(&token), &requirement).await.is_err());

    harness
        .clock
        .advance(Duration::seconds(CACHE_TTL.as_secs() as i64));
    let token = harness.token_for("mike");
    assert!(harness.gateway.authorize(&bearer(&token), &requirement).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_requests() {
    let harness = Harness::new();
    harness.user_with("nina", Some(&["users:read"])).await;
    let token = harness.token_for("nina");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let gateway = harness.gateway.clone();
        let headers = bearer(&token);
        handles.push(tokio::spawn(async move {
            gateway
                .authorize(&headers, &RouteRequirement::any_of(["users:read"]))
                .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
}

#[test]
fn test_shared_secret_matches_fixture() {
    // Tokens issued by the fixture verify with a manager built from the same secret
    let harness = Harness::new();
    let token = harness.token_for("olga");
    let claims = TokenManager::new(SECRET)
        .verify(&token, harness.clock.now())
        .unwrap();
    assert_eq!(claims.sub, "olga");
}
