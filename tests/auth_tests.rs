//! Authentication and authorization tests

use segmentd::auth::{
    require_role, Claims, CredentialRecord, CredentialStore, Role, TokenCodec, TokenError,
};
use segmentd::Error;

const NOW: i64 = 1_700_000_000;

fn codec() -> TokenCodec {
    TokenCodec::new("auth-tests-secret", chrono::Duration::minutes(30)).unwrap()
}

fn store() -> CredentialStore {
    CredentialStore::from_records(vec![
        CredentialRecord {
            username: "admin".to_string(),
            password_hash: bcrypt::hash("admin-pass", 4).unwrap(),
            role: Role::Admin,
        },
        CredentialRecord {
            username: "doctor".to_string(),
            password_hash: bcrypt::hash("doctor-pass", 4).unwrap(),
            role: Role::User,
        },
    ])
    .unwrap()
}

/// Replace one character in the payload segment with a different base64url character
fn tamper_payload(token: &str, position: usize) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);

    let mut payload: Vec<char> = parts[1].chars().collect();
    let idx = position % payload.len();
    payload[idx] = if payload[idx] == 'A' { 'B' } else { 'A' };
    let payload: String = payload.into_iter().collect();

    format!("{}.{}.{}", parts[0], payload, parts[2])
}

#[test]
fn test_login_round_trip_for_every_account() {
    let store = store();
    let codec = codec();

    for (username, password, role) in [
        ("admin", "admin-pass", Role::Admin),
        ("doctor", "doctor-pass", Role::User),
    ] {
        let record = store
            .authenticate(username, password)
            .expect("credentials should verify");
        let token = codec.issue(&record.username, record.role).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.sub, username);
        assert_eq!(claims.role, role);
    }
}

#[test]
fn test_token_format() {
    let token = codec().issue("doctor", Role::User).unwrap();
    assert_eq!(token.split('.').count(), 3); // JWT format: header.payload.signature
}

#[test]
fn test_expired_only_at_or_after_exp() {
    let codec = codec();
    let token = codec.issue_at("doctor", Role::User, NOW).unwrap();
    let exp = NOW + 30 * 60;

    for now in [NOW, NOW + 1, exp - 60, exp - 1] {
        assert!(codec.verify_at(&token, now).is_ok(), "valid at {}", now);
    }
    for now in [exp, exp + 1, exp + 86_400] {
        assert_eq!(codec.verify_at(&token, now), Err(TokenError::Expired));
    }
}

#[test]
fn test_tampered_payload_is_bad_signature() {
    let codec = codec();
    let token = codec.issue_at("doctor", Role::User, NOW).unwrap();
    let payload_len = token.split('.').nth(1).unwrap().len();

    for position in 0..payload_len {
        let forged = tamper_payload(&token, position);
        assert_ne!(forged, token);
        assert_eq!(
            codec.verify_at(&forged, NOW),
            Err(TokenError::BadSignature),
            "position {}",
            position
        );
    }
}

#[test]
fn test_signature_checked_before_expiry() {
    let codec = codec();
    let token = codec.issue_at("doctor", Role::User, NOW).unwrap();
    let forged = tamper_payload(&token, 3);

    // Long past expiry, a forged token still reports the signature failure.
    assert_eq!(
        codec.verify_at(&forged, NOW + 10 * 86_400),
        Err(TokenError::BadSignature)
    );
}

#[test]
fn test_forged_role_claim_rejected() {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: "doctor".to_string(),
        role: Role::Admin,
        iat: NOW,
        exp: NOW + 60,
    };
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"guessed-secret"),
    )
    .unwrap();

    assert_eq!(
        codec().verify_at(&forged, NOW),
        Err(TokenError::BadSignature)
    );
}

#[test]
fn test_unsupported_algorithm_is_malformed() {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    let claims = Claims {
        sub: "doctor".to_string(),
        role: Role::User,
        iat: NOW,
        exp: NOW + 60,
    };
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(b"auth-tests-secret"),
    )
    .unwrap();

    assert!(matches!(
        codec().verify_at(&token, NOW),
        Err(TokenError::Malformed(_))
    ));
}

#[test]
fn test_malformed_token_rejection() {
    let codec = codec();
    for token in ["", "not-a-jwt-token", "a.b", "invalid.token.here"] {
        assert!(
            matches!(codec.verify(token), Err(TokenError::Malformed(_))),
            "{:?}",
            token
        );
    }
}

#[test]
fn test_wrong_password_and_unknown_user() {
    let store = store();
    assert!(store.authenticate("admin", "doctor-pass").is_none());
    assert!(store.authenticate("ghost", "admin-pass").is_none());
    assert!(store.lookup("ghost").is_none());
}

#[test]
fn test_role_guard_exact_match() {
    let codec = codec();
    let user = codec.verify(&codec.issue("doctor", Role::User).unwrap()).unwrap();
    let admin = codec.verify(&codec.issue("admin", Role::Admin).unwrap()).unwrap();

    assert!(matches!(
        require_role(&user, Role::Admin),
        Err(Error::Forbidden(_))
    ));
    assert!(require_role(&admin, Role::Admin).is_ok());
    assert!(matches!(
        require_role(&admin, Role::User),
        Err(Error::Forbidden(_))
    ));
}

#[test]
fn test_role_display() {
    assert_eq!(Role::Admin.to_string(), "admin");
    assert_eq!(Role::User.to_string(), "user");
}
