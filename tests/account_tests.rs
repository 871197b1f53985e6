//! AccountActor integration tests — sign-up, sign-in, verification, password
//! reset, password change, profile, locale. Collaborators are the in-memory
//! reference stores, mail is captured, and time is driven by the manual clock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;

use identity_core::account::{
    ChangePasswordRequest, Locale, SignInRequest, SignUpRequest, UpdateProfileRequest,
};
use identity_core::{
    AccountActor, AccountHandle, AuthConfig, AuthContext, AuthError, AuthGate, Clock,
    CredentialStore, MailSender, ManualClock, MemoryCredentialStore, MemoryRevocationStore,
    TokenCodec, User,
};

// ─── Test Harness ───

struct SentMail {
    kind: &'static str,
    email: String,
    token: String,
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    fn last_token(&self, kind: &str) -> Option<String> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find(|m| m.kind == kind)
            .map(|m| m.token.clone())
    }

    fn count(&self, kind: &str) -> usize {
        self.sent.lock().iter().filter(|m| m.kind == kind).count()
    }

    fn last_recipient(&self) -> Option<String> {
        self.sent.lock().last().map(|m| m.email.clone())
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send_verification(&self, email: &str, token: &str) -> identity_core::Result<()> {
        self.sent.lock().push(SentMail {
            kind: "verification",
            email: email.into(),
            token: token.into(),
        });
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, token: &str) -> identity_core::Result<()> {
        self.sent.lock().push(SentMail {
            kind: "reset",
            email: email.into(),
            token: token.into(),
        });
        Ok(())
    }
}

struct World {
    handle: AccountHandle,
    gate: AuthGate,
    codec: TokenCodec,
    store: Arc<MemoryCredentialStore>,
    mailer: Arc<RecordingMailer>,
    clock: ManualClock,
}

fn world() -> World {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let config = AuthConfig::new()
        .with_jwt_secret("test-secret-jwt-key-min-32-chars!!")
        .with_session_ttl_hours(24);

    let store = Arc::new(MemoryCredentialStore::new(shared.clone()));
    let revocations = Arc::new(MemoryRevocationStore::new(shared.clone()));
    let mailer = Arc::new(RecordingMailer::default());

    let handle = AccountActor::spawn_with_clock(
        &config,
        store.clone(),
        revocations.clone(),
        mailer.clone(),
        shared.clone(),
    );
    let codec = TokenCodec::new(&config.jwt_secret, config.session_ttl(), shared);
    let gate = AuthGate::new(codec.clone(), store.clone(), revocations);

    World {
        handle,
        gate,
        codec,
        store,
        mailer,
        clock,
    }
}

async fn sign_up(world: &World, email: &str, password: &str) -> (String, User) {
    world
        .handle
        .sign_up(SignUpRequest {
            email: email.into(),
            password: password.into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            locale: Locale::En,
        })
        .await
        .unwrap()
}

async fn sign_in(world: &World, email: &str, password: &str) -> identity_core::Result<(String, User)> {
    world
        .handle
        .sign_in(SignInRequest {
            email: email.into(),
            password: password.into(),
        })
        .await
}

async fn authed(world: &World, token: &str) -> AuthContext {
    world
        .gate
        .authenticate(Some(&format!("Bearer {token}")))
        .await
}

// ─── Sign-up / Sign-in ───

#[tokio::test]
async fn sign_up_then_sign_in() {
    let w = world();

    let (signup_token, user) = sign_up(&w, "a@x.com", "p1-secured").await;
    assert_eq!(w.codec.verify(&signup_token).unwrap().sub, user.id);
    assert!(!user.verification.verified);

    let (token, signed_in) = sign_in(&w, "a@x.com", "p1-secured").await.unwrap();
    assert_eq!(signed_in.id, user.id);
    assert_eq!(w.codec.verify(&token).unwrap().sub, user.id);

    let wrong = sign_in(&w, "a@x.com", "wrong-password").await;
    assert!(matches!(wrong, Err(AuthError::IncorrectPassword)));

    let unknown = sign_in(&w, "ghost@x.com", "p1-secured").await;
    assert!(matches!(unknown, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn duplicate_sign_up_leaves_existing_record_untouched() {
    let w = world();

    sign_up(&w, "a@x.com", "p1-secured").await;
    let result = w
        .handle
        .sign_up(SignUpRequest {
            email: "a@x.com".into(),
            password: "other-password".into(),
            first_name: "Other".into(),
            last_name: "User".into(),
            locale: Locale::Fr,
        })
        .await;

    assert!(matches!(result, Err(AuthError::EmailTaken)));
    assert_eq!(w.store.user_count(), 1);

    // Original credentials still work
    assert!(sign_in(&w, "a@x.com", "p1-secured").await.is_ok());
}

#[tokio::test]
async fn weak_passwords_are_rejected() {
    let w = world();

    let result = w
        .handle
        .sign_up(SignUpRequest {
            email: "a@x.com".into(),
            password: "short".into(),
            first_name: String::new(),
            last_name: String::new(),
            locale: Locale::En,
        })
        .await;
    assert!(matches!(result, Err(AuthError::PasswordTooWeak(_))));
    assert_eq!(w.store.user_count(), 0);
}

// ─── Email Verification ───

#[tokio::test]
async fn sign_up_mails_a_verification_token() {
    let w = world();

    let (_, user) = sign_up(&w, "a@x.com", "p1-secured").await;

    assert_eq!(w.mailer.last_recipient().as_deref(), Some("a@x.com"));
    let token = w.mailer.last_token("verification").unwrap();
    assert_eq!(token.len(), 48);

    let stored = w
        .store
        .find_by_verification_token(&token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, user.id);
    assert_eq!(
        stored.verification.expires_at,
        Some(w.clock.now() + Duration::days(7))
    );
}

#[tokio::test]
async fn verification_token_is_single_use() {
    let w = world();

    let (_, user) = sign_up(&w, "a@x.com", "p1-secured").await;
    let token = w.mailer.last_token("verification").unwrap();

    let (session, verified) = w.handle.verify(&token).await.unwrap();
    assert_eq!(verified.id, user.id);
    assert!(verified.verification.verified);
    assert!(verified.verification.token.is_none());
    assert_eq!(w.codec.verify(&session).unwrap().sub, user.id);

    // Consumed: the same token can never be honored again
    let replay = w.handle.verify(&token).await;
    assert!(matches!(replay, Err(AuthError::TokenNotFound)));
}

#[tokio::test]
async fn expired_verification_token_is_rejected() {
    let w = world();

    sign_up(&w, "a@x.com", "p1-secured").await;
    let token = w.mailer.last_token("verification").unwrap();

    w.clock.advance(Duration::days(8));
    let result = w.handle.verify(&token).await;
    assert!(matches!(result, Err(AuthError::TokenNotFound)));
}

#[tokio::test]
async fn request_verification_overwrites_prior_token() {
    let w = world();

    let (session, _) = sign_up(&w, "a@x.com", "p1-secured").await;
    let first = w.mailer.last_token("verification").unwrap();

    let ctx = authed(&w, &session).await;
    w.handle.request_verification(&ctx).await.unwrap();
    assert_eq!(w.mailer.count("verification"), 2);

    let second = w.mailer.last_token("verification").unwrap();
    assert_ne!(first, second);

    // Only the most recent token is live
    assert!(matches!(
        w.handle.verify(&first).await,
        Err(AuthError::TokenNotFound)
    ));
    assert!(w.handle.verify(&second).await.is_ok());
}

// ─── Password Reset ───

#[tokio::test]
async fn password_reset_flow() {
    let w = world();

    let (_, user) = sign_up(&w, "a@x.com", "p1-secured").await;

    w.handle.request_password_reset("a@x.com").await.unwrap();
    let token = w.mailer.last_token("reset").unwrap();
    assert_eq!(token.len(), 48);

    // Reset token carries a 7-day expiry
    let stored = w.store.find_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(
        stored.reset_password.expires_at,
        Some(w.clock.now() + Duration::days(7))
    );

    let (session, updated) = w
        .handle
        .apply_new_password(&token, "p2-secured")
        .await
        .unwrap();
    assert_eq!(updated.id, user.id);
    assert!(updated.reset_password.token.is_none());
    assert_eq!(w.codec.verify(&session).unwrap().sub, user.id);

    // Old password dead, new password live
    assert!(matches!(
        sign_in(&w, "a@x.com", "p1-secured").await,
        Err(AuthError::IncorrectPassword)
    ));
    assert!(sign_in(&w, "a@x.com", "p2-secured").await.is_ok());

    // Consumed: applying the same token twice fails
    let replay = w.handle.apply_new_password(&token, "p3-secured").await;
    assert!(matches!(replay, Err(AuthError::TokenNotFound)));
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let w = world();

    sign_up(&w, "a@x.com", "p1-secured").await;
    w.handle.request_password_reset("a@x.com").await.unwrap();
    let token = w.mailer.last_token("reset").unwrap();

    w.clock.advance(Duration::days(8));
    let result = w.handle.apply_new_password(&token, "p2-secured").await;
    assert!(matches!(result, Err(AuthError::TokenNotFound)));

    // The stored hash was never touched
    assert!(sign_in(&w, "a@x.com", "p1-secured").await.is_ok());
}

#[tokio::test]
async fn reset_for_unknown_email_fails() {
    let w = world();
    let result = w.handle.request_password_reset("ghost@x.com").await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn a_newer_reset_request_invalidates_the_prior_token() {
    let w = world();

    sign_up(&w, "a@x.com", "p1-secured").await;
    w.handle.request_password_reset("a@x.com").await.unwrap();
    let first = w.mailer.last_token("reset").unwrap();
    w.handle.request_password_reset("a@x.com").await.unwrap();
    let second = w.mailer.last_token("reset").unwrap();

    assert!(matches!(
        w.handle.apply_new_password(&first, "p2-secured").await,
        Err(AuthError::TokenNotFound)
    ));
    assert!(w
        .handle
        .apply_new_password(&second, "p2-secured")
        .await
        .is_ok());
}

// ─── Password Change ───

#[tokio::test]
async fn change_password_requires_the_current_password() {
    let w = world();

    let (session, _) = sign_up(&w, "a@x.com", "p1-secured").await;
    let ctx = authed(&w, &session).await;

    let wrong = w
        .handle
        .change_password(
            &ctx,
            ChangePasswordRequest {
                current_password: "not-the-password".into(),
                new_password: "p2-secured".into(),
            },
        )
        .await;
    assert!(matches!(wrong, Err(AuthError::IncorrectPassword)));

    // Stored hash unchanged after the failed attempt
    assert!(sign_in(&w, "a@x.com", "p1-secured").await.is_ok());

    w.handle
        .change_password(
            &ctx,
            ChangePasswordRequest {
                current_password: "p1-secured".into(),
                new_password: "p2-secured".into(),
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        sign_in(&w, "a@x.com", "p1-secured").await,
        Err(AuthError::IncorrectPassword)
    ));
    assert!(sign_in(&w, "a@x.com", "p2-secured").await.is_ok());
}

// ─── Profile / Locale ───

#[tokio::test]
async fn update_profile_rechecks_email_uniqueness() {
    let w = world();

    sign_up(&w, "a@x.com", "p1-secured").await;
    let (session, _) = sign_up(&w, "b@x.com", "p1-secured").await;
    let ctx = authed(&w, &session).await;

    let conflict = w
        .handle
        .update_profile(
            &ctx,
            UpdateProfileRequest {
                email: "a@x.com".into(),
                first_name: "Bea".into(),
                last_name: "User".into(),
            },
        )
        .await;
    assert!(matches!(conflict, Err(AuthError::EmailTaken)));

    let updated = w
        .handle
        .update_profile(
            &ctx,
            UpdateProfileRequest {
                email: "b-new@x.com".into(),
                first_name: "Bea".into(),
                last_name: "Renamed".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.email, "b-new@x.com");
    assert_eq!(updated.display_name(), "Bea Renamed");
}

#[tokio::test]
async fn switch_locale_updates_the_user() {
    let w = world();

    let (session, _) = sign_up(&w, "a@x.com", "p1-secured").await;
    let ctx = authed(&w, &session).await;

    let updated = w.handle.switch_locale(&ctx, Locale::De).await.unwrap();
    assert_eq!(updated.locale, Locale::De);
}

// ─── Authentication Requirements ───

#[tokio::test]
async fn identity_requiring_operations_reject_anonymous_callers() {
    let w = world();
    let anon = AuthContext::Anonymous;

    assert!(matches!(
        w.handle.logout(&anon).await,
        Err(AuthError::AuthenticationRequired)
    ));
    assert!(matches!(
        w.handle.request_verification(&anon).await,
        Err(AuthError::AuthenticationRequired)
    ));
    assert!(matches!(
        w.handle
            .change_password(
                &anon,
                ChangePasswordRequest {
                    current_password: "p1-secured".into(),
                    new_password: "p2-secured".into(),
                }
            )
            .await,
        Err(AuthError::AuthenticationRequired)
    ));
    assert!(matches!(
        w.handle.switch_locale(&anon, Locale::Fr).await,
        Err(AuthError::AuthenticationRequired)
    ));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let w = world();

    let (session, _) = sign_up(&w, "a@x.com", "p1-secured").await;
    let ctx = authed(&w, &session).await;

    w.handle.logout(&ctx).await.unwrap();
    w.handle.logout(&ctx).await.unwrap();

    let after = authed(&w, &session).await;
    assert!(!after.is_authenticated());
}
