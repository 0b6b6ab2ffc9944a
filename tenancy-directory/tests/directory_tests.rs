//! End-to-end tests for the tenancy-scoped directory.
//!
//! Every test runs against `MemoryStorage` and obtains principals the way a
//! transport would: by logging in or by validating an issued token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::sync::Arc;
use tenancy_auth::{AuthError, PasswordConfig, Principal};
use tenancy_directory::{
    CreatedOrganization, Directory, DirectoryConfig, DirectoryError, ErrorKind, MemoryStorage,
};
use tenancy_org::{
    NewOrganization, NewUser, OrganizationUpdate, PageRequest, Role, UserUpdate, UserView,
};
use uuid::Uuid;

/// Test fixture with a directory over shared in-memory storage.
struct TestFixture {
    directory: Directory<MemoryStorage>,
    storage: Arc<MemoryStorage>,
}

impl TestFixture {
    fn new() -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let config =
            DirectoryConfig::new("directory-test-secret").with_password(PasswordConfig::fast());
        let directory = Directory::new(Arc::clone(&storage), &config).unwrap();
        Self { directory, storage }
    }

    async fn organization(&self, name: &str, admin_email: &str) -> CreatedOrganization {
        self.directory
            .create_organization(
                NewOrganization::new(name, name.to_uppercase()),
                NewUser::new("Admin", admin_email, "admin-pass"),
            )
            .await
            .unwrap()
    }

    async fn member(&self, organization_id: Uuid, name: &str, email: &str) -> UserView {
        self.directory
            .register_user(
                None,
                organization_id,
                NewUser::new(name, email, "secret1"),
                None,
            )
            .await
            .unwrap()
    }

    async fn login(&self, email: &str, password: &str, organization_id: Uuid) -> Principal {
        let session = self
            .directory
            .authenticate(email, password, organization_id)
            .await
            .unwrap();
        self.directory
            .authenticator()
            .authenticate(Some(&format!("Bearer {}", session.token.token)))
            .unwrap()
    }
}

fn decode_payload(token: &str) -> serde_json::Value {
    let payload = token.split('.').nth(1).unwrap();
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
}

#[tokio::test]
async fn test_register_login_and_scoped_deletes() {
    let f = TestFixture::new();
    let org1 = f.organization("org1", "boss1@x.com").await;
    let org2 = f.organization("org2", "boss2@x.com").await;

    let ann = f
        .directory
        .register_user(
            None,
            org1.organization.id,
            NewUser::new("Ann", "ann@x.com", "secret1"),
            Some(Role::Member),
        )
        .await
        .unwrap();
    let json = serde_json::to_value(&ann).unwrap();
    assert!(json.get("password").is_none());
    assert!(json.get("password_hash").is_none());
    assert_eq!(ann.role, Role::Member);

    let wrong = f
        .directory
        .authenticate("ann@x.com", "wrong", org1.organization.id)
        .await;
    assert!(matches!(wrong, Err(DirectoryError::InvalidCredentials)));

    let session = f
        .directory
        .authenticate("ann@x.com", "secret1", org1.organization.id)
        .await
        .unwrap();
    let claims = decode_payload(&session.token.token);
    assert_eq!(claims["organization_id"], org1.organization.id.to_string());
    assert_eq!(claims["user_id"], ann.id.to_string());
    assert_eq!(claims["role"], "member");
    assert!(claims["exp"].as_i64().unwrap() > claims["iat"].as_i64().unwrap());

    let member = f.directory.tokens().authenticate(&session.token.token).unwrap();
    let result = f
        .directory
        .delete_organization(&member, org1.organization.id)
        .await;
    assert!(matches!(result, Err(DirectoryError::Forbidden)));

    let admin1 = f.login("boss1@x.com", "admin-pass", org1.organization.id).await;
    let result = f
        .directory
        .delete_organization(&admin1, org2.organization.id)
        .await;
    assert!(matches!(result, Err(DirectoryError::Forbidden)));

    assert!(f
        .directory
        .get_own_organization(&admin1)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_login_does_not_reveal_unknown_accounts() {
    let f = TestFixture::new();
    let org = f.organization("acme", "boss@acme.com").await;

    for (email, org_id) in [
        ("nobody@acme.com", org.organization.id),
        ("boss@acme.com", Uuid::now_v7()),
    ] {
        let result = f.directory.authenticate(email, "admin-pass", org_id).await;
        let err = result.unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidCredentials));
        assert_eq!(err.client_message(), "Invalid email or password");
    }
}

#[tokio::test]
async fn test_cross_tenant_users_are_invisible() {
    let f = TestFixture::new();
    let org_a = f.organization("org-a", "boss@a.com").await;
    let org_b = f.organization("org-b", "boss@b.com").await;
    f.member(org_a.organization.id, "U1", "u1@a.com").await;
    let u2 = f.member(org_b.organization.id, "U2", "u2@b.com").await;

    let u1 = f.login("u1@a.com", "secret1", org_a.organization.id).await;
    let admin_a = f.login("boss@a.com", "admin-pass", org_a.organization.id).await;

    for principal in [&u1, &admin_a] {
        let read = f.directory.get_user(principal, u2.id).await.unwrap_err();
        assert_eq!(read.kind(), ErrorKind::NotFound);

        let update = f
            .directory
            .update_user(
                principal,
                u2.id,
                UserUpdate {
                    name: Some("Mallory".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(update, DirectoryError::UserNotFound));

        let delete = f.directory.delete_user(principal, u2.id).await.unwrap_err();
        assert!(matches!(delete, DirectoryError::UserNotFound));

        let role = f
            .directory
            .update_user_role(principal, u2.id, Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(role, DirectoryError::UserNotFound));
    }

    let org = f
        .directory
        .get_organization(&admin_a, org_b.organization.id)
        .await
        .unwrap_err();
    assert!(matches!(org, DirectoryError::OrganizationNotFound));

    let untouched = f.storage.user_record(u2.id).await.unwrap();
    assert_eq!(untouched.name, "U2");
    assert!(!untouched.is_deleted());
}

#[tokio::test]
async fn test_members_act_only_on_themselves() {
    let f = TestFixture::new();
    let org = f.organization("acme", "boss@acme.com").await;
    let org_id = org.organization.id;
    let ann = f.member(org_id, "Ann", "ann@acme.com").await;
    let bob = f.member(org_id, "Bob", "bob@acme.com").await;
    let ann_principal = f.login("ann@acme.com", "secret1", org_id).await;

    let err = f
        .directory
        .get_user(&ann_principal, bob.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Forbidden));
    assert_eq!(err.status_code(), 403);

    let err = f
        .directory
        .update_user_role(&ann_principal, ann.id, Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Forbidden));

    let err = f
        .directory
        .list_organization_users(&ann_principal, org_id, PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Forbidden));

    let me = f.directory.get_profile(&ann_principal).await.unwrap();
    assert_eq!(me.id, ann.id);

    let renamed = f
        .directory
        .update_profile(
            &ann_principal,
            UserUpdate {
                name: Some("Annie".into()),
                email: Some(String::new()),
                password: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Annie");
    assert_eq!(renamed.email, "ann@acme.com");
}

#[tokio::test]
async fn test_email_uniqueness_is_per_organization() {
    let f = TestFixture::new();
    let org_a = f.organization("org-a", "boss@a.com").await;
    let org_b = f.organization("org-b", "boss@b.com").await;

    f.member(org_a.organization.id, "Ann", "ann@x.com").await;
    f.member(org_b.organization.id, "Ann", "ann@x.com").await;

    for email in ["ann@x.com", " ANN@X.com "] {
        let err = f
            .directory
            .register_user(
                None,
                org_a.organization.id,
                NewUser::new("Ann", email, "secret1"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateEmail));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}

#[tokio::test]
async fn test_registration_requires_live_organization() {
    let f = TestFixture::new();
    let input = NewUser::new("Ann", "ann@x.com", "secret1");

    let err = f
        .directory
        .register_user(None, Uuid::now_v7(), input.clone(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::OrganizationNotFound));

    let org = f.organization("acme", "boss@acme.com").await;
    let err = f
        .directory
        .register_user(
            None,
            org.organization.id,
            NewUser::new("Ann", "ann@x.com", "short"),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_deactivated_organization_rejects_registration_and_login() {
    let f = TestFixture::new();
    let org = f.organization("acme", "boss@acme.com").await;
    let org_id = org.organization.id;
    let admin = f.login("boss@acme.com", "admin-pass", org_id).await;

    let updated = f
        .directory
        .update_organization(
            &admin,
            org_id,
            OrganizationUpdate {
                is_active: Some(false),
                description: Some("paused".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.is_active);
    assert_eq!(updated.description.as_deref(), Some("paused"));

    let err = f
        .directory
        .register_user(None, org_id, NewUser::new("Ann", "ann@x.com", "secret1"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::OrganizationInactive));

    let err = f
        .directory
        .authenticate("boss@acme.com", "admin-pass", org_id)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::InvalidCredentials));

    f.directory
        .update_organization(
            &admin,
            org_id,
            OrganizationUpdate {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    f.login("boss@acme.com", "admin-pass", org_id).await;
}

#[tokio::test]
async fn test_admin_registration_needs_same_org_admin() {
    let f = TestFixture::new();
    let org_a = f.organization("org-a", "boss@a.com").await;
    let org_b = f.organization("org-b", "boss@b.com").await;
    let org_id = org_a.organization.id;
    f.member(org_id, "Ann", "ann@a.com").await;

    let input = || NewUser::new("Eve", "eve@a.com", "secret1");

    let err = f
        .directory
        .register_user(None, org_id, input(), Some(Role::Admin))
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Unauthenticated));
    assert_eq!(err.status_code(), 401);

    let ann = f.login("ann@a.com", "secret1", org_id).await;
    let err = f
        .directory
        .register_user(Some(&ann), org_id, input(), Some(Role::Admin))
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Forbidden));

    let admin_b = f.login("boss@b.com", "admin-pass", org_b.organization.id).await;
    let err = f
        .directory
        .register_user(Some(&admin_b), org_id, input(), Some(Role::Admin))
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Forbidden));

    let admin_a = f.login("boss@a.com", "admin-pass", org_id).await;
    let eve = f
        .directory
        .register_user(Some(&admin_a), org_id, input(), Some(Role::Admin))
        .await
        .unwrap();
    assert_eq!(eve.role, Role::Admin);
}

#[tokio::test]
async fn test_admin_manages_members() {
    let f = TestFixture::new();
    let org = f.organization("acme", "boss@acme.com").await;
    let org_id = org.organization.id;
    let ann = f.member(org_id, "Ann", "ann@acme.com").await;
    f.member(org_id, "Bob", "bob@acme.com").await;
    let admin = f.login("boss@acme.com", "admin-pass", org_id).await;

    let promoted = f
        .directory
        .update_user_role(&admin, ann.id, Role::Admin)
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Admin);

    let session = f
        .directory
        .authenticate("ann@acme.com", "secret1", org_id)
        .await
        .unwrap();
    assert_eq!(session.token.claims.role, Role::Admin);

    let err = f
        .directory
        .update_user(
            &admin,
            ann.id,
            UserUpdate {
                email: Some("bob@acme.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::DuplicateEmail));

    f.directory
        .update_user(
            &admin,
            ann.id,
            UserUpdate {
                email: Some("Ann.New@Acme.com".into()),
                password: Some("new-secret".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = f
        .directory
        .authenticate("ann.new@acme.com", "secret1", org_id)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::InvalidCredentials));
    f.login("ann.new@acme.com", "new-secret", org_id).await;

    let page = f
        .directory
        .list_organization_users(&admin, org_id, PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_pages(), 2);

    f.directory.delete_user(&admin, ann.id).await.unwrap();
    let page = f
        .directory
        .list_organization_users(&admin, org_id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(f.storage.user_record(ann.id).await.unwrap().is_deleted());
}

#[tokio::test]
async fn test_foreign_admin_cannot_list_or_update_organization() {
    let f = TestFixture::new();
    let org_a = f.organization("org-a", "boss@a.com").await;
    let org_b = f.organization("org-b", "boss@b.com").await;
    let admin_b = f.login("boss@b.com", "admin-pass", org_b.organization.id).await;

    let err = f
        .directory
        .list_organization_users(&admin_b, org_a.organization.id, PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Forbidden));

    let err = f
        .directory
        .update_organization(
            &admin_b,
            org_a.organization.id,
            OrganizationUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Forbidden));

    let err = f
        .directory
        .delete_organization(&admin_b, Uuid::now_v7())
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Forbidden));

    let orgs = f
        .directory
        .list_organizations(&admin_b, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(orgs.total, 1);
    assert_eq!(orgs.items[0].id, org_b.organization.id);
}

#[tokio::test]
async fn test_delete_organization_cascades_to_members() {
    let f = TestFixture::new();
    let org = f.organization("acme", "boss@acme.com").await;
    let other = f.organization("other", "boss@other.com").await;
    let org_id = org.organization.id;
    let ann = f.member(org_id, "Ann", "ann@acme.com").await;
    let outsider = f.member(other.organization.id, "Zed", "zed@other.com").await;
    let admin = f.login("boss@acme.com", "admin-pass", org_id).await;

    f.directory.delete_organization(&admin, org_id).await.unwrap();

    let org_record = f.storage.organization_record(org_id).await.unwrap();
    let deleted_at = org_record.lifecycle.deleted_at().unwrap();
    for user_id in [ann.id, org.admin.id] {
        let record = f.storage.user_record(user_id).await.unwrap();
        assert_eq!(record.lifecycle.deleted_at(), Some(deleted_at));
    }
    assert!(!f.storage.user_record(outsider.id).await.unwrap().is_deleted());

    let err = f.directory.get_profile(&admin).await.unwrap_err();
    assert!(matches!(err, DirectoryError::UserNotFound));
    let err = f.directory.get_own_organization(&admin).await.unwrap_err();
    assert!(matches!(err, DirectoryError::OrganizationNotFound));
    let err = f
        .directory
        .authenticate("ann@acme.com", "secret1", org_id)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::InvalidCredentials));

    f.organization("acme", "boss@acme.com").await;
}

#[tokio::test]
async fn test_duplicate_organization_name() {
    let f = TestFixture::new();
    f.organization("acme", "boss@acme.com").await;

    let err = f
        .directory
        .create_organization(
            NewOrganization::new("acme", "Acme Again"),
            NewUser::new("Admin", "boss2@acme.com", "admin-pass"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::DuplicateOrganizationName));
    assert_eq!(f.storage.organization_count().await, 1);

    let err = f
        .directory
        .create_organization(
            NewOrganization::new("bad name", "Bad"),
            NewUser::new("Admin", "boss@bad.com", "admin-pass"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_deleted_profile_is_gone() {
    let f = TestFixture::new();
    let org = f.organization("acme", "boss@acme.com").await;
    f.member(org.organization.id, "Ann", "ann@acme.com").await;
    let ann = f.login("ann@acme.com", "secret1", org.organization.id).await;

    f.directory.delete_profile(&ann).await.unwrap();

    let err = f.directory.get_profile(&ann).await.unwrap_err();
    assert!(matches!(err, DirectoryError::UserNotFound));
    f.member(org.organization.id, "Ann", "ann@acme.com").await;
}

#[tokio::test]
async fn test_transport_rejections_are_unauthenticated() {
    let f = TestFixture::new();
    let authenticator = f.directory.authenticator();

    let err = DirectoryError::from(authenticator.authenticate(None).unwrap_err());
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    let err = DirectoryError::from(
        authenticator
            .authenticate(Some("Bearer not.a.token"))
            .unwrap_err(),
    );
    assert_eq!(err.status_code(), 401);

    let foreign = tenancy_auth::TokenService::with_secret("someone-elses-secret")
        .unwrap()
        .issue(Uuid::now_v7(), Uuid::now_v7(), Role::Admin)
        .unwrap();
    let err = authenticator
        .authenticate(Some(&format!("Bearer {}", foreign)))
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidSignature));
}

#[tokio::test]
async fn test_organization_keeps_an_admin() {
    let f = TestFixture::new();
    let org = f.organization("acme", "boss@acme.com").await;
    let org_id = org.organization.id;
    let ann = f.member(org_id, "Ann", "ann@acme.com").await;
    let boss = f.login("boss@acme.com", "admin-pass", org_id).await;

    let err = f
        .directory
        .update_user_role(&boss, org.admin.id, Role::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::LastAdmin));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = f.directory.delete_profile(&boss).await.unwrap_err();
    assert!(matches!(err, DirectoryError::LastAdmin));
    assert!(!f.storage.user_record(org.admin.id).await.unwrap().is_deleted());

    f.directory
        .update_user_role(&boss, ann.id, Role::Admin)
        .await
        .unwrap();
    let demoted = f
        .directory
        .update_user_role(&boss, org.admin.id, Role::Member)
        .await
        .unwrap();
    assert_eq!(demoted.role, Role::Member);

    let ann_admin = f.login("ann@acme.com", "secret1", org_id).await;
    let err = f.directory.delete_user(&ann_admin, ann.id).await.unwrap_err();
    assert!(matches!(err, DirectoryError::LastAdmin));
}
