//! Account rules: registration, login, profile updates and removal.

use chrono::Utc;
use school_core::auth::{JwtKeys, PasswordHasher};
use school_core::storage::Storage;
use school_core::{Result, Role, SchoolError, User, Viewer};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct Registration {
    pub email: String,
    pub pseudo: String,
    pub password: String,
    pub role: Option<String>,
}

/// Optional fields of a profile update; `None` leaves the value unchanged.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub pseudo: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SchoolError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn email_taken() -> SchoolError {
    SchoolError::Conflict("Email is already used".to_string())
}

pub async fn register(
    storage: &dyn Storage,
    hasher: &PasswordHasher,
    input: Registration,
) -> Result<User> {
    let email = required(&input.email, "Email")?;
    let pseudo = required(&input.pseudo, "Pseudo")?;
    if input.password.is_empty() {
        return Err(SchoolError::Validation("Password is required".to_string()));
    }

    if storage.get_user_by_email(&email).await?.is_some() {
        return Err(email_taken());
    }

    let hash = hasher.hash(&input.password).await?;
    let role = Role::from_requested(input.role.as_deref());
    let user = User::new(&email, &pseudo, hash, role);
    storage.create_user(&user).await?;

    info!("Registered {} as {}", user.email, user.role);
    Ok(user)
}

/// Check the credentials and issue a token. Unknown email and wrong
/// password fail the same way.
pub async fn login(
    storage: &dyn Storage,
    hasher: &PasswordHasher,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<(String, User)> {
    let user = storage
        .get_user_by_email(email.trim())
        .await?
        .ok_or(SchoolError::InvalidCredentials)?;

    if !hasher.verify(password, &user.password_hash).await? {
        return Err(SchoolError::InvalidCredentials);
    }

    let token = keys.issue(&user)?;
    Ok((token, user))
}

pub async fn update_user(
    storage: &dyn Storage,
    hasher: &PasswordHasher,
    viewer: Option<&Viewer>,
    user_id: Uuid,
    changes: ProfileChanges,
) -> Result<User> {
    let viewer = viewer.ok_or(SchoolError::Unauthorized)?;
    if !viewer.is_admin() && viewer.id != user_id {
        return Err(SchoolError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let mut user = storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| SchoolError::not_found("User"))?;

    if let Some(role) = changes.role {
        if !viewer.is_admin() {
            return Err(SchoolError::Forbidden(
                "Only administrators can change roles".to_string(),
            ));
        }
        user.role = role.parse()?;
    }

    if let Some(email) = changes.email {
        let email = required(&email, "Email")?;
        if email != user.email {
            if let Some(other) = storage.get_user_by_email(&email).await? {
                if other.id != user.id {
                    return Err(email_taken());
                }
            }
            user.email = email;
        }
    }

    if let Some(pseudo) = changes.pseudo {
        user.pseudo = required(&pseudo, "Pseudo")?;
    }

    if let Some(password) = changes.password {
        if password.is_empty() {
            return Err(SchoolError::Validation("Password is required".to_string()));
        }
        user.password_hash = hasher.hash(&password).await?;
    }

    user.updated_at = Utc::now();
    storage.update_user(&user).await?;
    Ok(user)
}

/// Delete an account and return it as it was.
pub async fn delete_user(
    storage: &dyn Storage,
    viewer: Option<&Viewer>,
    user_id: Uuid,
) -> Result<User> {
    let viewer = viewer.ok_or(SchoolError::Unauthorized)?;
    if !viewer.is_admin() && viewer.id != user_id {
        return Err(SchoolError::Forbidden(
            "You can only delete your own account".to_string(),
        ));
    }

    let user = storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| SchoolError::not_found("User"))?;
    storage.delete_user(user_id).await?;

    info!("Deleted account {}", user.email);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use school_core::storage::InMemoryStorage;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    fn registration(email: &str, role: Option<&str>) -> Registration {
        Registration {
            email: email.to_string(),
            pseudo: "pseudo".to_string(),
            password: "secret".to_string(),
            role: role.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_and_defaults_role() {
        let storage = InMemoryStorage::new();
        let user = register(&storage, &hasher(), registration("a@school.test", Some("ROLE_SUPER")))
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "secret");

        let err = register(&storage, &hasher(), registration("a@school.test", None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email is already used");
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields() {
        let storage = InMemoryStorage::new();
        let mut input = registration("b@school.test", None);
        input.pseudo = "  ".to_string();
        let err = register(&storage, &hasher(), input).await.unwrap_err();
        assert_eq!(err.code(), "BAD_USER_INPUT");
    }

    #[tokio::test]
    async fn test_login_does_not_reveal_which_part_failed() {
        let storage = InMemoryStorage::new();
        let keys = JwtKeys::new("test-secret", 3600);
        register(&storage, &hasher(), registration("c@school.test", None))
            .await
            .unwrap();

        let (token, user) = login(&storage, &hasher(), &keys, "c@school.test", "secret")
            .await
            .unwrap();
        assert_eq!(keys.verify(&token).unwrap().id, user.id);

        let wrong = login(&storage, &hasher(), &keys, "c@school.test", "nope")
            .await
            .unwrap_err();
        let unknown = login(&storage, &hasher(), &keys, "x@school.test", "secret")
            .await
            .unwrap_err();
        assert_eq!(wrong.to_string(), "Invalid email or password");
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_students_cannot_touch_other_accounts_or_roles() {
        let storage = InMemoryStorage::new();
        let alice = register(&storage, &hasher(), registration("alice@school.test", None))
            .await
            .unwrap();
        let bob = register(&storage, &hasher(), registration("bob@school.test", None))
            .await
            .unwrap();
        let as_alice = Viewer::from(&alice);

        let err = update_user(&storage, &hasher(), Some(&as_alice), bob.id, ProfileChanges::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You can only update your own profile");

        let promote = ProfileChanges {
            role: Some("ROLE_ADMIN".to_string()),
            ..Default::default()
        };
        let err = update_user(&storage, &hasher(), Some(&as_alice), alice.id, promote)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");

        let err = delete_user(&storage, Some(&as_alice), bob.id).await.unwrap_err();
        assert_eq!(err.to_string(), "You can only delete your own account");

        let err = delete_user(&storage, None, bob.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[tokio::test]
    async fn test_update_persists_changes() {
        let storage = InMemoryStorage::new();
        let alice = register(&storage, &hasher(), registration("alice@school.test", None))
            .await
            .unwrap();
        register(&storage, &hasher(), registration("taken@school.test", None))
            .await
            .unwrap();
        let as_alice = Viewer::from(&alice);

        let taken = ProfileChanges {
            email: Some("taken@school.test".to_string()),
            ..Default::default()
        };
        let err = update_user(&storage, &hasher(), Some(&as_alice), alice.id, taken)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email is already used");

        let changes = ProfileChanges {
            email: Some("alice2@school.test".to_string()),
            pseudo: Some("Alice".to_string()),
            password: Some("new-secret".to_string()),
            role: None,
        };
        update_user(&storage, &hasher(), Some(&as_alice), alice.id, changes)
            .await
            .unwrap();

        let stored = storage.get_user_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "alice2@school.test");
        assert_eq!(stored.pseudo, "Alice");
        assert!(hasher().verify("new-secret", &stored.password_hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_may_change_roles_and_delete_others() {
        let storage = InMemoryStorage::new();
        let admin = register(&storage, &hasher(), registration("admin@school.test", Some("ROLE_ADMIN")))
            .await
            .unwrap();
        let bob = register(&storage, &hasher(), registration("bob@school.test", None))
            .await
            .unwrap();
        let as_admin = Viewer::from(&admin);

        let promote = ProfileChanges {
            role: Some("ROLE_ADMIN".to_string()),
            ..Default::default()
        };
        let updated = update_user(&storage, &hasher(), Some(&as_admin), bob.id, promote)
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Admin);

        let deleted = delete_user(&storage, Some(&as_admin), bob.id).await.unwrap();
        assert_eq!(deleted.id, bob.id);
        assert!(storage.get_user_by_id(bob.id).await.unwrap().is_none());

        let err = delete_user(&storage, Some(&as_admin), bob.id).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }
}
