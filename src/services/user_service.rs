use bcrypt::{hash, verify};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use crate::errors::{AppError, AppResult};
use crate::models::{normalize_email, LoginForm, SignupForm, User};
use super::persistence::PersistedValue;

/// Signup and login over the persisted user list. The whole list is read and
/// rewritten on every change, so writers are serialised.
#[derive(Clone)]
pub struct UserService {
    users: PersistedValue<Vec<User>>,
    bcrypt_cost: u32,
    write_lock: Arc<Mutex<()>>,
}

fn required(value: &str, field: &'static str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::MissingField(field));
    }
    Ok(())
}

impl UserService {
    pub fn new(users: PersistedValue<Vec<User>>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            bcrypt_cost,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn users(&self) -> AppResult<Vec<User>> {
        Ok(self.users.try_load().await?.unwrap_or_default())
    }

    pub async fn signup(&self, form: SignupForm) -> AppResult<User> {
        required(&form.name, "name")?;
        required(&form.email, "email")?;
        required(&form.password, "password")?;
        let role = form.role.ok_or(AppError::MissingField("role"))?;

        let _guard = self.write_lock.lock().await;
        let mut users = self.users().await?;

        // Linear scan; the list is small and has no index.
        if users.iter().any(|u| u.has_email(&form.email)) {
            tracing::info!("Signup rejected, duplicate email {}", form.email.trim());
            return Err(AppError::DuplicateEmail(normalize_email(&form.email)));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: form.name.trim().to_string(),
            email: normalize_email(&form.email),
            password_hash: hash(form.password.as_bytes(), self.bcrypt_cost)?,
            role,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        self.users.try_save(&users).await?;

        tracing::info!("Account created for {} ({})", user.name, user.role);
        Ok(user)
    }

    pub async fn login(&self, form: LoginForm) -> AppResult<User> {
        required(&form.email, "email")?;
        required(&form.password, "password")?;

        let user = self
            .users()
            .await?
            .into_iter()
            .find(|u| u.has_email(&form.email))
            .ok_or(AppError::InvalidCredentials)?;

        if !verify(&form.password, &user.password_hash)? {
            tracing::debug!("Invalid password for {}", user.email);
            return Err(AppError::InvalidCredentials);
        }

        if let Some(expected) = form.expected_role {
            if user.role != expected {
                return Err(AppError::WrongRole {
                    expected,
                    actual: user.role,
                });
            }
        }

        tracing::info!("Login for {}", user.email);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::kv_store::{KeyValueStore, MemoryStore};
    use crate::services::persistence::USERS_KEY;

    // bcrypt's minimum cost keeps the tests fast.
    fn service() -> (UserService, MemoryStore) {
        let store = MemoryStore::new();
        let users = PersistedValue::new(Arc::new(store.clone()), USERS_KEY);
        (UserService::new(users, 4), store)
    }

    fn signup_form(email: &str, role: Role) -> SignupForm {
        SignupForm {
            name: "Grant Sanderson".into(),
            email: email.into(),
            password: "hunter22".into(),
            role: Some(role),
        }
    }

    fn login_form(email: &str, password: &str, expected_role: Option<Role>) -> LoginForm {
        LoginForm {
            email: email.into(),
            password: password.into(),
            expected_role,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let (service, _) = service();
        service.signup(signup_form("grant@example.com", Role::Parker)).await.unwrap();

        let err = service
            .signup(signup_form("  GRANT@Example.com ", Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(email) if email == "grant@example.com"));
        assert_eq!(service.users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_checks_role_when_asked() {
        let (service, _) = service();
        service.signup(signup_form("admin@example.com", Role::Admin)).await.unwrap();

        let err = service
            .login(login_form("admin@example.com", "hunter22", Some(Role::Parker)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::WrongRole { expected: Role::Parker, actual: Role::Admin }
        ));

        let user = service
            .login(login_form("Admin@Example.com", "hunter22", Some(Role::Admin)))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);

        // No role requirement at all also succeeds.
        assert!(service.login(login_form("admin@example.com", "hunter22", None)).await.is_ok());
    }

    #[tokio::test]
    async fn bad_credentials_are_not_a_role_error() {
        let (service, _) = service();
        service.signup(signup_form("parker@example.com", Role::Parker)).await.unwrap();

        assert!(matches!(
            service.login(login_form("parker@example.com", "wrong", Some(Role::Admin))).await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login(login_form("nobody@example.com", "hunter22", None)).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn passwords_are_stored_hashed() {
        let (service, store) = service();
        service.signup(signup_form("grant@example.com", Role::Parker)).await.unwrap();

        let raw = store.get(USERS_KEY).await.unwrap().unwrap();
        assert!(!raw.contains("hunter22"));
        assert!(raw.contains("\"createdAt\""));
    }

    #[tokio::test]
    async fn signup_requires_every_field() {
        let (service, _) = service();
        let mut form = signup_form("grant@example.com", Role::Parker);
        form.role = None;
        assert!(matches!(service.signup(form).await, Err(AppError::MissingField("role"))));

        let mut form = signup_form("grant@example.com", Role::Parker);
        form.password = String::new();
        assert!(matches!(service.signup(form).await, Err(AppError::MissingField("password"))));
        assert!(service.users().await.unwrap().is_empty());
    }
}
