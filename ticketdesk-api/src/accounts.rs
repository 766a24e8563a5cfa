use std::sync::Arc;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::Deserialize;
use tracing::info;
use ticketdesk_core::pii::Masked;
use ticketdesk_core::{AccountError, NewUser, User, UserRepository};

#[derive(Debug, Deserialize)]
pub struct NewAccount {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: Masked<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Registration and password login.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AccountError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AccountError::Validation(format!("{} is required", field)));
    }
    Ok(value)
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn register(&self, account: NewAccount) -> Result<User, AccountError> {
        let full_name = required("full_name", &account.full_name)?;
        let username = required("username", &account.username)?;
        let email = required("email", &account.email)?;
        if account.password.expose().is_empty() {
            return Err(AccountError::Validation("password is required".to_string()));
        }
        if !email.contains('@') {
            return Err(AccountError::Validation("email is not valid".to_string()));
        }

        if self.users.exists(username, email).await.map_err(AccountError::Store)? {
            return Err(AccountError::AlreadyExists);
        }

        let password_hash = hash_password(account.password.expose())?;
        let phone = account
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let user = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                full_name: full_name.to_string(),
                phone,
                password_hash,
            })
            .await
            .map_err(AccountError::Store)?;

        info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(AccountError::Store)?
            .ok_or(AccountError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AccountError::InvalidCredentials);
        }

        Ok(user)
    }
}

pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketdesk_store::MemoryStore;

    fn account(username: &str, email: &str) -> NewAccount {
        NewAccount {
            full_name: "Nusrat Jahan".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: "s3cret-pass".into(),
            phone: Some("01712345678".to_string()),
        }
    }

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = AccountService::new(Arc::new(MemoryStore::new()));

        let user = service.register(account("nusrat", "nusrat@example.com")).await.unwrap();
        assert_ne!(user.password_hash, "s3cret-pass");

        let logged_in = service.login("nusrat@example.com", "s3cret-pass").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_login_failures_look_alike() {
        let service = AccountService::new(Arc::new(MemoryStore::new()));
        service.register(account("nusrat", "nusrat@example.com")).await.unwrap();

        assert!(matches!(
            service.login("nusrat@example.com", "wrong").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@example.com", "s3cret-pass").await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_validation_and_duplicates() {
        let service = AccountService::new(Arc::new(MemoryStore::new()));

        assert!(matches!(
            service.register(account("", "a@example.com")).await,
            Err(AccountError::Validation(_))
        ));
        assert!(matches!(
            service.register(account("nusrat", "not-an-email")).await,
            Err(AccountError::Validation(_))
        ));

        service.register(account("nusrat", "nusrat@example.com")).await.unwrap();
        assert!(matches!(
            service.register(account("nusrat", "other@example.com")).await,
            Err(AccountError::AlreadyExists)
        ));
    }
}
