use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Sign-up password policy. Returns the first rule that fails.
pub fn validate_password(password: &str, email: &str) -> Result<(), &'static str> {
    lazy_static! {
        static ref SYMBOL_OR_DIGIT: Regex = Regex::new(r#"[!@#$%^&*(),.?":{}|<>0-9]"#).unwrap();
    }

    if password.contains(' ') {
        return Err("password cannot contain spaces");
    }
    if password.chars().count() < 8 {
        return Err("password must be at least 8 characters");
    }
    if !SYMBOL_OR_DIGIT.is_match(password) {
        return Err("password must contain at least one symbol or number");
    }

    let password = password.to_lowercase();
    let email = email.to_lowercase();
    if password.contains(&email) {
        return Err("password cannot include your email address");
    }
    if let Some(local) = email.split('@').next().filter(|l| !l.is_empty()) {
        if password.contains(local) {
            return Err("password cannot include your email username");
        }
    }
    Ok(())
}
