use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!("hash password: {e}")
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!("parse password hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Read-only description of a stored hash for the admin change page,
/// e.g. `algorithm: argon2id version: 19 params: m=19456,t=2,p=1 salt: Qm9n******`.
pub fn hash_summary(hash: &str) -> String {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return "Invalid password format or unknown hashing algorithm.".to_string();
    };

    let mut summary = format!("algorithm: {}", parsed.algorithm);
    if let Some(version) = parsed.version {
        summary.push_str(&format!(" version: {version}"));
    }
    if !parsed.params.is_empty() {
        summary.push_str(&format!(" params: {}", parsed.params));
    }
    if let Some(salt) = parsed.salt {
        let salt = salt.as_str();
        let shown: String = salt.chars().take(4).collect();
        summary.push_str(&format!(" salt: {shown}{}", "*".repeat(salt.len().saturating_sub(4))));
    }
    summary
}
