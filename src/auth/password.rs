use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error(transparent)]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Salted bcrypt hash at `cost`. Runs on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(ok)
}

/// Check `password` against an optional stored hash.
///
/// With no hash (unknown user) the password is hashed anyway at `cost` and
/// `false` returned, so both outcomes spend comparable time.
pub async fn check_credentials(
    password: &str,
    stored_hash: Option<&str>,
    cost: u32,
) -> Result<bool, PasswordError> {
    match stored_hash {
        Some(hash) => verify_password(password, hash).await,
        None => {
            hash_password(password, cost).await?;
            Ok(false)
        }
    }
}
