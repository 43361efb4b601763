use crate::error::AppError;

/// bcrypt work factor used when nothing is configured.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))?
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e).into())
}

/// False for a wrong password and for anything that is not a bcrypt hash.
pub async fn verify_password(password: String, stored: String) -> Result<bool, AppError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored))
        .await
        .map_err(|e| anyhow::anyhow!("Password check task failed: {}", e))?;
    Ok(verified.unwrap_or(false))
}
