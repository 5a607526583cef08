use async_trait::async_trait;
use domain::PasswordHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("hashing failed: {0}")]
    Hash(String),
    #[error("verification failed: {0}")]
    Verify(String),
}

/// 密码哈希抽象（私有房间密码）
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, raw: &str) -> Result<PasswordHash, PasswordHasherError>;
    async fn verify(&self, raw: &str, hash: &PasswordHash)
        -> Result<bool, PasswordHasherError>;
}

/// bcrypt 实现
///
/// 哈希计算放到阻塞线程池，避免卡住异步调度器。
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, raw: &str) -> Result<PasswordHash, PasswordHasherError> {
        let raw = raw.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(raw, cost))
            .await
            .map_err(|err| PasswordHasherError::Hash(err.to_string()))?
            .map_err(|err| PasswordHasherError::Hash(err.to_string()))?;

        PasswordHash::new(hashed).map_err(|err| PasswordHasherError::Hash(err.to_string()))
    }

    async fn verify(
        &self,
        raw: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let raw = raw.to_owned();
        let hash = hash.as_str().to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(raw, &hash))
            .await
            .map_err(|err| PasswordHasherError::Verify(err.to_string()))?
            .map_err(|err| PasswordHasherError::Verify(err.to_string()))
    }
}
