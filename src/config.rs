//! 配置模块
//!
//! Token 引擎唯一必需的配置是签名密钥。密钥在构造时提供一次，
//! 之后只读；TTL 是每次签发时的参数，不属于全局配置。
//!
//! ## 示例
//!
//! ```rust
//! use passport_token::config::PassportConfig;
//!
//! let config = PassportConfig::new("my-secret-key-at-least-32-bytes!").unwrap();
//! assert_eq!(config.secret().len(), 32);
//!
//! // 空密钥会被拒绝
//! assert!(PassportConfig::new("").is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, Result};

/// 默认读取密钥的环境变量名
pub const SECRET_KEY_ENV: &str = "PASSPORT_SECRET_KEY";

/// 签名密钥
///
/// 内部以 `Arc<[u8]>` 存储，克隆开销很小，可在多个线程间共享。
/// `Debug` 输出被屏蔽，密钥不会出现在日志中。
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Arc<[u8]>);

impl SecretKey {
    /// 从任意字节创建密钥
    ///
    /// # Errors
    ///
    /// 密钥为空时返回 [`ConfigError::MissingRequired`]
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ConfigError::MissingRequired("secret_key".to_string()).into());
        }
        Ok(Self(Arc::from(secret)))
    }

    /// 密钥原始字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 密钥长度（字节）
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 密钥是否为空（通过构造函数创建的密钥永远非空）
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

impl AsRef<[u8]> for SecretKey {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Token 引擎配置
#[derive(Debug, Clone)]
pub struct PassportConfig {
    /// 签名密钥
    secret: SecretKey,
}

impl PassportConfig {
    /// 使用指定密钥创建配置
    ///
    /// # 参数
    ///
    /// * `secret` - 签名密钥，建议至少 32 字节
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        Ok(Self {
            secret: SecretKey::new(secret)?,
        })
    }

    /// 从环境变量 `PASSPORT_SECRET_KEY` 读取配置
    ///
    /// # Errors
    ///
    /// 变量未设置或为空时返回 [`ConfigError::MissingRequired`]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(SECRET_KEY_ENV, |key| std::env::var(key).ok())
    }

    /// 通过任意键值来源读取配置
    ///
    /// `lookup` 接收键名并返回对应的值，便于接入配置文件、
    /// 密钥管理服务，或在测试中替代环境变量。
    ///
    /// # Example
    ///
    /// ```rust
    /// use passport_token::config::PassportConfig;
    ///
    /// let config = PassportConfig::from_lookup("APP_SECRET", |key| {
    ///     (key == "APP_SECRET").then(|| "s3cr3t".to_string())
    /// })
    /// .unwrap();
    /// assert_eq!(config.secret().as_bytes(), b"s3cr3t");
    /// ```
    pub fn from_lookup<F>(key: &str, lookup: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        match lookup(key) {
            Some(value) if !value.is_empty() => Self::new(value),
            _ => Err(ConfigError::MissingRequired(key.to_string()).into()),
        }
    }

    /// 获取签名密钥
    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }
}
