//! 安全随机数与常量时间比较模块
//!
//! 提供密码学安全的随机数生成（用于生成签名密钥、事件 ID），
//! 以及防止时序攻击的常量时间比较。

use rand::{TryRngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

use crate::error::{CryptoError, Error, Result};

/// 推荐的签名密钥长度（字节）
pub const SECRET_KEY_LENGTH: usize = 32;

/// 生成指定长度的随机字节数组
///
/// 使用操作系统提供的密码学安全随机数生成器 (CSPRNG)
///
/// # Example
///
/// ```rust
/// use passport_token::random::generate_random_bytes;
///
/// let bytes = generate_random_bytes(32).unwrap();
/// assert_eq!(bytes.len(), 32);
/// ```
pub fn generate_random_bytes(length: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Crypto(CryptoError::RngFailed(format!("{:?}", e))))?;
    Ok(bytes)
}

/// 生成指定长度的十六进制随机字符串
///
/// 最终字符串长度为字节数的两倍。
pub fn generate_random_hex(byte_length: usize) -> Result<String> {
    let bytes = generate_random_bytes(byte_length)?;
    Ok(hex_encode(&bytes))
}

/// 生成新的签名密钥
///
/// 256 位随机数据，使用 URL 安全 Base64 编码，适合写入环境变量
/// `PASSPORT_SECRET_KEY`。
///
/// # Example
///
/// ```rust
/// use passport_token::random::generate_secret_key;
///
/// let secret = generate_secret_key().unwrap();
/// assert_eq!(secret.len(), 43);
/// assert!(!secret.contains('='));
/// ```
pub fn generate_secret_key() -> Result<String> {
    let bytes = generate_random_bytes(SECRET_KEY_LENGTH)?;
    Ok(crate::codec::encode(bytes))
}

/// 常量时间比较两个字节切片
///
/// 长度不同时直接返回 `false`，只泄露"长度不同"这一事实；
/// 长度相同时比较耗时与首个不同字节的位置无关。
///
/// # Example
///
/// ```rust
/// use passport_token::random::constant_time_compare;
///
/// assert!(constant_time_compare(b"signature", b"signature"));
/// assert!(!constant_time_compare(b"signature", b"signaturf"));
/// ```
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// 常量时间比较两个字符串
pub fn constant_time_compare_str(a: &str, b: &str) -> bool {
    constant_time_compare(a.as_bytes(), b.as_bytes())
}

/// 将字节数组编码为十六进制字符串
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
