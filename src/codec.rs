//! URL 安全的 Base64 编解码模块
//!
//! Token 的前三段使用 URL 安全字母表（`-`、`_`）且不带 `=` 填充，
//! 可以直接放入 URL、Header 或 Cookie 中传输。签名段则保持标准
//! Base64（带填充），见 [`encode_signature`]。
//!
//! ## 示例
//!
//! ```rust
//! use passport_token::codec::{decode, encode};
//!
//! let encoded = encode("alice");
//! assert_eq!(encoded, "YWxpY2U");
//! assert_eq!(decode(&encoded).unwrap(), "alice");
//! ```

use base64::{
    Engine, alphabet,
    engine::{
        DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
        general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    },
};

use crate::error::{Result, TokenError};

/// 解码时 `=` 填充可有可无
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 将任意字节编码为 URL 安全、无填充的 Base64 字符串
///
/// 对任何输入都不会失败。
///
/// # Example
///
/// ```rust
/// use passport_token::codec::encode;
///
/// let encoded = encode([0xfb, 0xff]);
/// assert_eq!(encoded, "-_8");
/// ```
pub fn encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// 解码 URL 安全 Base64 并按 UTF-8 解释为文本
///
/// # Errors
///
/// 输入不是合法的 Base64，或解码结果不是合法 UTF-8 时返回
/// [`TokenError::DecodingFailed`]。
pub fn decode(input: &str) -> Result<String> {
    let bytes = decode_bytes(input)?;
    String::from_utf8(bytes)
        .map_err(|e| TokenError::DecodingFailed(format!("invalid utf-8: {}", e)).into())
}

/// 解码 URL 安全 Base64 为原始字节
///
/// 同时接受带 `=` 填充和不带填充的输入。
pub fn decode_bytes(input: &str) -> Result<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(input)
        .map_err(|e| TokenError::DecodingFailed(e.to_string()).into())
}

/// 使用标准 Base64（带填充）编码签名摘要
pub fn encode_signature(digest: &[u8]) -> String {
    STANDARD.encode(digest)
}
