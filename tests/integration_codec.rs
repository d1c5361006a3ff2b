//! 集成测试：URL 安全 Base64 编解码

use passport_token::codec::{decode, decode_bytes, encode};
use passport_token::random::generate_random_bytes;

/// 测试随机字节的可逆性
#[test]
fn test_random_bytes_invertible() {
    for len in 0..64 {
        let bytes = generate_random_bytes(len).unwrap();
        let encoded = encode(&bytes);

        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));
        assert_eq!(decode_bytes(&encoded).unwrap(), bytes);
    }
}

/// 测试文本的可逆性
#[test]
fn test_text_invertible() {
    for text in ["", "alice", "1700000000", "-42", "emoji 🎫", "a/b+c=d", "\u{0}"] {
        assert_eq!(decode(&encode(text)).unwrap(), text);
    }
}

/// 测试编码长度（无填充）
#[test]
fn test_encoded_length() {
    for len in 0..20usize {
        let encoded = encode(vec![0u8; len]);
        assert_eq!(encoded.len(), (len * 4).div_ceil(3));
    }
}

/// 测试非法输入返回错误而不是 panic
#[test]
fn test_malformed_input_is_error() {
    for input in ["a", "abcde", "****", "YWxp Y2U", "ab=c"] {
        assert!(decode_bytes(input).is_err(), "input {:?}", input);
    }
}
