//! # Movegate 署名処理
//!
//! Gatewayが保持するEd25519キーペアで、ノードが構築したトランザクションに署名する。
//!
//! ## アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | 署名 | Ed25519 |
//! | メッセージダイジェスト | Blake2b-256(intent ‖ tx_bytes) |
//! | アドレス導出 | Blake2b-256(flag ‖ 公開鍵) |
//!
//! シリアライズ済み署名は `flag(1) ‖ signature(64) ‖ pubkey(32)` をBase64にしたもの。

use base64::Engine;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signer, Verifier};

pub use ed25519_dalek::{
    Signature as Ed25519Signature, SigningKey as Ed25519SigningKey,
    VerifyingKey as Ed25519VerifyingKey,
};

type Blake2b256 = Blake2b<U32>;

/// Ed25519署名スキームのフラグバイト
pub const ED25519_FLAG: u8 = 0x00;

/// TransactionData用のintent（scope=0, version=0, app_id=Sui）
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// シリアライズ済み署名の長さ（flag + signature + pubkey）
pub const SERIALIZED_SIGNATURE_LEN: usize = 1 + 64 + 32;

/// 署名処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Base64デコードエラー
    #[error("Base64デコードに失敗しました: {0}")]
    InvalidBase64(String),
    /// 秘密鍵の長さ・形式が不正
    #[error("秘密鍵の形式が不正です: {0}")]
    InvalidSecretKey(String),
    /// 署名の長さ・形式が不正
    #[error("署名の形式が不正です: {0}")]
    InvalidSignature(String),
    /// Ed25519署名検証エラー
    #[error("Ed25519署名検証に失敗しました")]
    SignatureVerifyError,
}

/// Base64エンジン（Standard）
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// Blake2b-256ハッシュ計算。
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// トランザクションバイト列の署名対象ダイジェストを計算する。
pub fn transaction_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut message = Vec::with_capacity(TRANSACTION_INTENT.len() + tx_bytes.len());
    message.extend_from_slice(&TRANSACTION_INTENT);
    message.extend_from_slice(tx_bytes);
    blake2b256(&message)
}

/// 公開鍵からSuiアドレス（`0x` + 64桁16進数）を導出する。
pub fn sui_address(verifying_key: &Ed25519VerifyingKey) -> String {
    let mut data = [0u8; 33];
    data[0] = ED25519_FLAG;
    data[1..].copy_from_slice(verifying_key.as_bytes());
    format!("0x{}", hex::encode(blake2b256(&data)))
}

/// Gatewayの署名用キーペア。
pub struct SuiKeypair {
    signing_key: Ed25519SigningKey,
}

impl SuiKeypair {
    /// 秘密鍵から構築する。
    pub fn new(signing_key: Ed25519SigningKey) -> Self {
        Self { signing_key }
    }

    /// Base64エンコードされた秘密鍵から構築する。
    ///
    /// 受け付ける形式:
    /// - 32バイト: Ed25519シード
    /// - 33バイト: スキームフラグ(0x00) ‖ シード（keystore形式）
    /// - 64バイト: シード ‖ 公開鍵
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = b64()
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;

        let seed: [u8; 32] = match bytes.len() {
            32 => to_array(&bytes)?,
            33 => {
                if bytes[0] != ED25519_FLAG {
                    return Err(CryptoError::InvalidSecretKey(format!(
                        "Ed25519以外の署名スキームです: flag=0x{:02x}",
                        bytes[0]
                    )));
                }
                to_array(&bytes[1..])?
            }
            64 => {
                let seed = to_array(&bytes[..32])?;
                let signing_key = Ed25519SigningKey::from_bytes(&seed);
                if signing_key.verifying_key().as_bytes()[..] != bytes[32..] {
                    return Err(CryptoError::InvalidSecretKey(
                        "公開鍵部分が秘密鍵と一致しません".to_string(),
                    ));
                }
                seed
            }
            n => {
                return Err(CryptoError::InvalidSecretKey(format!(
                    "32, 33, 64バイトのいずれかである必要があります（実際: {n}バイト）"
                )))
            }
        };

        Ok(Self::new(Ed25519SigningKey::from_bytes(&seed)))
    }

    /// 公開鍵。
    pub fn verifying_key(&self) -> Ed25519VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// 署名者のSuiアドレス。
    pub fn address(&self) -> String {
        sui_address(&self.verifying_key())
    }

    /// トランザクションバイト列に署名し、シリアライズ済み署名（Base64）を返す。
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let digest = transaction_digest(tx_bytes);
        let signature = self.signing_key.sign(&digest);

        let mut serialized = Vec::with_capacity(SERIALIZED_SIGNATURE_LEN);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(self.verifying_key().as_bytes());
        b64().encode(serialized)
    }
}

/// シリアライズ済み署名（Base64）をトランザクションバイト列に対して検証する。
/// 検証に成功した場合は署名者の公開鍵を返す。
pub fn verify_transaction_signature(
    serialized_b64: &str,
    tx_bytes: &[u8],
) -> Result<Ed25519VerifyingKey, CryptoError> {
    let bytes = b64()
        .decode(serialized_b64)
        .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
    if bytes.len() != SERIALIZED_SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature(format!(
            "{SERIALIZED_SIGNATURE_LEN}バイトである必要があります（実際: {}バイト）",
            bytes.len()
        )));
    }
    if bytes[0] != ED25519_FLAG {
        return Err(CryptoError::InvalidSignature(format!(
            "未対応の署名スキームです: flag=0x{:02x}",
            bytes[0]
        )));
    }

    let sig_arr: [u8; 64] = bytes[1..65]
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature("署名部の長さが不正です".to_string()))?;
    let pk_arr: [u8; 32] = to_array(&bytes[65..])?;
    let verifying_key = Ed25519VerifyingKey::from_bytes(&pk_arr)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    verifying_key
        .verify(&transaction_digest(tx_bytes), &Ed25519Signature::from_bytes(&sig_arr))
        .map_err(|_| CryptoError::SignatureVerifyError)?;
    Ok(verifying_key)
}

fn to_array(bytes: &[u8]) -> Result<[u8; 32], CryptoError> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidSecretKey(format!("32バイトではありません: {}", bytes.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_keypair() -> SuiKeypair {
        SuiKeypair::new(Ed25519SigningKey::generate(&mut rand::rngs::OsRng))
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let keypair = random_keypair();
        let tx_bytes = b"transaction-data";

        let serialized = keypair.sign_transaction(tx_bytes);
        let raw = b64().decode(&serialized).unwrap();
        assert_eq!(raw.len(), SERIALIZED_SIGNATURE_LEN);
        assert_eq!(raw[0], ED25519_FLAG);
        assert_eq!(&raw[65..], keypair.verifying_key().as_bytes());

        let signer = verify_transaction_signature(&serialized, tx_bytes).unwrap();
        assert_eq!(signer, keypair.verifying_key());
    }

    #[test]
    fn test_verify_rejects_other_bytes() {
        let keypair = random_keypair();
        let serialized = keypair.sign_transaction(b"original");
        assert!(matches!(
            verify_transaction_signature(&serialized, b"tampered"),
            Err(CryptoError::SignatureVerifyError)
        ));
    }

    #[test]
    fn test_signature_covers_intent_prefix() {
        // intentなしのバイト列に直接署名したものとは一致しない
        let keypair = random_keypair();
        let tx_bytes = b"payload";
        let direct = keypair.signing_key.sign(&blake2b256(tx_bytes));
        let raw = b64().decode(keypair.sign_transaction(tx_bytes)).unwrap();
        assert_ne!(&raw[1..65], &direct.to_bytes()[..]);
    }

    #[test]
    fn test_from_base64_accepts_all_formats() {
        let keypair = random_keypair();
        let seed = keypair.signing_key.to_bytes();

        let plain = SuiKeypair::from_base64(&b64().encode(seed)).unwrap();

        let mut flagged = vec![ED25519_FLAG];
        flagged.extend_from_slice(&seed);
        let flagged = SuiKeypair::from_base64(&b64().encode(&flagged)).unwrap();

        let mut full = seed.to_vec();
        full.extend_from_slice(keypair.verifying_key().as_bytes());
        let full = SuiKeypair::from_base64(&b64().encode(&full)).unwrap();

        assert_eq!(plain.address(), keypair.address());
        assert_eq!(flagged.address(), keypair.address());
        assert_eq!(full.address(), keypair.address());
    }

    #[test]
    fn test_from_base64_rejects_bad_input() {
        assert!(matches!(
            SuiKeypair::from_base64("not base64!!"),
            Err(CryptoError::InvalidBase64(_))
        ));
        assert!(matches!(
            SuiKeypair::from_base64(&b64().encode([1u8; 16])),
            Err(CryptoError::InvalidSecretKey(_))
        ));

        // secp256k1フラグ付き
        let mut flagged = vec![0x01];
        flagged.extend_from_slice(&[7u8; 32]);
        assert!(matches!(
            SuiKeypair::from_base64(&b64().encode(&flagged)),
            Err(CryptoError::InvalidSecretKey(_))
        ));

        // 公開鍵部分が一致しない64バイト
        let mut mismatched = vec![7u8; 32];
        mismatched.extend_from_slice(&[9u8; 32]);
        assert!(matches!(
            SuiKeypair::from_base64(&b64().encode(&mismatched)),
            Err(CryptoError::InvalidSecretKey(_))
        ));
    }

    #[test]
    fn test_address_format() {
        let address = random_keypair().address();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 66);
        assert!(address[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_blake2b256_known_vector() {
        // Blake2b-256("") のRFC 7693準拠値
        assert_eq!(
            hex::encode(blake2b256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }
}
