//! # コントラクトパス
//!
//! `smartContractPath`（"パッケージID/モジュール名"）の解析と、
//! Move識別子・イベント型文字列の組み立て。

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// パッケージIDとモジュール名の組。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractPath {
    /// `0x` プレフィックス付きのパッケージID
    pub package: String,
    /// モジュール名
    pub module: String,
}

impl ContractPath {
    /// "package/module" または "package::module" を解析する。
    pub fn parse(path: &str) -> Result<Self, CoreError> {
        let path = path.trim();
        let (package, module) = path
            .split_once("::")
            .or_else(|| path.split_once('/'))
            .ok_or_else(|| {
                CoreError::InvalidContractPath(format!(
                    "\"パッケージID/モジュール名\" 形式ではありません: {path:?}"
                ))
            })?;

        validate_package_id(package)?;
        validate_identifier(module)?;

        Ok(Self {
            package: package.to_string(),
            module: module.to_string(),
        })
    }

    /// イベント型文字列 (例: "0x2::devnet_nft::MintNFTEvent") を組み立てる。
    pub fn event_type(&self, event_identifier: &str) -> Result<String, CoreError> {
        validate_identifier(event_identifier)?;
        Ok(format!("{}::{}::{}", self.package, self.module, event_identifier))
    }
}

impl FromStr for ContractPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContractPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.package, self.module)
    }
}

/// パッケージIDの検証。`0x` + 1〜64桁の16進数。
pub fn validate_package_id(package: &str) -> Result<(), CoreError> {
    let hex = package.strip_prefix("0x").ok_or_else(|| {
        CoreError::InvalidContractPath(format!("パッケージIDは0xで始まる必要があります: {package:?}"))
    })?;
    if hex.is_empty() || hex.len() > 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidContractPath(format!(
            "パッケージIDが16進数ではありません: {package:?}"
        )));
    }
    Ok(())
}

/// Move識別子の検証。英字または `_` で始まり、英数字と `_` のみ。
pub fn validate_identifier(ident: &str) -> Result<(), CoreError> {
    let mut chars = ident.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') || ident == "_" {
        return Err(CoreError::InvalidContractPath(format!(
            "Move識別子として不正です: {ident:?}"
        )));
    }
    Ok(())
}
