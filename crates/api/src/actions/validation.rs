// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Argument checks shared by the action argument types
//!
//! Every helper trims its input and reports failures as
//! [`ApiError::Validation`], so an invalid call never reaches an upstream.

use std::sync::LazyLock;

use api_client::{ApiError, ApiResult};
use regex::Regex;

static TXID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{64}$").expect("txid regex is valid"));

static GENESIS_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{64}i\d+$").expect("inscription id regex is valid"));

static INSCRIPTION_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("inscription number regex is valid"));

/// Trimmed, non-empty required string
pub fn required(field: &str, value: String) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trimmed optional string; blank values count as absent
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Inscription ID (`<txid>i<index>`) or inscription number
pub fn inscription_ref(field: &str, value: String) -> ApiResult<String> {
    let value = required(field, value)?;
    if GENESIS_ID_REGEX.is_match(&value) || INSCRIPTION_NUMBER_REGEX.is_match(&value) {
        Ok(value)
    } else {
        Err(ApiError::validation(format!(
            "{field} must be an inscription ID ({{txid}}i{{index}}) or an inscription number, got '{value}'"
        )))
    }
}

/// Inscription ID in `<txid>i<index>` form only
pub fn genesis_id(field: &str, value: String) -> ApiResult<String> {
    let value = required(field, value)?;
    if GENESIS_ID_REGEX.is_match(&value) {
        Ok(value)
    } else {
        Err(ApiError::validation(format!(
            "{field} must be an inscription ID ({{txid}}i{{index}}), got '{value}'"
        )))
    }
}

/// Bitcoin transaction ID, 64 hex characters
pub fn txid(field: &str, value: String) -> ApiResult<String> {
    let value = required(field, value)?;
    if TXID_REGEX.is_match(&value) {
        Ok(value)
    } else {
        Err(ApiError::validation(format!(
            "{field} must be a 64 character hex transaction ID, got '{value}'"
        )))
    }
}

/// Satoshi ordinal, decimal digits only
pub fn sat_ordinal(field: &str, value: String) -> ApiResult<String> {
    let value = required(field, value)?;
    if value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(value)
    } else {
        Err(ApiError::validation(format!(
            "{field} must be a decimal sat ordinal, got '{value}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXID: &str = "6fb976ab49dcec017f1e201e84395983204ae1a7c2abf7ced0a85d692e442799";

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("ticker", "  ordi ".to_string()).unwrap(), "ordi");
        let err = required("ticker", "   ".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: ticker must not be empty");
    }

    #[test]
    fn optional_drops_blank() {
        assert_eq!(optional(Some(" ".to_string())), None);
        assert_eq!(optional(Some(" a ".to_string())), Some("a".to_string()));
        assert_eq!(optional(None), None);
    }

    #[test]
    fn inscription_refs() {
        assert!(inscription_ref("id", format!("{TXID}i0")).is_ok());
        assert!(inscription_ref("id", "12345".to_string()).is_ok());
        assert!(inscription_ref("id", "-7".to_string()).is_ok());

        assert!(inscription_ref("id", TXID.to_string()).is_err());
        assert!(inscription_ref("id", format!("{TXID}i")).is_err());
        assert!(inscription_ref("id", "abc".to_string()).is_err());
    }

    #[test]
    fn genesis_ids_reject_numbers() {
        assert!(genesis_id("id", format!("{TXID}i12")).is_ok());
        assert!(genesis_id("id", "12".to_string()).is_err());
    }

    #[test]
    fn txids() {
        assert!(txid("txid", TXID.to_uppercase()).is_ok());
        assert!(txid("txid", TXID[..63].to_string()).is_err());
        assert!(txid("txid", format!("{}g", &TXID[..63])).is_err());
    }

    #[test]
    fn sat_ordinals() {
        assert!(sat_ordinal("ordinal", "1857578125803250".to_string()).is_ok());
        assert!(sat_ordinal("ordinal", "-1".to_string()).is_err());
        assert!(sat_ordinal("ordinal", "1.5".to_string()).is_err());
    }
}
