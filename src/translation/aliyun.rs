//! Alibaba Cloud Machine Translation (`TranslateGeneral`, API version
//! 2018-10-12) over the signed RPC protocol.

use super::{Translate, TranslationError};
use crate::utils::ApiConfig;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;
use std::collections::BTreeMap;
use std::time::Duration;

type HmacSha1 = Hmac<Sha1>;

const API_VERSION: &str = "2018-10-12";
const ACTION: &str = "TranslateGeneral";

/// RFC 3986 unreserved characters stay literal; everything else is encoded.
const RPC_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub struct AliyunTranslator {
    client: Client,
    endpoint: String,
    access_key_id: String,
    access_key_secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TranslateGeneralResponse {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<TranslatedData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TranslatedData {
    #[serde(default)]
    translated: Option<String>,
}

impl AliyunTranslator {
    pub fn new(config: &ApiConfig) -> Result<Self, TranslationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
            access_key_id: config.access_key_id.clone(),
            access_key_secret: config.access_key_secret.clone(),
        })
    }

    fn request_params(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        nonce: &str,
        timestamp: &str,
    ) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("AccessKeyId", self.access_key_id.clone()),
            ("Action", ACTION.to_string()),
            ("Format", "JSON".to_string()),
            ("FormatType", "text".to_string()),
            ("Scene", "general".to_string()),
            ("SignatureMethod", "HMAC-SHA1".to_string()),
            ("SignatureNonce", nonce.to_string()),
            ("SignatureVersion", "1.0".to_string()),
            ("SourceLanguage", source_lang.to_string()),
            ("SourceText", text.to_string()),
            ("TargetLanguage", target_lang.to_string()),
            ("Timestamp", timestamp.to_string()),
            ("Version", API_VERSION.to_string()),
        ])
    }

    fn signed_body(&self, params: &BTreeMap<&'static str, String>) -> Result<String, TranslationError> {
        let canonical = canonical_query(params);
        let signature = sign("POST", &canonical, &self.access_key_secret)?;
        Ok(format!("{}&Signature={}", canonical, percent_encode(&signature)))
    }
}

impl Translate for AliyunTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslationError> {
        let nonce = uuid::Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let params = self.request_params(text, source_lang, target_lang, &nonce, &timestamp);
        let body = self.signed_body(&params)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let payload = response.text().await?;
        if !status.is_success() {
            let (code, message) = match serde_json::from_str::<TranslateGeneralResponse>(&payload) {
                Ok(parsed) => (
                    parsed
                        .code
                        .map(|c| code_to_string(&c))
                        .unwrap_or_else(|| status.as_u16().to_string()),
                    parsed.message.unwrap_or(payload),
                ),
                Err(_) => (status.as_u16().to_string(), payload),
            };
            return Err(TranslationError::ApiError { code, message });
        }

        let parsed: TranslateGeneralResponse = serde_json::from_str(&payload)
            .map_err(|e| TranslationError::DecodeError(e.to_string()))?;
        extract_translation(parsed, text)
    }
}

/// A response without `Data.Translated` keeps the source text.
fn extract_translation(
    response: TranslateGeneralResponse,
    source: &str,
) -> Result<String, TranslationError> {
    if let Some(code) = response.code.as_ref().map(code_to_string) {
        if code != "200" {
            return Err(TranslationError::ApiError {
                code,
                message: response.message.unwrap_or_default(),
            });
        }
    }

    Ok(response
        .data
        .and_then(|d| d.translated)
        .unwrap_or_else(|| source.to_string()))
}

fn code_to_string(code: &serde_json::Value) -> String {
    match code {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, RPC_ENCODE_SET).to_string()
}

fn canonical_query(params: &BTreeMap<&'static str, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn sign(method: &str, canonical_query: &str, secret: &str) -> Result<String, TranslationError> {
    let string_to_sign = format!(
        "{}&{}&{}",
        method,
        percent_encode("/"),
        percent_encode(canonical_query)
    );

    let mut mac = HmacSha1::new_from_slice(format!("{}&", secret).as_bytes())
        .map_err(|e| TranslationError::SignatureError(e.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> AliyunTranslator {
        let config = ApiConfig {
            access_key_id: "testid".to_string(),
            access_key_secret: "testsecret".to_string(),
            ..ApiConfig::default()
        };
        AliyunTranslator::new(&config).unwrap()
    }

    #[test]
    fn percent_encoding_follows_rfc3986() {
        assert_eq!(percent_encode("a b*c~d-e_f.g"), "a%20b%2Ac~d-e_f.g");
        assert_eq!(percent_encode("2024-01-01T00:00:00Z"), "2024-01-01T00%3A00%3A00Z");
        assert_eq!(percent_encode("你"), "%E4%BD%A0");
        assert_eq!(percent_encode("/"), "%2F");
    }

    #[test]
    fn canonical_query_is_sorted_by_key() {
        let t = translator();
        let params = t.request_params("Hi there", "en", "zh", "nonce-1", "2024-01-01T00:00:00Z");
        let query = canonical_query(&params);

        assert!(query.starts_with("AccessKeyId=testid&Action=TranslateGeneral&Format=JSON"));
        assert!(query.contains("&SourceText=Hi%20there&"));
        assert!(query.ends_with("&Timestamp=2024-01-01T00%3A00%3A00Z&Version=2018-10-12"));
    }

    #[test]
    fn signature_is_deterministic_and_key_dependent() {
        let a = sign("POST", "A=1&B=2", "secret").unwrap();
        let b = sign("POST", "A=1&B=2", "secret").unwrap();
        let c = sign("POST", "A=1&B=2", "other").unwrap();
        let d = sign("GET", "A=1&B=2", "secret").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        // HMAC-SHA1 digests are 20 bytes, 28 base64 characters.
        assert_eq!(a.len(), 28);
        assert!(a.ends_with('='));
    }

    #[test]
    fn signed_body_appends_encoded_signature() {
        let t = translator();
        let params = t.request_params("x", "en", "zh", "n", "t");
        let body = t.signed_body(&params).unwrap();

        let (query, signature) = body.rsplit_once("&Signature=").unwrap();
        assert_eq!(query, canonical_query(&params));
        assert!(!signature.contains('='));
        assert!(!signature.contains('+'));
        assert!(!signature.contains('/'));
    }

    #[test]
    fn extracts_translated_text() {
        let response: TranslateGeneralResponse = serde_json::from_str(
            r#"{"RequestId":"r","Code":"200","Data":{"Translated":"你好","WordCount":"5"}}"#,
        )
        .unwrap();
        assert_eq!(extract_translation(response, "Hello").unwrap(), "你好");
    }

    #[test]
    fn numeric_success_code_is_accepted() {
        let response: TranslateGeneralResponse =
            serde_json::from_str(r#"{"Code":200,"Data":{"Translated":"好"}}"#).unwrap();
        assert_eq!(extract_translation(response, "good").unwrap(), "好");
    }

    #[test]
    fn missing_translation_keeps_source() {
        let response: TranslateGeneralResponse =
            serde_json::from_str(r#"{"RequestId":"r","Data":{}}"#).unwrap();
        assert_eq!(extract_translation(response, "Hello").unwrap(), "Hello");
    }

    #[test]
    fn error_code_is_reported() {
        let response: TranslateGeneralResponse = serde_json::from_str(
            r#"{"Code":"InvalidAccessKeyId.NotFound","Message":"Specified access key is not found."}"#,
        )
        .unwrap();
        let err = extract_translation(response, "Hello").unwrap_err();
        assert!(matches!(
            err,
            TranslationError::ApiError { ref code, .. } if code == "InvalidAccessKeyId.NotFound"
        ));
    }
}
