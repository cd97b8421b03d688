//! JSON-RPC plumbing for a Substrate node: metadata download and decode,
//! call-index encoding, extrinsic submission.
//!
//! Everything type-related stays delegated: argument values are passed
//! through as raw bytes (hex if the user typed hex, UTF-8 otherwise), and
//! the signer seam is responsible for producing a complete extrinsic.

pub mod signer;

pub use signer::{CallSigner, CommandSigner};

use codec::Decode;
use frame_metadata::v14::RuntimeMetadataV14;
use frame_metadata::{RuntimeMetadata, RuntimeMetadataPrefixed};
use scale_info::TypeDef;
use serde::Deserialize;
use serde_json::json;

use crate::domain::call::CallModel;
use crate::domain::options::camel_case;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("rpc transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected rpc response: {0}")]
    UnexpectedResponse(String),
    #[error("metadata bytes: {0}")]
    MetadataHex(#[from] hex::FromHexError),
    #[error("metadata codec: {0}")]
    Codec(#[from] codec::Error),
    #[error("metadata version {0} is not supported (v14 required)")]
    UnsupportedMetadataVersion(u32),
    #[error("no pallet matches section `{0}`")]
    PalletNotFound(String),
    #[error("pallet `{1}` has no call named `{0}`")]
    CallNotFound(String, String),
    #[error("could not find type with id {0}")]
    TypeNotFound(u32),
    #[error("calls type of pallet `{0}` is not a variant")]
    ExpectedVariantType(String),
}

/// Runtime version details, as reported by `state_getRuntimeVersion`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeVersion {
    pub spec_name: String,
    pub spec_version: u32,
}

/// A thin JSON-RPC 2.0 client over HTTP POST.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: normalize_endpoint(endpoint),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        response
            .result
            .ok_or_else(|| ChainError::UnexpectedResponse(format!("{method}: empty result")))
    }

    async fn request_str(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<String, ChainError> {
        let value = self.request(method, params).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ChainError::UnexpectedResponse(format!("{method}: expected a string")))
    }

    pub async fn system_chain(&self) -> Result<String, ChainError> {
        self.request_str("system_chain", json!([])).await
    }

    pub async fn runtime_version(&self) -> Result<RuntimeVersion, ChainError> {
        let value = self.request("state_getRuntimeVersion", json!([])).await?;
        serde_json::from_value(value)
            .map_err(|err| ChainError::UnexpectedResponse(format!("runtime version: {err}")))
    }

    /// Download and decode the runtime metadata. Only V14 is supported;
    /// older chains get a clear error rather than a half-working form.
    pub async fn metadata(&self) -> Result<RuntimeMetadataV14, ChainError> {
        log::debug!("fetching metadata from {}", self.url);
        let hex_str = self.request_str("state_getMetadata", json!([])).await?;
        let bytes = hex::decode(hex_str.trim_start_matches("0x"))?;
        let prefixed = RuntimeMetadataPrefixed::decode(&mut &bytes[..])?;
        match prefixed.1 {
            RuntimeMetadata::V14(metadata) => Ok(metadata),
            other => Err(ChainError::UnsupportedMetadataVersion(other.version())),
        }
    }

    /// Submit a complete, signed extrinsic. Single attempt; the returned
    /// string is the transaction hash.
    pub async fn submit_extrinsic(&self, extrinsic: &[u8]) -> Result<String, ChainError> {
        self.request_str(
            "author_submitExtrinsic",
            json!([format!("0x{}", hex::encode(extrinsic))]),
        )
        .await
    }
}

/// Resolve (section, method) to the pallet/call indexes and append the
/// argument bytes positionally. Order comes straight from the model; a
/// wrong order produces a wrong call, it is not detected here.
pub fn encode_call(
    metadata: &RuntimeMetadataV14,
    call: &CallModel,
) -> Result<Vec<u8>, ChainError> {
    let pallet = metadata
        .pallets
        .iter()
        .find(|pallet| camel_case(&pallet.name) == call.section)
        .ok_or_else(|| ChainError::PalletNotFound(call.section.clone()))?;
    let calls = pallet
        .calls
        .as_ref()
        .ok_or_else(|| ChainError::PalletNotFound(call.section.clone()))?;

    let calls_type = metadata
        .types
        .resolve(calls.ty.id)
        .ok_or(ChainError::TypeNotFound(calls.ty.id))?;
    let variant = match &calls_type.type_def {
        TypeDef::Variant(variant) => variant,
        _ => return Err(ChainError::ExpectedVariantType(pallet.name.clone())),
    };
    let method = variant
        .variants
        .iter()
        .find(|v| v.name == call.method)
        .ok_or_else(|| ChainError::CallNotFound(call.method.clone(), pallet.name.clone()))?;

    let mut out = vec![pallet.index, method.index];
    for arg in &call.args {
        out.extend(arg_bytes(arg.value.as_deref().unwrap_or_default()));
    }
    Ok(out)
}

/// Best-effort argument bytes: `0x…` input is decoded as hex, anything else
/// goes through as UTF-8. Typed SCALE encoding is the signer's problem.
fn arg_bytes(value: &str) -> Vec<u8> {
    let trimmed = value.trim();
    if let Some(payload) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if let Ok(bytes) = hex::decode(payload) {
            return bytes;
        }
    }
    trimmed.as_bytes().to_vec()
}

/// The config accepts ws:// and wss:// endpoints for familiarity; the
/// client speaks HTTP POST, so those schemes are mapped over.
fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if let Some(rest) = trimmed.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("ws://") {
        format!("http://{rest}")
    } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::CallArg;
    use crate::domain::options::tests::test_metadata;

    fn transfer(value: Option<&str>) -> CallModel {
        CallModel {
            section: "balances".into(),
            method: "transfer".into(),
            args: vec![
                CallArg {
                    name: "dest".into(),
                    ty: 1,
                    value: Some("0x0a0b".into()),
                },
                CallArg {
                    name: "value".into(),
                    ty: 2,
                    value: value.map(str::to_string),
                },
            ],
        }
    }

    #[test]
    fn encodes_pallet_and_call_indexes() {
        let metadata = test_metadata();
        let bytes = encode_call(&metadata, &transfer(None)).unwrap();
        // Balances is pallet index 5; `transfer` is the first variant.
        assert_eq!(&bytes[..2], &[5, 0]);
        assert_eq!(&bytes[2..], &[0x0a, 0x0b]);
    }

    #[test]
    fn text_arguments_pass_through_as_utf8() {
        let metadata = test_metadata();
        let bytes = encode_call(&metadata, &transfer(Some("hi"))).unwrap();
        assert_eq!(&bytes[2..], b"\x0a\x0bhi");
    }

    #[test]
    fn unknown_pallet_or_call_is_an_error() {
        let metadata = test_metadata();
        let mut call = transfer(None);
        call.section = "staking".into();
        assert!(matches!(
            encode_call(&metadata, &call),
            Err(ChainError::PalletNotFound(_))
        ));

        let mut call = transfer(None);
        call.method = "mint".into();
        assert!(matches!(
            encode_call(&metadata, &call),
            Err(ChainError::CallNotFound(..))
        ));
    }

    #[test]
    fn endpoints_are_normalized_to_http() {
        assert_eq!(
            normalize_endpoint("wss://rpc.polkadot.io"),
            "https://rpc.polkadot.io"
        );
        assert_eq!(normalize_endpoint("ws://localhost:9944"), "http://localhost:9944");
        assert_eq!(normalize_endpoint("localhost:9933"), "http://localhost:9933");
        assert_eq!(
            normalize_endpoint("https://rpc.polkadot.io"),
            "https://rpc.polkadot.io"
        );
    }
}
