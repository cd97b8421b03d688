//! Two-way view between a call model and its byte-level display.
//!
//! Forward: fingerprint the section name, method name and each argument
//! *name* (the original display hashed names, not encoded values; we keep
//! that documented behavior rather than silently change the hashed subject).
//! Backward: a hex edit is reverse-matched against metadata by recomputing
//! candidate fingerprints, and a fresh call model is emitted only when both
//! the section and the method match.

use frame_metadata::v14::RuntimeMetadataV14;
use sp_core::{blake2_256, twox_128};

use crate::domain::call::{CallArg, CallModel};
use crate::domain::options;

/// 128-bit fingerprint of a name, as shown in the hex pane and used for
/// reverse matching.
pub fn fingerprint(name: &str) -> [u8; 16] {
    twox_128(name.as_bytes())
}

/// The one linear-scan primitive behind every reverse lookup: recompute each
/// candidate's fingerprint and return the first match. O(candidates), fine
/// at metadata scale.
pub fn find_by_fingerprint<'a, I>(candidates: I, target: &[u8]) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .find(|name| fingerprint(name).as_slice() == target)
}

/// The derived byte view of a call model. Disposable: rebuilt in full on
/// every model change, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexSnapshot {
    pub section: Vec<u8>,
    pub method: Vec<u8>,
    pub args: Vec<Vec<u8>>,
    pub call_data: Vec<u8>,
    pub call_hash: [u8; 32],
}

impl HexSnapshot {
    pub fn of(call: &CallModel) -> Self {
        let section = fingerprint(&call.section).to_vec();
        let method = fingerprint(&call.method).to_vec();
        let args: Vec<Vec<u8>> = call
            .args
            .iter()
            .map(|arg| fingerprint(&arg.name).to_vec())
            .collect();
        let (call_data, call_hash) = digest(&section, &method, &args);
        Self {
            section,
            method,
            args,
            call_data,
            call_hash,
        }
    }
}

fn digest(section: &[u8], method: &[u8], args: &[Vec<u8>]) -> (Vec<u8>, [u8; 32]) {
    let mut call_data = Vec::with_capacity(section.len() + method.len() + args.len() * 16);
    call_data.extend_from_slice(section);
    call_data.extend_from_slice(method);
    for arg in args {
        call_data.extend_from_slice(arg);
    }
    let call_hash = blake2_256(&call_data);
    (call_data, call_hash)
}

/// Which buffer a hex edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexField {
    Section,
    Method,
    Arg(usize),
    CallData,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum InspectError {
    #[error("editing is disabled")]
    EditingDisabled,
    #[error("no call to edit")]
    NoSnapshot,
    #[error("`{0}` is not valid hex")]
    InvalidHex(String),
    #[error("argument index {index} is out of range ({len} args)")]
    ArgOutOfRange { index: usize, len: usize },
}

/// Owns the snapshot and the editing toggle. Edits mutate the buffers; a
/// model is emitted only when the edited fingerprints reverse-match.
#[derive(Debug, Default)]
pub struct Inspector {
    editing: bool,
    snapshot: Option<HexSnapshot>,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editing(&self) -> bool {
        self.editing
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn snapshot(&self) -> Option<&HexSnapshot> {
        self.snapshot.as_ref()
    }

    /// Recompute the snapshot from the latest model. Keeps the buffers
    /// length-synchronized with the current argument count.
    pub fn refresh(&mut self, call: Option<&CallModel>) {
        self.snapshot = call.map(HexSnapshot::of);
    }

    /// Apply a raw hex edit to one field. On success returns the
    /// reconstructed model, or `None` when no metadata entry matches the
    /// edited fingerprint (the edit stays in the buffer, nothing is
    /// emitted). Rejections leave all state untouched.
    pub fn apply_edit(
        &mut self,
        metadata: &RuntimeMetadataV14,
        field: HexField,
        input: &str,
    ) -> Result<Option<CallModel>, InspectError> {
        if !self.editing {
            return Err(InspectError::EditingDisabled);
        }
        let bytes = decode_hex_input(input)?;
        let snapshot = self.snapshot.as_mut().ok_or(InspectError::NoSnapshot)?;

        match field {
            HexField::Section => snapshot.section = bytes,
            HexField::Method => snapshot.method = bytes,
            HexField::Arg(index) => {
                if index >= snapshot.args.len() {
                    return Err(InspectError::ArgOutOfRange {
                        index,
                        len: snapshot.args.len(),
                    });
                }
                snapshot.args[index] = bytes;
            }
            HexField::CallData => {
                // Raw call-data edits only update the displayed buffer; there
                // is no fingerprint to reverse-match against.
                snapshot.call_data = bytes;
                snapshot.call_hash = blake2_256(&snapshot.call_data);
                return Ok(None);
            }
        }

        let (call_data, call_hash) = digest(&snapshot.section, &snapshot.method, &snapshot.args);
        snapshot.call_data = call_data;
        snapshot.call_hash = call_hash;

        Ok(self.reconstruct(metadata))
    }

    /// Reverse-match the section and method fingerprints; build arguments
    /// positionally from the matched descriptor, pairing each with the
    /// display text of its buffer. No type-aware decoding happens here.
    fn reconstruct(&self, metadata: &RuntimeMetadataV14) -> Option<CallModel> {
        let snapshot = self.snapshot.as_ref()?;

        let sections = options::derive_sections(metadata);
        let key =
            find_by_fingerprint(sections.iter().map(|s| s.key.as_str()), &snapshot.section)?
                .to_string();

        let methods = match options::derive_methods(metadata, &key) {
            Ok(methods) => methods,
            Err(err) => {
                log::warn!("reverse lookup for `{key}` failed: {err}");
                return None;
            }
        };
        let method =
            find_by_fingerprint(methods.iter().map(|m| m.method.as_str()), &snapshot.method)?
                .to_string();
        let descriptor = methods.iter().find(|m| m.method == method)?;

        let args = descriptor
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| CallArg {
                name: arg.name.clone(),
                ty: arg.ty,
                value: snapshot
                    .args
                    .get(i)
                    .map(|buf| String::from_utf8_lossy(buf).into_owned())
                    .filter(|text| !text.is_empty()),
            })
            .collect();

        Some(CallModel {
            section: key,
            method,
            args,
        })
    }
}

/// Accept hex with or without a `0x` prefix; anything else is rejected.
fn decode_hex_input(input: &str) -> Result<Vec<u8>, InspectError> {
    let trimmed = input.trim();
    let payload = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(payload).map_err(|_| InspectError::InvalidHex(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::options::tests::test_metadata;

    fn transfer_model() -> CallModel {
        CallModel {
            section: "balances".into(),
            method: "transfer".into(),
            args: vec![
                CallArg {
                    name: "dest".into(),
                    ty: 1,
                    value: None,
                },
                CallArg {
                    name: "value".into(),
                    ty: 2,
                    value: Some("5".into()),
                },
            ],
        }
    }

    #[test]
    fn snapshot_concatenates_fingerprints() {
        let snapshot = HexSnapshot::of(&transfer_model());
        assert_eq!(snapshot.section.len(), 16);
        assert_eq!(snapshot.method.len(), 16);
        assert_eq!(snapshot.args.len(), 2);
        assert_eq!(snapshot.call_data.len(), 16 * 4);
        assert_eq!(&snapshot.call_data[..16], snapshot.section.as_slice());
        assert_eq!(&snapshot.call_data[16..32], snapshot.method.as_slice());
        assert_eq!(snapshot.call_hash, blake2_256(&snapshot.call_data));
    }

    #[test]
    fn fingerprints_cover_names_not_values() {
        let mut with_value = transfer_model();
        with_value.args[1].value = Some("999".into());
        assert_eq!(
            HexSnapshot::of(&transfer_model()),
            HexSnapshot::of(&with_value)
        );
    }

    #[test]
    fn roundtrip_recovers_section_and_method() {
        let metadata = test_metadata();
        let mut inspector = Inspector::new();
        inspector.toggle_editing();
        inspector.refresh(Some(&transfer_model()));

        // Re-submit the unmodified section hex; reconstruction should find
        // the same call again.
        let section_hex = format!(
            "0x{}",
            hex::encode(&inspector.snapshot().unwrap().section)
        );
        let model = inspector
            .apply_edit(&metadata, HexField::Section, &section_hex)
            .unwrap()
            .expect("unmodified hex should reverse-match");
        assert_eq!(model.section, "balances");
        assert_eq!(model.method, "transfer");
        assert_eq!(model.args.len(), 2);
    }

    #[test]
    fn tampered_method_hex_emits_nothing() {
        let metadata = test_metadata();
        let mut inspector = Inspector::new();
        inspector.toggle_editing();
        inspector.refresh(Some(&transfer_model()));

        let out = inspector
            .apply_edit(&metadata, HexField::Method, "0xdeadbeef")
            .unwrap();
        assert!(out.is_none());
        // The edit itself sticks in the buffer.
        assert_eq!(
            inspector.snapshot().unwrap().method,
            vec![0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn out_of_range_argument_edit_is_rejected_without_mutation() {
        let metadata = test_metadata();
        let mut inspector = Inspector::new();
        inspector.toggle_editing();
        inspector.refresh(Some(&transfer_model()));
        let before = inspector.snapshot().unwrap().clone();

        let err = inspector
            .apply_edit(&metadata, HexField::Arg(2), "0x00")
            .unwrap_err();
        assert!(matches!(err, InspectError::ArgOutOfRange { index: 2, len: 2 }));
        assert_eq!(inspector.snapshot().unwrap(), &before);
    }

    #[test]
    fn invalid_hex_is_rejected_without_mutation() {
        let metadata = test_metadata();
        let mut inspector = Inspector::new();
        inspector.toggle_editing();
        inspector.refresh(Some(&transfer_model()));
        let before = inspector.snapshot().unwrap().clone();

        let err = inspector
            .apply_edit(&metadata, HexField::Section, "not hex")
            .unwrap_err();
        assert!(matches!(err, InspectError::InvalidHex(_)));
        assert_eq!(inspector.snapshot().unwrap(), &before);
    }

    #[test]
    fn edits_require_editing_mode() {
        let metadata = test_metadata();
        let mut inspector = Inspector::new();
        inspector.refresh(Some(&transfer_model()));

        let err = inspector
            .apply_edit(&metadata, HexField::Section, "0x00")
            .unwrap_err();
        assert!(matches!(err, InspectError::EditingDisabled));
    }

    #[test]
    fn call_data_edit_updates_hash_but_reconstructs_nothing() {
        let metadata = test_metadata();
        let mut inspector = Inspector::new();
        inspector.toggle_editing();
        inspector.refresh(Some(&transfer_model()));

        let out = inspector
            .apply_edit(&metadata, HexField::CallData, "0x0102")
            .unwrap();
        assert!(out.is_none());
        let snapshot = inspector.snapshot().unwrap();
        assert_eq!(snapshot.call_data, vec![1, 2]);
        assert_eq!(snapshot.call_hash, blake2_256(&[1, 2]));
    }

    #[test]
    fn hex_input_accepts_missing_prefix() {
        assert_eq!(decode_hex_input("0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(decode_hex_input("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert!(decode_hex_input("0xzz").is_err());
    }
}
