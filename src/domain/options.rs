//! Derive selectable sections and methods from runtime metadata.
//!
//! The metadata gives us pallets; each pallet that exposes calls points at a
//! variant type in the portable registry, one variant per callable method.
//! These functions flatten that shape into small, UI-ready descriptors.

use frame_metadata::v14::RuntimeMetadataV14;
use scale_info::TypeDef;

/// A selectable pallet. `key` is the camel-cased name used for lookups,
/// `display` the raw name from metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOption {
    pub key: String,
    pub display: String,
}

/// One typed argument of a call. `ty` is an id into the portable type
/// registry; we never interpret it ourselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub ty: u32,
}

/// A callable method within a section. Argument order matches the positional
/// order the encoder expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub section: String,
    pub method: String,
    pub args: Vec<ArgSpec>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OptionsError {
    #[error("no pallet matches section `{0}`")]
    SectionNotFound(String),
    #[error("pallet `{0}` exposes no calls")]
    NoCalls(String),
    #[error("could not find type with id {0}")]
    TypeNotFound(u32),
    #[error("expected the calls type to be a variant, got {got}")]
    ExpectedVariantType { got: String },
}

impl OptionsError {
    /// A missing section or calls type just means "nothing to show"; a
    /// malformed registry entry means the metadata broke our assumptions.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            OptionsError::SectionNotFound(_) | OptionsError::NoCalls(_)
        )
    }
}

/// List the pallets that expose at least one call, in metadata order.
pub fn derive_sections(metadata: &RuntimeMetadataV14) -> Vec<SectionOption> {
    metadata
        .pallets
        .iter()
        .filter(|pallet| pallet.calls.is_some())
        .map(|pallet| SectionOption {
            key: camel_case(&pallet.name),
            display: pallet.name.clone(),
        })
        .collect()
}

/// List the methods of the pallet whose camel-cased name equals
/// `section_key`, preserving the variant field order as argument order.
pub fn derive_methods(
    metadata: &RuntimeMetadataV14,
    section_key: &str,
) -> Result<Vec<MethodDescriptor>, OptionsError> {
    let pallet = metadata
        .pallets
        .iter()
        .find(|pallet| camel_case(&pallet.name) == section_key)
        .ok_or_else(|| OptionsError::SectionNotFound(section_key.to_string()))?;

    let calls = pallet
        .calls
        .as_ref()
        .ok_or_else(|| OptionsError::NoCalls(pallet.name.clone()))?;

    let calls_type = metadata
        .types
        .resolve(calls.ty.id)
        .ok_or(OptionsError::TypeNotFound(calls.ty.id))?;

    // The calls type must be a variant ("enum") type; everything downstream
    // relies on that shape.
    let variant = match &calls_type.type_def {
        TypeDef::Variant(variant) => variant,
        other => {
            return Err(OptionsError::ExpectedVariantType {
                got: format!("{other:?}"),
            })
        }
    };

    Ok(variant
        .variants
        .iter()
        .map(|call| MethodDescriptor {
            section: section_key.to_string(),
            method: call.name.clone(),
            args: call
                .fields
                .iter()
                .map(|field| ArgSpec {
                    name: field.name.clone().unwrap_or_default(),
                    ty: field.ty.id,
                })
                .collect(),
        })
        .collect())
}

/// Camel-case an identifier the way pallet names are keyed: `Balances` ->
/// `balances`, `ParasSudoWrapper` -> `parasSudoWrapper`, `XCMPallet` ->
/// `xcmPallet`. Runs of uppercase are treated as one word.
pub fn camel_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            let prev_upper = chars[i - 1].is_uppercase();
            let next_lower = chars.get(i + 1).map_or(false, |c| c.is_lowercase());
            if !prev_upper || next_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut out = String::with_capacity(input.len());
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut rest = lower.chars();
            if let Some(first) = rest.next() {
                out.extend(first.to_uppercase());
                out.push_str(rest.as_str());
            }
        }
    }
    out
}
