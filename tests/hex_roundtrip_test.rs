//! Hex inspector round trips: edits that reverse-match rebuild a call model
//! the form can adopt, edits that do not match leave the form alone.

use frame_metadata::v14::{
    ExtrinsicMetadata, PalletCallMetadata, PalletMetadata, RuntimeMetadataV14,
};
use scale_info::meta_type;

use relaycode::domain::inspect::fingerprint;
use relaycode::domain::{FormEvent, FormSync, HexField, Inspector};

#[allow(non_camel_case_types)]
#[derive(scale_info::TypeInfo)]
enum BalancesCall {
    transfer { dest: u64, value: u128 },
    transfer_all { dest: u64, keep_alive: bool },
}

#[allow(non_camel_case_types)]
#[derive(scale_info::TypeInfo)]
enum SystemCall {
    remark { remark: Vec<u8> },
}

fn metadata() -> RuntimeMetadataV14 {
    RuntimeMetadataV14::new(
        vec![
            PalletMetadata {
                name: "System",
                storage: None,
                calls: Some(PalletCallMetadata {
                    ty: meta_type::<SystemCall>(),
                }),
                event: None,
                constants: vec![],
                error: None,
                index: 0,
            },
            PalletMetadata {
                name: "Balances",
                storage: None,
                calls: Some(PalletCallMetadata {
                    ty: meta_type::<BalancesCall>(),
                }),
                event: None,
                constants: vec![],
                error: None,
                index: 5,
            },
        ],
        ExtrinsicMetadata {
            ty: meta_type::<()>(),
            version: 4,
            signed_extensions: vec![],
        },
        meta_type::<()>(),
    )
}

fn built_form(metadata: &RuntimeMetadataV14) -> (FormSync, Inspector) {
    let mut form = FormSync::new();
    form.apply(metadata, FormEvent::SectionSelected("balances".into()));
    let model = form
        .apply(metadata, FormEvent::MethodSelected("transfer".into()))
        .unwrap();

    let mut inspector = Inspector::new();
    inspector.toggle_editing();
    inspector.refresh(Some(&model));
    (form, inspector)
}

#[test]
fn editing_the_method_fingerprint_switches_the_call() {
    let metadata = metadata();
    let (mut form, mut inspector) = built_form(&metadata);

    let target = format!("0x{}", hex::encode(fingerprint("transfer_all")));
    let model = inspector
        .apply_edit(&metadata, HexField::Method, &target)
        .unwrap()
        .expect("a known method fingerprint must reverse-match");

    assert_eq!(model.path(), "balances.transfer_all");
    let names: Vec<&str> = model.args.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["dest", "keep_alive"]);

    // Feeding the rebuilt model back resynchronizes the form.
    form.apply(&metadata, FormEvent::ModelRestored(model));
    assert_eq!(form.state().method, "transfer_all");
    let keys: Vec<&str> = form.state().values.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["dest", "keep_alive"]);
}

#[test]
fn section_edit_without_matching_method_emits_nothing() {
    let metadata = metadata();
    let (form, mut inspector) = built_form(&metadata);

    // "system" is a valid section, but its call list has no method whose
    // fingerprint equals the buffer still holding "transfer".
    let target = format!("0x{}", hex::encode(fingerprint("system")));
    let out = inspector
        .apply_edit(&metadata, HexField::Section, &target)
        .unwrap();
    assert!(out.is_none());

    // The form never saw the edit.
    assert_eq!(form.state().section, "balances");
    assert_eq!(form.state().method, "transfer");
}

#[test]
fn full_roundtrip_survives_section_and_method_edits() {
    let metadata = metadata();
    let (mut form, mut inspector) = built_form(&metadata);

    // Retarget section and method in two steps: system, then remark.
    let section = format!("0x{}", hex::encode(fingerprint("system")));
    assert!(inspector
        .apply_edit(&metadata, HexField::Section, &section)
        .unwrap()
        .is_none());

    let method = format!("0x{}", hex::encode(fingerprint("remark")));
    let model = inspector
        .apply_edit(&metadata, HexField::Method, &method)
        .unwrap()
        .expect("section and method now both match");
    assert_eq!(model.path(), "system.remark");

    form.apply(&metadata, FormEvent::ModelRestored(model.clone()));
    assert_eq!(form.state().section, "system");
    assert_eq!(form.state().method, "remark");

    // A refreshed snapshot of the rebuilt model shows the same fingerprints
    // the edit introduced.
    inspector.refresh(Some(&model));
    let snapshot = inspector.snapshot().unwrap();
    assert_eq!(snapshot.section, fingerprint("system").to_vec());
    assert_eq!(snapshot.method, fingerprint("remark").to_vec());
}
