//! Form synchronizer: keeps the visible fields, the selected method
//! descriptor and the emitted call model mutually consistent.
//!
//! All transitions go through [`FormSync::apply`], one event at a time, so
//! the whole state machine is testable without a terminal.

use std::collections::BTreeMap;

use frame_metadata::v14::RuntimeMetadataV14;

use crate::domain::call::{CallArg, CallModel};
use crate::domain::options::{self, MethodDescriptor};

/// The events the form reacts to. Keystrokes, list selections and external
/// model updates all funnel through here.
#[derive(Debug, Clone)]
pub enum FormEvent {
    SectionSelected(String),
    MethodSelected(String),
    ArgEdited { name: String, value: String },
    /// A call model supplied from outside the form (hex inspector edit or a
    /// restored session). Reconciled best-effort; mismatches leave the form
    /// blank without raising an error.
    ModelRestored(CallModel),
    MetadataChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    NoSection,
    SectionChosen,
    MethodChosen,
}

/// The flat field mapping backing the form. `values` holds exactly one entry
/// per argument of the selected method; it is rebuilt, never merged, when
/// the method changes, so stale keys cannot leak across methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub section: String,
    pub method: String,
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct FormSync {
    methods: Vec<MethodDescriptor>,
    selected: Option<MethodDescriptor>,
    state: FormState,
}

impl FormSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FormPhase {
        if self.state.section.is_empty() {
            FormPhase::NoSection
        } else if self.selected.is_none() {
            FormPhase::SectionChosen
        } else {
            FormPhase::MethodChosen
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn selected(&self) -> Option<&MethodDescriptor> {
        self.selected.as_ref()
    }

    /// Run one transition. Returns the call model to emit upward, if the
    /// event produced one; `None` means "no change visible outside".
    pub fn apply(&mut self, metadata: &RuntimeMetadataV14, event: FormEvent) -> Option<CallModel> {
        match event {
            FormEvent::SectionSelected(key) => {
                self.enter_section(metadata, &key);
                None
            }
            FormEvent::MethodSelected(name) => {
                let Some(descriptor) = self.methods.iter().find(|m| m.method == name).cloned()
                else {
                    log::debug!("method `{name}` is not in the current list, ignoring");
                    return None;
                };
                self.enter_method(descriptor);
                self.emit()
            }
            FormEvent::ArgEdited { name, value } => {
                let known = self
                    .selected
                    .as_ref()
                    .map_or(false, |d| d.args.iter().any(|a| a.name == name));
                if !known {
                    log::debug!("edit for unknown argument `{name}` dropped");
                    return None;
                }
                self.state.values.insert(name, value);
                self.emit()
            }
            FormEvent::ModelRestored(model) => {
                self.restore(metadata, model);
                None
            }
            FormEvent::MetadataChanged => {
                *self = Self::default();
                None
            }
        }
    }

    /// Switch section: recompute the method list, clear the method and all
    /// argument fields. A benign lookup failure (unknown section, no calls)
    /// just empties the list; a malformed registry entry is logged and the
    /// update dropped, leaving the previous state intact. Returns whether
    /// the switch was applied.
    fn enter_section(&mut self, metadata: &RuntimeMetadataV14, key: &str) -> bool {
        match options::derive_methods(metadata, key) {
            Ok(methods) => {
                self.methods = methods;
            }
            Err(err) if err.is_benign() => {
                log::debug!("no methods for `{key}`: {err}");
                self.methods = Vec::new();
            }
            Err(err) => {
                log::warn!("method lookup for `{key}` failed: {err}");
                return false;
            }
        }
        self.selected = None;
        self.state = FormState {
            section: key.to_string(),
            ..FormState::default()
        };
        true
    }

    /// Full rebuild of the field mapping for the newly selected method;
    /// fields from a previously selected method cannot persist.
    fn enter_method(&mut self, descriptor: MethodDescriptor) {
        self.state = FormState {
            section: self.state.section.clone(),
            method: descriptor.method.clone(),
            values: descriptor
                .args
                .iter()
                .map(|arg| (arg.name.clone(), String::new()))
                .collect(),
        };
        self.selected = Some(descriptor);
    }

    fn restore(&mut self, metadata: &RuntimeMetadataV14, model: CallModel) {
        let sections = options::derive_sections(metadata);
        let Some(section) = sections
            .iter()
            .find(|s| s.key == model.section || s.display == model.section)
        else {
            log::debug!("restored model names unknown section `{}`", model.section);
            return;
        };
        let key = section.key.clone();
        if !self.enter_section(metadata, &key) {
            // The section switch was dropped; matching the method against
            // the previous section's list would garble the form.
            return;
        }

        let Some(descriptor) = self.methods.iter().find(|m| m.method == model.method).cloned()
        else {
            log::debug!("restored model names unknown method `{}`", model.path());
            return;
        };
        self.enter_method(descriptor);

        // Carry over values for arguments the descriptor actually has.
        for arg in &model.args {
            if let Some(slot) = self.state.values.get_mut(&arg.name) {
                *slot = arg.value.clone().unwrap_or_default();
            }
        }
    }

    /// Build the emitted model strictly from the selected descriptor's arg
    /// specs, never from raw form keys: stale keys are structurally excluded.
    fn emit(&self) -> Option<CallModel> {
        let descriptor = self.selected.as_ref()?;
        Some(CallModel {
            section: self.state.section.clone(),
            method: self.state.method.clone(),
            args: descriptor
                .args
                .iter()
                .map(|arg| CallArg {
                    name: arg.name.clone(),
                    ty: arg.ty,
                    value: self
                        .state
                        .values
                        .get(&arg.name)
                        .filter(|v| !v.is_empty())
                        .cloned(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::options::tests::test_metadata;

    fn chosen(sync: &mut FormSync, metadata: &RuntimeMetadataV14) -> Option<CallModel> {
        sync.apply(metadata, FormEvent::SectionSelected("balances".into()));
        sync.apply(metadata, FormEvent::MethodSelected("transfer".into()))
    }

    #[test]
    fn selecting_a_method_rebuilds_the_field_set() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();
        chosen(&mut sync, &metadata);

        let state = sync.state();
        assert_eq!(state.section, "balances");
        assert_eq!(state.method, "transfer");
        let keys: Vec<&str> = state.values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["dest", "value"]);
        assert_eq!(sync.phase(), FormPhase::MethodChosen);
    }

    #[test]
    fn switching_methods_clears_prior_values() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();
        chosen(&mut sync, &metadata);
        sync.apply(
            &metadata,
            FormEvent::ArgEdited {
                name: "value".into(),
                value: "5".into(),
            },
        );

        sync.apply(&metadata, FormEvent::MethodSelected("transfer_all".into()));
        let state = sync.state();
        assert!(!state.values.contains_key("value"));
        let keys: Vec<&str> = state.values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["dest", "keep_alive"]);
        assert!(state.values.values().all(String::is_empty));
    }

    #[test]
    fn emission_follows_descriptor_order_not_map_order() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();
        chosen(&mut sync, &metadata);
        let model = sync
            .apply(
                &metadata,
                FormEvent::ArgEdited {
                    name: "value".into(),
                    value: "100".into(),
                },
            )
            .unwrap();

        assert_eq!(model.section, "balances");
        assert_eq!(model.method, "transfer");
        let names: Vec<&str> = model.args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["dest", "value"]);
        assert_eq!(model.args[0].value, None);
        assert_eq!(model.args[1].value.as_deref(), Some("100"));
    }

    #[test]
    fn unknown_method_selection_is_ignored() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();
        sync.apply(&metadata, FormEvent::SectionSelected("balances".into()));
        assert!(sync
            .apply(&metadata, FormEvent::MethodSelected("mint".into()))
            .is_none());
        assert_eq!(sync.phase(), FormPhase::SectionChosen);
    }

    #[test]
    fn edit_for_stale_argument_is_dropped() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();
        chosen(&mut sync, &metadata);
        sync.apply(&metadata, FormEvent::MethodSelected("transfer_all".into()));

        // `value` belonged to `transfer`, not `transfer_all`.
        assert!(sync
            .apply(
                &metadata,
                FormEvent::ArgEdited {
                    name: "value".into(),
                    value: "5".into(),
                },
            )
            .is_none());
        assert!(!sync.state().values.contains_key("value"));
    }

    #[test]
    fn malformed_calls_type_keeps_last_known_good_state() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();
        chosen(&mut sync, &metadata);

        // "Broken" has a non-variant calls type; the transition is dropped.
        sync.apply(&metadata, FormEvent::SectionSelected("broken".into()));
        assert_eq!(sync.state().section, "balances");
        assert_eq!(sync.phase(), FormPhase::MethodChosen);
    }

    #[test]
    fn restored_model_matches_by_key_or_display() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();

        let model = CallModel {
            section: "Balances".into(), // display name, not key
            method: "transfer".into(),
            args: vec![],
        };
        sync.apply(&metadata, FormEvent::ModelRestored(model));
        assert_eq!(sync.state().section, "balances");
        assert_eq!(sync.state().method, "transfer");
    }

    #[test]
    fn restored_model_with_unknown_method_leaves_fields_blank() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();

        let model = CallModel {
            section: "balances".into(),
            method: "mint".into(),
            args: vec![],
        };
        sync.apply(&metadata, FormEvent::ModelRestored(model));
        assert_eq!(sync.state().section, "balances");
        assert!(sync.state().method.is_empty());
        assert!(sync.state().values.is_empty());
    }

    #[test]
    fn restored_model_with_malformed_section_is_dropped_entirely() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();
        chosen(&mut sync, &metadata);
        sync.apply(
            &metadata,
            FormEvent::ArgEdited {
                name: "dest".into(),
                value: "42".into(),
            },
        );

        // "Broken" resolves as a section but its calls type is not a
        // variant. The restore must drop as a whole, not fall through to
        // the previous section's method list and wipe the typed values.
        let model = CallModel {
            section: "broken".into(),
            method: "transfer".into(),
            args: vec![],
        };
        sync.apply(&metadata, FormEvent::ModelRestored(model));
        assert_eq!(sync.state().section, "balances");
        assert_eq!(sync.state().method, "transfer");
        assert_eq!(
            sync.state().values.get("dest").map(String::as_str),
            Some("42")
        );
    }

    #[test]
    fn metadata_change_resets_everything() {
        let metadata = test_metadata();
        let mut sync = FormSync::new();
        chosen(&mut sync, &metadata);
        sync.apply(&metadata, FormEvent::MetadataChanged);
        assert_eq!(sync.phase(), FormPhase::NoSection);
        assert!(sync.methods().is_empty());
    }
}
