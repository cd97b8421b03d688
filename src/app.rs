//! Application state for the extrinsic builder.
//!
//! `App` owns the session context (endpoints, connection, metadata) and the
//! domain pieces (form synchronizer, call model, inspector). It never talks
//! to the network itself: the event loop in `main.rs` feeds it runtime
//! events and drains its pending requests.

use std::sync::Arc;

use frame_metadata::v14::RuntimeMetadataV14;

use crate::config::AccountConfig;
use crate::domain::{
    derive_sections, CallModel, FormEvent, FormSync, HexField, Inspector, SectionOption,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sections,
    Methods,
    Args,
    Inspector,
}

impl Focus {
    pub fn title(&self) -> &'static str {
        match self {
            Focus::Sections => "Sections",
            Focus::Methods => "Methods",
            Focus::Args => "Arguments",
            Focus::Inspector => "Inspector",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into the selected argument field; committed per keystroke.
    EditArg,
    /// Typing hex into the selected inspector field; committed on Enter.
    EditHex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Connecting,
    Connected,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

pub struct App {
    pub should_quit: bool,
    pub help_open: bool,
    pub focus: Focus,
    pub input_mode: InputMode,
    /// Live text buffer for whichever field is being edited.
    pub input: String,

    pub endpoints: Vec<String>,
    pub endpoint_labels: Vec<String>,
    pub endpoint_index: usize,
    pub chain: Option<String>,
    pub spec_version: Option<u32>,
    pub conn: ConnState,
    /// Latest issued connection request token; completions carrying an
    /// older token are stale and discarded.
    conn_token: u64,

    pub metadata: Option<Arc<RuntimeMetadataV14>>,
    pub sections: Vec<SectionOption>,
    pub form: FormSync,
    pub call: Option<CallModel>,
    pub inspector: Inspector,

    pub section_cursor: usize,
    pub method_cursor: usize,
    pub arg_cursor: usize,
    pub hex_cursor: usize,

    pub account: Option<AccountConfig>,

    pending_switch: Option<(usize, u64)>,
    pending_refresh: Option<u64>,
    pending_submit: Option<CallModel>,

    pub status: Option<(String, StatusLevel)>,
}

impl App {
    pub fn new(
        endpoints: Vec<String>,
        endpoint_labels: Vec<String>,
        account: Option<AccountConfig>,
    ) -> Self {
        Self {
            should_quit: false,
            help_open: false,
            focus: Focus::Sections,
            input_mode: InputMode::Normal,
            input: String::new(),
            endpoints,
            endpoint_labels,
            endpoint_index: 0,
            chain: None,
            spec_version: None,
            conn: ConnState::Connecting,
            conn_token: 1,
            metadata: None,
            sections: Vec::new(),
            form: FormSync::new(),
            call: None,
            inspector: Inspector::new(),
            section_cursor: 0,
            method_cursor: 0,
            arg_cursor: 0,
            hex_cursor: 0,
            account,
            pending_switch: None,
            pending_refresh: None,
            pending_submit: None,
            status: None,
        }
    }

    /// The token the very first connection attempt carries.
    pub fn initial_token(&self) -> u64 {
        self.conn_token
    }

    pub fn latest_token(&self) -> u64 {
        self.conn_token
    }

    fn next_token(&mut self) -> u64 {
        self.conn_token += 1;
        self.conn_token
    }

    pub fn endpoint_display(&self) -> &str {
        self.endpoint_labels
            .get(self.endpoint_index)
            .or_else(|| self.endpoints.get(self.endpoint_index))
            .map(String::as_str)
            .unwrap_or("-")
    }

    pub fn set_status(&mut self, message: impl Into<String>, level: StatusLevel) {
        self.status = Some((message.into(), level));
    }

    // === Runtime event application ===

    pub fn apply_connected(
        &mut self,
        token: u64,
        endpoint_index: usize,
        endpoint: String,
        chain: String,
        spec_version: u32,
        metadata: Arc<RuntimeMetadataV14>,
    ) {
        if token != self.conn_token {
            log::debug!("discarding stale connection result for {endpoint} (token {token})");
            return;
        }
        log::info!("connected to {endpoint} ({chain}, spec {spec_version})");
        // The worker cycles endpoints on its own after failures; adopt the
        // one that actually answered so the header stays truthful.
        if endpoint_index < self.endpoints.len() {
            self.endpoint_index = endpoint_index;
        }
        self.sections = derive_sections(&metadata);
        self.form.apply(&metadata, FormEvent::MetadataChanged);
        self.metadata = Some(metadata);
        self.call = None;
        self.inspector.refresh(None);
        self.section_cursor = 0;
        self.method_cursor = 0;
        self.arg_cursor = 0;
        self.hex_cursor = 0;
        self.conn = ConnState::Connected;
        self.spec_version = Some(spec_version);
        self.set_status(format!("Connected to {chain}"), StatusLevel::Info);
        self.chain = Some(chain);
    }

    pub fn apply_connect_failed(&mut self, token: u64, message: String) {
        if token != self.conn_token {
            log::debug!("discarding stale connection failure (token {token})");
            return;
        }
        self.conn = ConnState::Failed;
        self.set_status(format!("Connection failed: {message}"), StatusLevel::Error);
    }

    pub fn apply_submitted(&mut self, hash: String) {
        self.set_status(format!("Submitted: {hash}"), StatusLevel::Info);
    }

    pub fn apply_submit_failed(&mut self, message: String) {
        self.set_status(format!("Submission failed: {message}"), StatusLevel::Error);
    }

    // === Navigation ===

    pub fn move_up(&mut self) {
        let cursor = self.cursor_mut();
        *cursor = cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.focused_len();
        let cursor = self.cursor_mut();
        if len > 0 && *cursor + 1 < len {
            *cursor += 1;
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.focus {
            Focus::Sections => &mut self.section_cursor,
            Focus::Methods => &mut self.method_cursor,
            Focus::Args => &mut self.arg_cursor,
            Focus::Inspector => &mut self.hex_cursor,
        }
    }

    fn focused_len(&self) -> usize {
        match self.focus {
            Focus::Sections => self.sections.len(),
            Focus::Methods => self.form.methods().len(),
            Focus::Args => self.args_len(),
            Focus::Inspector => self.hex_fields().len(),
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Sections => Focus::Methods,
            Focus::Methods => Focus::Args,
            Focus::Args => Focus::Inspector,
            Focus::Inspector => Focus::Sections,
        };
    }

    pub fn args_len(&self) -> usize {
        self.form.selected().map_or(0, |d| d.args.len())
    }

    /// The inspector fields, top to bottom, matching the rendered order.
    pub fn hex_fields(&self) -> Vec<HexField> {
        let Some(snapshot) = self.inspector.snapshot() else {
            return Vec::new();
        };
        let mut fields = vec![HexField::Section, HexField::Method];
        fields.extend((0..snapshot.args.len()).map(HexField::Arg));
        fields.push(HexField::CallData);
        fields
    }

    // === Form actions ===

    /// Enter on a list row: pick the section or method under the cursor.
    pub fn select_current(&mut self) {
        let Some(metadata) = self.metadata.clone() else {
            return;
        };
        match self.focus {
            Focus::Sections => {
                let Some(section) = self.sections.get(self.section_cursor) else {
                    return;
                };
                let key = section.key.clone();
                self.form.apply(&metadata, FormEvent::SectionSelected(key));
                self.method_cursor = 0;
                self.arg_cursor = 0;
                self.focus = Focus::Methods;
            }
            Focus::Methods => {
                let Some(descriptor) = self.form.methods().get(self.method_cursor) else {
                    return;
                };
                let name = descriptor.method.clone();
                let emitted = self.form.apply(&metadata, FormEvent::MethodSelected(name));
                if let Some(model) = emitted {
                    self.set_call(model);
                }
                self.arg_cursor = 0;
                self.focus = Focus::Args;
            }
            Focus::Args => self.begin_arg_edit(),
            Focus::Inspector => self.begin_hex_edit(),
        }
    }

    fn set_call(&mut self, model: CallModel) {
        self.call = Some(model);
        self.inspector.refresh(self.call.as_ref());
        let fields = self.hex_fields().len();
        if fields > 0 && self.hex_cursor >= fields {
            self.hex_cursor = fields - 1;
        }
    }

    fn arg_name_at(&self, index: usize) -> Option<String> {
        self.form
            .selected()
            .and_then(|d| d.args.get(index))
            .map(|a| a.name.clone())
    }

    pub fn begin_arg_edit(&mut self) {
        let Some(name) = self.arg_name_at(self.arg_cursor) else {
            return;
        };
        self.input = self
            .form
            .state()
            .values
            .get(&name)
            .cloned()
            .unwrap_or_default();
        self.input_mode = InputMode::EditArg;
    }

    /// Each keystroke in an argument field re-emits the call model, keeping
    /// the inspector live, like the original form did.
    pub fn input_char(&mut self, ch: char) {
        self.input.push(ch);
        if self.input_mode == InputMode::EditArg {
            self.commit_arg_input();
        }
    }

    pub fn input_backspace(&mut self) {
        self.input.pop();
        if self.input_mode == InputMode::EditArg {
            self.commit_arg_input();
        }
    }

    fn commit_arg_input(&mut self) {
        let Some(metadata) = self.metadata.clone() else {
            return;
        };
        let Some(name) = self.arg_name_at(self.arg_cursor) else {
            return;
        };
        let emitted = self.form.apply(
            &metadata,
            FormEvent::ArgEdited {
                name,
                value: self.input.clone(),
            },
        );
        if let Some(model) = emitted {
            self.set_call(model);
        }
    }

    pub fn finish_edit(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    // === Hex editing ===

    pub fn begin_hex_edit(&mut self) {
        if !self.inspector.editing() {
            self.set_status("Enable editing first (press e)", StatusLevel::Warn);
            return;
        }
        let fields = self.hex_fields();
        let Some(&field) = fields.get(self.hex_cursor) else {
            return;
        };
        let Some(snapshot) = self.inspector.snapshot() else {
            return;
        };
        let bytes = match field {
            HexField::Section => &snapshot.section,
            HexField::Method => &snapshot.method,
            HexField::Arg(i) => match snapshot.args.get(i) {
                Some(buf) => buf,
                None => return,
            },
            HexField::CallData => &snapshot.call_data,
        };
        self.input = format!("0x{}", hex::encode(bytes));
        self.input_mode = InputMode::EditHex;
    }

    /// Enter in hex-edit mode: push the edit through the inspector and, if
    /// it reverse-matched, feed the rebuilt model back into the form.
    pub fn commit_hex_edit(&mut self) {
        let Some(metadata) = self.metadata.clone() else {
            self.finish_edit();
            return;
        };
        let fields = self.hex_fields();
        let Some(&field) = fields.get(self.hex_cursor) else {
            self.finish_edit();
            return;
        };
        let input = self.input.clone();
        match self.inspector.apply_edit(&metadata, field, &input) {
            Ok(Some(model)) => {
                self.form
                    .apply(&metadata, FormEvent::ModelRestored(model.clone()));
                self.call = Some(model.clone());
                self.inspector.refresh(Some(&model));
                self.set_status(format!("Rebuilt call: {}", model.path()), StatusLevel::Info);
            }
            Ok(None) => match field {
                HexField::CallData => {
                    self.set_status("Call data updated (display only)", StatusLevel::Info)
                }
                _ => self.set_status("No call matches the edited hex", StatusLevel::Warn),
            },
            Err(err) => self.set_status(err.to_string(), StatusLevel::Warn),
        }
        self.finish_edit();
    }

    pub fn toggle_editing(&mut self) {
        self.inspector.toggle_editing();
        let state = if self.inspector.editing() { "on" } else { "off" };
        self.set_status(format!("Hex editing {state}"), StatusLevel::Info);
    }

    /// Hex string of the current call data, for the clipboard.
    pub fn call_data_hex(&self) -> Option<String> {
        self.inspector
            .snapshot()
            .map(|s| format!("0x{}", hex::encode(&s.call_data)))
    }

    // === Requests drained by the event loop ===

    /// Queue a submission. Blocked without a connected account: the
    /// transaction API must not even be reached.
    pub fn request_submit(&mut self) {
        if self.account.is_none() {
            self.set_status("Connect an account to sign and submit", StatusLevel::Warn);
            return;
        }
        let Some(call) = self.call.clone() else {
            self.set_status("Build a call first", StatusLevel::Warn);
            return;
        };
        self.set_status(format!("Submitting {}…", call.path()), StatusLevel::Info);
        self.pending_submit = Some(call);
    }

    pub fn cycle_endpoint(&mut self, forward: bool) {
        if self.endpoints.len() < 2 {
            self.set_status("Only one endpoint configured", StatusLevel::Warn);
            return;
        }
        let len = self.endpoints.len();
        self.endpoint_index = if forward {
            (self.endpoint_index + 1) % len
        } else {
            (self.endpoint_index + len - 1) % len
        };
        let token = self.next_token();
        self.pending_switch = Some((self.endpoint_index, token));
        self.conn = ConnState::Connecting;
        self.set_status(
            format!("Connecting to {}…", self.endpoint_display()),
            StatusLevel::Info,
        );
    }

    pub fn refresh(&mut self) {
        let token = self.next_token();
        self.pending_refresh = Some(token);
        self.conn = ConnState::Connecting;
        self.set_status("Refreshing metadata…", StatusLevel::Info);
    }

    pub fn take_switch_request(&mut self) -> Option<(usize, u64)> {
        self.pending_switch.take()
    }

    pub fn take_refresh_request(&mut self) -> Option<u64> {
        self.pending_refresh.take()
    }

    pub fn take_submit_request(&mut self) -> Option<CallModel> {
        self.pending_submit.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(
            vec!["http://localhost:9933".into()],
            vec!["local".into()],
            None,
        )
    }

    #[test]
    fn submit_without_account_is_blocked() {
        let mut app = app();
        app.call = Some(CallModel {
            section: "balances".into(),
            method: "transfer".into(),
            args: vec![],
        });

        app.request_submit();

        assert!(app.take_submit_request().is_none());
        assert!(matches!(app.status, Some((_, StatusLevel::Warn))));
    }

    #[test]
    fn submit_without_a_call_is_blocked() {
        let mut app = app();
        app.account = Some(crate::config::AccountConfig {
            address: "5Alice".into(),
            sign_command: Some("cat".into()),
        });

        app.request_submit();
        assert!(app.take_submit_request().is_none());

        app.call = Some(CallModel {
            section: "balances".into(),
            method: "transfer".into(),
            args: vec![],
        });
        app.request_submit();
        assert!(app.take_submit_request().is_some());
    }
}
