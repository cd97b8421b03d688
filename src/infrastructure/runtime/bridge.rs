//! Runtime bridge - connects the sync TUI thread with the async Tokio
//! runtime that talks to the node.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use frame_metadata::v14::RuntimeMetadataV14;
use tokio::runtime::Runtime;

use crate::domain::call::CallModel;
use crate::infrastructure::chain::CallSigner;
use crate::infrastructure::runtime::worker::run_async_worker;

/// Commands sent from the TUI to the async worker.
///
/// Connection-related commands carry a request token issued by the app; the
/// worker tags its responses with the same token so the app can discard
/// completions from attempts it no longer cares about.
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Switch to a different endpoint and reconnect.
    SwitchEndpoint { index: usize, token: u64 },
    /// Re-fetch chain info and metadata on the current connection.
    Refresh { token: u64 },
    /// Sign and submit a completed call. Single attempt.
    Submit { call: CallModel },
    /// Shutdown the worker.
    Shutdown,
}

/// Events sent from the async worker to the TUI.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Connected (or reconnected); carries everything the session needs.
    /// `endpoint_index` identifies which configured endpoint actually
    /// answered, since the worker cycles on its own after failures.
    Connected {
        token: u64,
        endpoint_index: usize,
        endpoint: String,
        chain: String,
        spec_version: u32,
        metadata: Arc<RuntimeMetadataV14>,
    },
    /// A connection attempt failed.
    ConnectFailed { token: u64, message: String },
    /// An extrinsic was accepted; `hash` is the transaction hash.
    Submitted { hash: String },
    /// Signing or submission failed.
    SubmitFailed { message: String },
}

/// Bridge between the sync TUI thread and the async Tokio runtime.
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread with its own Tokio runtime. `initial_token`
    /// tags the first connection attempt.
    pub fn new(
        endpoints: Vec<String>,
        initial_token: u64,
        signer: Option<Arc<dyn CallSigner>>,
    ) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        thread::spawn(move || {
            let rt = match Runtime::new() {
                Ok(rt) => rt,
                Err(err) => {
                    log::error!("failed to create Tokio runtime: {err}");
                    return;
                }
            };
            rt.block_on(async {
                if let Err(err) =
                    run_async_worker(endpoints, initial_token, signer, cmd_rx, evt_tx.clone()).await
                {
                    log::error!("worker exited: {err:#}");
                }
            });
        });

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker.
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("worker channel closed"))
    }

    /// Poll for events (non-blocking).
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
