//! Async worker - runs in the Tokio runtime, owns the node connection.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use frame_metadata::v14::RuntimeMetadataV14;

use crate::infrastructure::chain::{encode_call, CallSigner, RpcClient};
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent};

struct Session {
    client: RpcClient,
    metadata: Arc<RuntimeMetadataV14>,
}

/// Run the async worker loop: connect (retrying, cycling endpoints on
/// failure), then service commands until shutdown.
pub async fn run_async_worker(
    endpoints: Vec<String>,
    initial_token: u64,
    signer: Option<Arc<dyn CallSigner>>,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    if endpoints.is_empty() {
        anyhow::bail!("no endpoints configured");
    }

    let mut endpoint_index = 0usize;
    let mut token = initial_token;
    let mut session: Option<Session> = None;

    loop {
        if session.is_none() {
            let endpoint = endpoints[endpoint_index].clone();
            match connect(&endpoint, endpoint_index, token, &evt_tx).await {
                Ok(connected) => session = Some(connected),
                Err(err) => {
                    log::warn!("connection to {endpoint} failed: {err:#}");
                    let _ = evt_tx.send(RuntimeEvent::ConnectFailed {
                        token,
                        message: format!("{err:#}"),
                    });
                    // Try the next endpoint if there is one.
                    if endpoints.len() > 1 {
                        endpoint_index = (endpoint_index + 1) % endpoints.len();
                    }
                    tokio::time::sleep(Duration::from_millis(900)).await;
                    continue;
                }
            }
        }

        // Service commands (non-blocking), then idle briefly.
        loop {
            match cmd_rx.try_recv() {
                Ok(RuntimeCommand::Shutdown) => return Ok(()),
                Ok(RuntimeCommand::SwitchEndpoint {
                    index,
                    token: new_token,
                }) => {
                    if index >= endpoints.len() {
                        log::warn!("invalid endpoint index {index}");
                        continue;
                    }
                    endpoint_index = index;
                    token = new_token;
                    session = None;
                    break;
                }
                Ok(RuntimeCommand::Refresh { token: new_token }) => {
                    token = new_token;
                    session = None;
                    break;
                }
                Ok(RuntimeCommand::Submit { call }) => {
                    let Some(ref active) = session else {
                        let _ = evt_tx.send(RuntimeEvent::SubmitFailed {
                            message: "not connected".to_string(),
                        });
                        continue;
                    };
                    let event = match submit(active, signer.as_deref(), &call).await {
                        Ok(hash) => RuntimeEvent::Submitted { hash },
                        Err(err) => RuntimeEvent::SubmitFailed {
                            message: format!("{err:#}"),
                        },
                    };
                    let _ = evt_tx.send(event);
                }
                Err(TryRecvError::Empty) => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
    }
}

async fn connect(
    endpoint: &str,
    endpoint_index: usize,
    token: u64,
    evt_tx: &Sender<RuntimeEvent>,
) -> Result<Session> {
    let client = RpcClient::new(endpoint);
    log::info!("connecting to {}", client.url());

    let chain = client.system_chain().await?;
    let version = client.runtime_version().await?;
    let metadata = Arc::new(client.metadata().await?);

    let _ = evt_tx.send(RuntimeEvent::Connected {
        token,
        endpoint_index,
        endpoint: client.url().to_string(),
        chain,
        spec_version: version.spec_version,
        metadata: Arc::clone(&metadata),
    });

    Ok(Session { client, metadata })
}

/// Resolve, sign, send. The signer produces the full extrinsic bytes; we
/// never retry.
async fn submit(
    session: &Session,
    signer: Option<&dyn CallSigner>,
    call: &crate::domain::call::CallModel,
) -> Result<String> {
    let signer = signer.ok_or_else(|| anyhow::anyhow!("no signing command configured"))?;
    let call_data = encode_call(&session.metadata, call)?;
    log::info!(
        "submitting {} as {} ({} bytes of call data)",
        call.path(),
        signer.address(),
        call_data.len()
    );
    let extrinsic = signer.sign(&call_data)?;
    let hash = session.client.submit_extrinsic(&extrinsic).await?;
    Ok(hash)
}
