//! The external signing seam.
//!
//! Relaycode never signs anything itself: a [`CallSigner`] takes the encoded
//! call data and returns complete extrinsic bytes, the way a wallet
//! extension does in a browser. The shipped implementation shells out to a
//! user-configured command, so any CLI signer can be plugged in.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::Context;

/// Signs encoded call data on behalf of a connected account.
pub trait CallSigner: Send + Sync {
    /// The account address the signature is keyed by.
    fn address(&self) -> &str;

    /// Produce the complete, SCALE-encoded extrinsic for the given call
    /// data. Errors surface to the user as a failed submission.
    fn sign(&self, call_data: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// Pipes hex call data through an external command: the command reads
/// `0x…` call data on stdin and writes `0x…` extrinsic bytes to stdout.
pub struct CommandSigner {
    address: String,
    command: String,
}

impl CommandSigner {
    pub fn new(address: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            command: command.into(),
        }
    }
}

impl CallSigner for CommandSigner {
    fn address(&self) -> &str {
        &self.address
    }

    fn sign(&self, call_data: &[u8]) -> anyhow::Result<Vec<u8>> {
        log::info!("signing via external command for {}", self.address);
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .context("failed to spawn signing command")?;

        {
            let mut stdin = child.stdin.take().context("signing command has no stdin")?;
            writeln!(stdin, "0x{}", hex::encode(call_data))?;
        }

        let output = child
            .wait_with_output()
            .context("signing command did not finish")?;
        if !output.status.success() {
            anyhow::bail!("signing command exited with {}", output.status);
        }

        let text = String::from_utf8(output.stdout).context("signer output is not UTF-8")?;
        let payload = text.trim().trim_start_matches("0x");
        let bytes = hex::decode(payload).context("signer output is not hex")?;
        if bytes.is_empty() {
            anyhow::bail!("signing command produced no extrinsic");
        }
        Ok(bytes)
    }
}
