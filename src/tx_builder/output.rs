//! Signed bundle output
//!
//! Offline runs produce one [`SignedBundleEntry`] per signed operation. The
//! [`BundleWriter`] owns one append-only sink per operation kind of the
//! workload and writes each entry as `0x<hex>,` on its own line, so a replay
//! tool can stream every kind independently in generation order.
//!
//! ## Sink layout (relative to the output directory)
//!
//! | workload | kind         | file                                      |
//! |----------|--------------|-------------------------------------------|
//! | token    | mint         | `token-mint/token-mint.out`               |
//! | token    | transfer     | `token-transfer/token-transfer.out`       |
//! | token    | approve      | `token-approve/token-approve.out`         |
//! | token    | transferFrom | `token-transfer-from/token-transfer-from.out` |
//! | swap     | mint         | `swap-mint/swap-token-mint.out`           |
//! | swap     | approve      | `swap-approve/swap-token-approve.out`     |
//! | swap     | swap         | `swap/swap.out`                           |
//!
//! Ordering holds within a sink only; nothing relates lines across sinks.

use super::requests::OperationKind;
use crate::types::Workload;
use alloy_primitives::{Address, Bytes, B256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

/// Record terminator written after every encoded transaction
pub const RECORD_TERMINATOR: &str = ",\n";

/// Errors raised while opening or appending to bundle sinks
#[derive(Error, Debug)]
pub enum BundleError {
    /// Filesystem failure on a sink
    #[error("Bundle sink error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The workload has no sink for this kind
    #[error("No {workload} sink for operation kind {kind}")]
    NoSink {
        workload: Workload,
        kind: OperationKind,
    },
}

impl BundleError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
            ),
            Self::NoSink { .. } => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::NoSink { .. } => "layout",
        }
    }
}

/// A signed, unsubmitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBundleEntry {
    pub kind: OperationKind,
    /// EIP-2718 encoded bytes
    pub raw: Bytes,
    /// `0x`-prefixed lowercase hex of `raw`
    pub encoded: String,
    pub signer: Address,
    pub nonce: u64,
    pub hash: B256,
}

impl SignedBundleEntry {
    pub fn new(kind: OperationKind, raw: Bytes, signer: Address, nonce: u64, hash: B256) -> Self {
        let encoded = format!("0x{}", hex::encode(&raw));
        Self {
            kind,
            raw,
            encoded,
            signer,
            nonce,
            hash,
        }
    }

    /// The line written to a sink
    pub fn record(&self) -> String {
        format!("{}{}", self.encoded, RECORD_TERMINATOR)
    }
}

/// Sink file for `kind` under `workload`, relative to the output directory
pub fn sink_path(workload: Workload, kind: OperationKind) -> Option<&'static str> {
    match (workload, kind) {
        (Workload::Token, OperationKind::Mint) => Some("token-mint/token-mint.out"),
        (Workload::Token, OperationKind::Transfer) => Some("token-transfer/token-transfer.out"),
        (Workload::Token, OperationKind::Approve) => Some("token-approve/token-approve.out"),
        (Workload::Token, OperationKind::TransferFrom) => {
            Some("token-transfer-from/token-transfer-from.out")
        }
        (Workload::Swap, OperationKind::Mint) => Some("swap-mint/swap-token-mint.out"),
        (Workload::Swap, OperationKind::Approve) => Some("swap-approve/swap-token-approve.out"),
        (Workload::Swap, OperationKind::SwapQueue) => Some("swap/swap.out"),
        _ => None,
    }
}

/// Kinds that get a sink for `workload`
pub fn sink_kinds(workload: Workload) -> &'static [OperationKind] {
    match workload {
        Workload::Token => &OperationKind::TOKEN_KINDS,
        Workload::Swap => &[
            OperationKind::Mint,
            OperationKind::Approve,
            OperationKind::SwapQueue,
        ],
    }
}

struct Sink {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: u64,
    unflushed: bool,
}

/// Append-only per-kind sinks for one workload
pub struct BundleWriter {
    workload: Workload,
    root: PathBuf,
    sinks: HashMap<OperationKind, Sink>,
}

impl std::fmt::Debug for BundleWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleWriter")
            .field("workload", &self.workload)
            .field("root", &self.root)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl BundleWriter {
    /// Create (or truncate) every sink of `workload` under `root`
    pub async fn open(root: impl AsRef<Path>, workload: Workload) -> Result<Self, BundleError> {
        let root = root.as_ref().to_path_buf();
        let mut sinks = HashMap::new();

        for &kind in sink_kinds(workload) {
            let relative = sink_path(workload, kind).ok_or(BundleError::NoSink { workload, kind })?;
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| BundleError::io(parent.display().to_string(), e))?;
            }
            let file = File::create(&path)
                .await
                .map_err(|e| BundleError::io(path.display().to_string(), e))?;
            debug!(path = %path.display(), kind = %kind, "Opened bundle sink");
            sinks.insert(
                kind,
                Sink {
                    path,
                    writer: BufWriter::new(file),
                    entries: 0,
                    unflushed: false,
                },
            );
        }

        Ok(Self {
            workload,
            root,
            sinks,
        })
    }

    /// Append one entry to its kind's sink
    pub async fn append(&mut self, entry: &SignedBundleEntry) -> Result<(), BundleError> {
        let workload = self.workload;
        let sink = self.sinks.get_mut(&entry.kind).ok_or(BundleError::NoSink {
            workload,
            kind: entry.kind,
        })?;
        sink.writer
            .write_all(entry.record().as_bytes())
            .await
            .map_err(|e| BundleError::io(sink.path.display().to_string(), e))?;
        sink.entries += 1;
        sink.unflushed = true;
        Ok(())
    }

    /// Flush every sink to disk
    pub async fn flush(&mut self) -> Result<(), BundleError> {
        for sink in self.sinks.values_mut() {
            if !sink.unflushed {
                continue;
            }
            sink.writer
                .flush()
                .await
                .map_err(|e| BundleError::io(sink.path.display().to_string(), e))?;
            sink.unflushed = false;
        }
        Ok(())
    }

    /// Flush and return per-kind entry counts
    pub async fn finish(mut self) -> Result<HashMap<OperationKind, u64>, BundleError> {
        self.flush().await?;
        Ok(self
            .sinks
            .iter()
            .map(|(kind, sink)| (*kind, sink.entries))
            .collect())
    }

    pub fn path_for(&self, kind: OperationKind) -> Option<&Path> {
        self.sinks.get(&kind).map(|sink| sink.path.as_path())
    }

    pub fn entries(&self, kind: OperationKind) -> u64 {
        self.sinks.get(&kind).map(|sink| sink.entries).unwrap_or(0)
    }

    pub fn workload(&self) -> Workload {
        self.workload
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for BundleWriter {
    // Buffered records cannot be flushed from a synchronous drop
    fn drop(&mut self) {
        for (kind, sink) in &self.sinks {
            if sink.unflushed {
                warn!(
                    kind = %kind,
                    path = %sink.path.display(),
                    "BundleWriter dropped with unflushed entries - call finish() before drop"
                );
            }
        }
    }
}
