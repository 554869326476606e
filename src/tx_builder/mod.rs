//! Transaction Builder
//!
//! Everything between "the workload wants this call" and "here are signed
//! bytes":
//!
//! - **amounts**: token pair canonicalization and the proportional split
//! - **requests**: typed operation requests and ABI encoding
//! - **signer**: nonce/gas/chain-id population and offline signing
//! - **output**: signed entries and the per-kind bundle sinks
//! - **errors**: error taxonomy with observability hooks
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use txbench::nonce_manager::NonceLedger;
//! use txbench::rpc_manager::RpcChainClient;
//! use txbench::tx_builder::{OfflineSigner, RequestBuilder};
//! use txbench::types::TokenHandle;
//! use txbench::wallet::IdentitySet;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = RpcChainClient::connect(
//!     "http://127.0.0.1:8545",
//!     std::time::Duration::from_millis(200),
//!     std::time::Duration::from_secs(60),
//! )?;
//! let signer = OfflineSigner::new(Arc::new(client), Arc::new(NonceLedger::new()));
//! let ids = IdentitySet::from_keys(&["ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"])?;
//! let token = TokenHandle::new(0, "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse()?);
//!
//! let request = RequestBuilder::default().mint(
//!     ids.funding(),
//!     &token,
//!     ids.funding().address(),
//!     alloy_primitives::U256::from(1u64),
//! )?;
//! let entry = signer.sign_offline(ids.funding(), &request).await?;
//! println!("{}", entry.encoded);
//! # Ok(())
//! # }
//! ```

pub mod amounts;
pub mod errors;
pub mod output;
pub mod requests;
pub mod signer;

pub use amounts::{mint_amounts, split, OrderedPair, SplitAmounts};
pub use errors::TransactionBuilderError;
pub use output::{BundleError, BundleWriter, SignedBundleEntry};
pub use requests::{
    OperationCall, OperationKind, OperationRequest, RequestBuilder, TxOverrides,
};
pub use signer::OfflineSigner;
