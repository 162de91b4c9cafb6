use bitcoin::{Network, OutPoint};
use thiserror::Error;

use crate::types::ScriptFamily;

/// Everything that can abort a forge call. Each variant keeps the context a
/// caller needs to branch on; there are no partial results and no retries.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("not enough inputs or outputs: {inputs} inputs, {outputs} outputs")]
    InsufficientParts { inputs: usize, outputs: usize },

    #[error("invalid fee rate: {fee_rate}")]
    InvalidFeeRate { fee_rate: u64 },

    #[error("network must be set")]
    MissingNetwork,

    #[error("malformed txid {txid}: {reason}")]
    MalformedInput { txid: String, reason: String },

    #[error("key derivation failed: {reason}")]
    KeyDerivationFailed { reason: String },

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("{subject} does not belong to network {network}")]
    WrongNetwork { subject: String, network: Network },

    #[error("outputs exceed inputs: {total_output} > {total_input}")]
    Overspend { total_output: u64, total_input: u64 },

    #[error("fee of {fee} sats is greater than the sum of all outputs")]
    FeeExceedsOutputs { fee: u64 },

    /// The prior-output table is populated for every input before signing
    /// starts, so hitting this is a programmer error.
    #[error("no prior output recorded for {out_point}")]
    MissingPriorOutput { out_point: OutPoint },

    #[error("unsupported script family {family:?}")]
    UnsupportedScriptFamily { family: ScriptFamily },

    #[error("signing failed for input {input_index}: {reason}")]
    SigningFailed { input_index: usize, reason: String },

    #[error("script verification failed for input {input_index}: {reason}")]
    ScriptVerificationFailed { input_index: usize, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}
