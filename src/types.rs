use bitcoin::{Network, PrivateKey, ScriptBuf};
use serde::{Deserialize, Serialize};

/// Minimal reasonable fee rate, in satoshis per virtual byte.
pub const DEFAULT_FEE_RATE: u64 = 2;

/// A spendable prior output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    /// Funding transaction id, hex encoded.
    pub txid: String,
    /// Output index within the funding transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub value: u64,
    /// The locking script of the output being spent.
    pub script_pubkey: ScriptBuf,
}

/// Locking-script family of an input. Only `P2shP2wpkh` can be forged today;
/// the remaining variants are named so callers can be extended without
/// touching the assembler or the fee negotiator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFamily {
    #[default]
    P2shP2wpkh,
    P2pkh,
    P2sh,
    P2pk,
}

/// One input to forge: a UTXO plus, optionally, the key that unlocks it.
///
/// Without a key the input is encoded with a placeholder unlocking script and
/// is neither signed nor verified, which keeps size estimation representative
/// when no key material is at hand.
#[derive(Debug, Clone)]
pub struct ForgeTxIn {
    pub utxo: Utxo,
    pub private_key: Option<PrivateKey>,
    pub family: ScriptFamily,
}

impl ForgeTxIn {
    pub fn new(utxo: Utxo, private_key: Option<PrivateKey>) -> Self {
        Self { utxo, private_key, family: ScriptFamily::default() }
    }
}

/// One requested payment: destination address plus value in satoshis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgeTxOut {
    pub address: String,
    pub value: u64,
}

/// Run configuration for a forge call.
#[derive(Debug, Clone, Copy)]
pub struct ForgeParams {
    /// Satoshis per virtual byte, must be at least 1.
    pub fee_rate: u64,
    /// Network the addresses and keys must belong to.
    pub network: Option<Network>,
    /// Whether to produce and verify witnesses.
    pub sign: bool,
}

impl ForgeParams {
    pub fn new(network: Network) -> Self {
        Self { fee_rate: DEFAULT_FEE_RATE, network: Some(network), sign: true }
    }
}

/// Result metadata of a forge call. `fee + total_output == total_input`
/// holds exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForgeSummary {
    pub fee: u64,
    pub total_input: u64,
    pub total_output: u64,
}
