//! Fee-aware Bitcoin transaction forging.
//!
//! [`forge_tx`] assembles a transaction from caller-chosen UTXOs and desired
//! payments, charges a fee computed from the transaction's virtual size
//! (deducting it from the outputs in order), signs every keyed input with a
//! BIP143 sighash (P2SH-wrapped P2WPKH) and replays each locking script
//! against the produced witness before the transaction is returned.
//!
//! The library is stateless: every call is a pure function of its arguments,
//! and concurrent callers need no coordination. UTXO selection, key storage
//! and broadcast are the caller's business.

mod forge;
mod input;
mod sign;
mod verify;

pub mod error;
pub mod types;

pub use error::ForgeError;
pub use forge::forge_tx;
pub use input::{pk_script_from_witness_program, witness_program_from_private_key};
pub use types::{
    DEFAULT_FEE_RATE, ForgeParams, ForgeSummary, ForgeTxIn, ForgeTxOut, ScriptFamily, Utxo,
};
