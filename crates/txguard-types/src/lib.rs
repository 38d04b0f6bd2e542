//! Glue types shared across the guardian pipeline's component boundary.
//!
//! The core crates (`txguard-crypto`, `txguard-coordinator`, `txguard-vdf`)
//! only ever pass around fixed-width byte arrays and the curve/bigint
//! value types native to their math. Everything that needs to cross a
//! process boundary — a JSON-RPC response, a Solidity-friendly encoding —
//! goes through [`wire`] instead, so the core never has to think about
//! hex strings.

pub mod wire;
