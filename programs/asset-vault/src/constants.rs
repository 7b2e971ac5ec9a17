use anchor_lang::prelude::*;

/// Namespace tag of the vault data PDA
#[constant]
pub const VAULT_SEED: &[u8] = b"vault";
