//! Derivation of the vault data address.
//!
//! The vault data PDA is the token authority of the custody account. Its
//! bump is recorded at initialization so the program can re-create the
//! signer seeds on every withdrawal without holding a key.

use anchor_lang::prelude::*;

use crate::constants::VAULT_SEED;
use crate::error::VaultError;

/// Finds the vault data address and its canonical bump for `program_id`.
pub fn find_vault_address(program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[VAULT_SEED], program_id)
        .ok_or_else(|| error!(VaultError::DerivationExhausted))
}

/// Seeds that let the program sign for the vault data address.
pub fn vault_signer_seeds(bump: &[u8; 1]) -> [&[u8]; 2] {
    [VAULT_SEED, bump]
}
