use anchor_lang::prelude::*;

#[account]
pub struct VaultData {
    /// The only key allowed to withdraw from the vault
    pub manager: Pubkey,
    /// Bump seed for PDA derivation
    pub bump: u8,
}

impl VaultData {
    pub const LEN: usize = 8 + // discriminator
        32 + // manager
        1; // bump

    /// A record allocated by `init_if_needed` but never written still has a
    /// zeroed manager.
    pub fn is_initialized(&self) -> bool {
        self.manager != Pubkey::default()
    }

    pub fn bump_seed(&self) -> [u8; 1] {
        [self.bump]
    }
}
