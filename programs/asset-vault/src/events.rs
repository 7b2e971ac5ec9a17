use anchor_lang::prelude::*;

#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub manager: Pubkey,
    pub bump: u8,
}

#[event]
pub struct TokensDeposited {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub amount: u64,
    /// Custody balance after the transfer
    pub custody_balance: u64,
}

#[event]
pub struct TokensWithdrawn {
    pub vault: Pubkey,
    pub manager: Pubkey,
    pub amount: u64,
    /// Custody balance after the transfer
    pub custody_balance: u64,
}
