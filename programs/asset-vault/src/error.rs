use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Vault has already been initialized")]
    AlreadyInitialized,
    #[msg("Only the vault manager can withdraw")]
    Unauthorized,
    #[msg("Withdrawal exceeds the vault balance")]
    InsufficientVaultBalance,
    #[msg("Depositor does not hold enough tokens")]
    InsufficientDepositorBalance,
    #[msg("Amount must be greater than zero and must not overflow the vault balance")]
    InvalidAmount,
    #[msg("No valid bump found for the vault address")]
    DerivationExhausted,
}
