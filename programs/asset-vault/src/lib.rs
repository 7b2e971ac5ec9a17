pub mod address;
pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod state;

use anchor_lang::prelude::*;

pub use address::*;
pub use constants::*;
pub use error::*;
pub use instructions::*;
pub use state::*;

declare_id!("hovazRyg1bRYjcb9qtyhYWCzx8CNNgeUDf3BqTzMym1");

#[program]
pub mod asset_vault {
    use super::*;

    pub fn initialize_vault(ctx: Context<InitializeVault>) -> Result<()> {
        initialize_vault::handler(ctx)
    }

    pub fn deposit_tokens(ctx: Context<DepositTokens>, amount: u64) -> Result<()> {
        deposit_tokens::handler(ctx, amount)
    }

    pub fn withdraw_tokens(ctx: Context<WithdrawTokens>, amount: u64) -> Result<()> {
        withdraw_tokens::handler(ctx, amount)
    }
}
