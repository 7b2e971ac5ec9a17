use anchor_lang::prelude::*;

use crate::address::find_vault_address;
use crate::constants::VAULT_SEED;
use crate::error::VaultError;
use crate::events::VaultInitialized;
use crate::state::VaultData;

#[derive(Accounts)]
pub struct InitializeVault<'info> {
    /// The vault data PDA; allocated on first use, rejected afterwards
    #[account(
        init_if_needed,
        payer = manager,
        space = VaultData::LEN,
        seeds = [VAULT_SEED],
        bump
    )]
    pub vault_data: Account<'info, VaultData>,

    /// Becomes the vault manager and pays for the vault data account
    #[account(mut)]
    pub manager: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeVault>) -> Result<()> {
    let vault_data = &mut ctx.accounts.vault_data;

    require!(!vault_data.is_initialized(), VaultError::AlreadyInitialized);

    let (_, bump) = find_vault_address(ctx.program_id)?;

    vault_data.manager = ctx.accounts.manager.key();
    vault_data.bump = bump;

    emit!(VaultInitialized {
        vault: vault_data.key(),
        manager: vault_data.manager,
        bump,
    });

    msg!("Vault initialized successfully!");
    msg!("Vault Data: {}", vault_data.key());
    msg!("Manager: {}", vault_data.manager);

    Ok(())
}
