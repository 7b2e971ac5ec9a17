use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

use crate::address::vault_signer_seeds;
use crate::constants::VAULT_SEED;
use crate::error::VaultError;
use crate::events::TokensWithdrawn;
use crate::state::VaultData;

#[derive(Accounts)]
pub struct WithdrawTokens<'info> {
    /// Manager check runs before the token account checks
    #[account(
        seeds = [VAULT_SEED],
        bump = vault_data.bump,
        has_one = manager @ VaultError::Unauthorized,
    )]
    pub vault_data: Account<'info, VaultData>,

    #[account(mut)]
    pub manager: Signer<'info>,

    /// The mint held by the vault
    pub mint: InterfaceAccount<'info, Mint>,

    /// The custody account, controlled by the vault data PDA
    #[account(
        mut,
        token::mint = mint,
        token::authority = vault_data,
    )]
    pub vault_token_account: InterfaceAccount<'info, TokenAccount>,

    /// Destination, must belong to the manager
    #[account(
        mut,
        token::mint = mint,
        token::authority = manager,
    )]
    pub manager_token_account: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(ctx: Context<WithdrawTokens>, amount: u64) -> Result<()> {
    require!(amount > 0, VaultError::InvalidAmount);

    let vault_balance = ctx.accounts.vault_token_account.amount;
    require!(amount <= vault_balance, VaultError::InsufficientVaultBalance);

    let bump = ctx.accounts.vault_data.bump_seed();
    let vault_seeds = vault_signer_seeds(&bump);
    let signer_seeds = &[&vault_seeds[..]];

    let transfer_accounts = TransferChecked {
        from: ctx.accounts.vault_token_account.to_account_info(),
        mint: ctx.accounts.mint.to_account_info(),
        to: ctx.accounts.manager_token_account.to_account_info(),
        authority: ctx.accounts.vault_data.to_account_info(),
    };

    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        transfer_accounts,
        signer_seeds,
    );

    transfer_checked(cpi_ctx, amount, ctx.accounts.mint.decimals)?;

    let custody_balance = vault_balance - amount;

    emit!(TokensWithdrawn {
        vault: ctx.accounts.vault_data.key(),
        manager: ctx.accounts.manager.key(),
        amount,
        custody_balance,
    });

    msg!("Withdraw successful!");
    msg!("Manager: {}", ctx.accounts.manager.key());
    msg!("Withdrawn: {} tokens", amount);
    msg!("Remaining vault assets: {}", custody_balance);

    Ok(())
}
