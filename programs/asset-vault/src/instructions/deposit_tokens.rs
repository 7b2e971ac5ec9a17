use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

use crate::constants::VAULT_SEED;
use crate::error::VaultError;
use crate::events::TokensDeposited;
use crate::state::VaultData;

#[derive(Accounts)]
pub struct DepositTokens<'info> {
    /// Any key may deposit
    pub user: Signer<'info>,

    /// The mint held by the vault
    pub mint: InterfaceAccount<'info, Mint>,

    /// The depositor's token account
    #[account(
        mut,
        token::mint = mint,
        token::authority = user,
    )]
    pub user_token_account: InterfaceAccount<'info, TokenAccount>,

    /// The custody account, controlled by the vault data PDA
    #[account(
        mut,
        token::mint = mint,
        token::authority = vault_data,
    )]
    pub vault_token_account: InterfaceAccount<'info, TokenAccount>,

    #[account(
        seeds = [VAULT_SEED],
        bump = vault_data.bump,
    )]
    pub vault_data: Account<'info, VaultData>,

    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(ctx: Context<DepositTokens>, amount: u64) -> Result<()> {
    require!(amount > 0, VaultError::InvalidAmount);
    require!(
        ctx.accounts.user_token_account.amount >= amount,
        VaultError::InsufficientDepositorBalance
    );

    let custody_balance = ctx
        .accounts
        .vault_token_account
        .amount
        .checked_add(amount)
        .ok_or(VaultError::InvalidAmount)?;

    let transfer_accounts = TransferChecked {
        from: ctx.accounts.user_token_account.to_account_info(),
        mint: ctx.accounts.mint.to_account_info(),
        to: ctx.accounts.vault_token_account.to_account_info(),
        authority: ctx.accounts.user.to_account_info(),
    };

    let cpi_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        transfer_accounts,
    );

    transfer_checked(cpi_ctx, amount, ctx.accounts.mint.decimals)?;

    emit!(TokensDeposited {
        vault: ctx.accounts.vault_data.key(),
        depositor: ctx.accounts.user.key(),
        amount,
        custody_balance,
    });

    msg!("Deposit successful!");
    msg!("Depositor: {}", ctx.accounts.user.key());
    msg!("Deposited: {} tokens", amount);
    msg!("Total vault assets: {}", custody_balance);

    Ok(())
}
