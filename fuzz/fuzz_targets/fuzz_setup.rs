use std::sync::Once;

use anchor_lang::AccountDeserialize;
use anchor_lang::Event;
use anchor_lang::InstructionData;
use anchor_lang::ToAccountMetas;
use base64::{engine::general_purpose::STANDARD, Engine};
use anchor_spl::token_interface::TokenAccount;
use asset_vault::state::VaultData;
use solana_program_test::*;
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};
use spl_token::instruction as token_instruction;
use spl_token::solana_program::program_pack::Pack;

// Re-export for convenience
pub use solana_program_test::{BanksClientError, ProgramTestContext};

// Custom error type for fuzzing
pub type FuzzResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Test environment with program loaded
pub struct FuzzTestEnv {
    pub program_id: Pubkey,
    pub context: ProgramTestContext,
}

/// Token mint used as the vault's asset
#[derive(Debug)]
pub struct MintAccounts {
    pub mint: Pubkey,
    pub mint_authority: Keypair,
    pub decimals: u8,
}

/// Vault data PDA and its custody token account
#[derive(Debug, Clone)]
pub struct VaultAccounts {
    pub vault_data: Pubkey,
    pub bump: u8,
    pub vault_token_account: Pubkey,
    pub mint: Pubkey,
}

/// A funded key with a token account for the vault mint
#[derive(Debug)]
pub struct UserAccounts {
    pub owner: Keypair,
    pub token_account: Pubkey,
}

/// Complete setup with all accounts
pub struct CompleteSetup {
    pub mint: MintAccounts,
    pub vault: VaultAccounts,
    pub manager: UserAccounts,
    pub depositor: UserAccounts,
}

// ============================================================================
// Core Setup Functions
// ============================================================================

static PROGRAM_DIR: Once = Once::new();

/// Points the program loader at the workspace build output unless the
/// caller already chose a directory
fn default_program_dir() {
    PROGRAM_DIR.call_once(|| {
        if std::env::var_os("BPF_OUT_DIR").is_none() && std::env::var_os("SBF_OUT_DIR").is_none() {
            std::env::set_var(
                "SBF_OUT_DIR",
                concat!(env!("CARGO_MANIFEST_DIR"), "/../target/deploy"),
            );
        }
    });
}

/// Creates the program test environment with the built `asset_vault.so` loaded.
/// Requires `anchor build` (or `cargo build-sbf`) beforehand.
pub async fn setup_program_test() -> FuzzTestEnv {
    default_program_dir();

    let program_id = asset_vault::id();
    let mut program_test = ProgramTest::new("asset_vault", program_id, None);
    program_test.prefer_bpf(true);

    let context = program_test.start_with_context().await;

    FuzzTestEnv {
        program_id,
        context,
    }
}

/// Sends a transaction paid by the context payer and signed by `signer`
pub async fn process_instruction_with_signer(
    context: &mut ProgramTestContext,
    ix: Instruction,
    signer: &Keypair,
) -> Result<(), BanksClientError> {
    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, signer],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await
}

/// Like `process_instruction_with_signer`, returning the transaction logs
pub async fn process_instruction_with_logs(
    context: &mut ProgramTestContext,
    ix: Instruction,
    signer: &Keypair,
) -> FuzzResult<Vec<String>> {
    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, signer],
        context.last_blockhash,
    );

    let outcome = context.banks_client.process_transaction_with_metadata(tx).await?;
    outcome.result?;

    Ok(outcome
        .metadata
        .map(|metadata| metadata.log_messages)
        .unwrap_or_default())
}

/// Transfers 1 SOL to `account` so it can sign and pay rent
pub async fn fund_account(context: &mut ProgramTestContext, account: &Pubkey) -> FuzzResult<()> {
    let rent = context.banks_client.get_rent().await?;
    let lamports = rent.minimum_balance(0) + 1_000_000_000; // 1 SOL

    let ix = solana_sdk::system_instruction::transfer(&context.payer.pubkey(), account, lamports);

    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&context.payer.pubkey()),
        &[&context.payer],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(())
}

/// Creates a new SPL token mint for the vault to hold
pub async fn setup_mint(
    context: &mut ProgramTestContext,
    decimals: u8,
) -> FuzzResult<MintAccounts> {
    let mint_authority = Keypair::new();
    let mint_keypair = Keypair::new();
    let mint = mint_keypair.pubkey();

    let rent = context.banks_client.get_rent().await?;
    let mint_len = spl_token::state::Mint::LEN;

    let create_account_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &mint,
        rent.minimum_balance(mint_len),
        mint_len as u64,
        &spl_token::id(),
    );

    let init_mint_ix = token_instruction::initialize_mint(
        &spl_token::id(),
        &mint,
        &mint_authority.pubkey(),
        None,
        decimals,
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[create_account_ix, init_mint_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, &mint_keypair],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(MintAccounts {
        mint,
        mint_authority,
        decimals,
    })
}

/// Creates a token account for `mint` whose authority is `owner`.
/// `owner` may be a PDA.
pub async fn create_token_account(
    context: &mut ProgramTestContext,
    mint: &Pubkey,
    owner: &Pubkey,
) -> FuzzResult<Pubkey> {
    let rent = context.banks_client.get_rent().await?;
    let account_len = spl_token::state::Account::LEN;

    let token_account = Keypair::new();
    let create_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &token_account.pubkey(),
        rent.minimum_balance(account_len),
        account_len as u64,
        &spl_token::id(),
    );

    let init_ix = token_instruction::initialize_account(
        &spl_token::id(),
        &token_account.pubkey(),
        mint,
        owner,
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[create_ix, init_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, &token_account],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(token_account.pubkey())
}

/// Creates a funded key with an empty token account for `mint`
pub async fn setup_user(
    context: &mut ProgramTestContext,
    mint: &Pubkey,
) -> FuzzResult<UserAccounts> {
    let owner = Keypair::new();
    fund_account(context, &owner.pubkey()).await?;

    let token_account = create_token_account(context, mint, &owner.pubkey()).await?;

    Ok(UserAccounts {
        owner,
        token_account,
    })
}

/// Mints tokens to any token account of `mint`
pub async fn mint_tokens(
    context: &mut ProgramTestContext,
    mint: &Pubkey,
    mint_authority: &Keypair,
    destination: &Pubkey,
    amount: u64,
) -> FuzzResult<()> {
    let mint_to_ix = token_instruction::mint_to(
        &spl_token::id(),
        mint,
        destination,
        &mint_authority.pubkey(),
        &[],
        amount,
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[mint_to_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, mint_authority],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(())
}

/// Initializes the vault with `manager` and creates the custody account
pub async fn setup_vault(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    manager: &Keypair,
    mint: &Pubkey,
) -> FuzzResult<VaultAccounts> {
    let (vault_data, bump) = derive_vault_data_pda(program_id)?;

    initialize_vault(context, program_id, manager).await?;

    let vault_token_account = create_token_account(context, mint, &vault_data).await?;

    Ok(VaultAccounts {
        vault_data,
        bump,
        vault_token_account,
        mint: *mint,
    })
}

/// Sets up everything: mint + manager + initialized vault + depositor with tokens
pub async fn setup_complete_environment(
    initial_depositor_balance: u64,
    decimals: u8,
) -> FuzzResult<(FuzzTestEnv, CompleteSetup)> {
    let mut env = setup_program_test().await;

    let mint = setup_mint(&mut env.context, decimals).await?;

    let manager = setup_user(&mut env.context, &mint.mint).await?;

    let vault = setup_vault(&mut env.context, &env.program_id, &manager.owner, &mint.mint).await?;

    let depositor = setup_user(&mut env.context, &mint.mint).await?;

    if initial_depositor_balance > 0 {
        mint_tokens(
            &mut env.context,
            &mint.mint,
            &mint.mint_authority,
            &depositor.token_account,
            initial_depositor_balance,
        )
        .await?;
    }

    let setup = CompleteSetup {
        mint,
        vault,
        manager,
        depositor,
    };

    Ok((env, setup))
}

// ============================================================================
// Instruction Builders
// ============================================================================

pub fn initialize_vault_ix(program_id: &Pubkey, manager: &Pubkey) -> Instruction {
    let (vault_data, _) = Pubkey::find_program_address(&[asset_vault::VAULT_SEED], program_id);

    let accounts = asset_vault::accounts::InitializeVault {
        vault_data,
        manager: *manager,
        system_program: solana_sdk::system_program::ID,
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: asset_vault::instruction::InitializeVault {}.data(),
    }
}

pub fn deposit_tokens_ix(
    program_id: &Pubkey,
    vault: &VaultAccounts,
    user: &Pubkey,
    user_token_account: &Pubkey,
    amount: u64,
) -> Instruction {
    let accounts = asset_vault::accounts::DepositTokens {
        user: *user,
        mint: vault.mint,
        user_token_account: *user_token_account,
        vault_token_account: vault.vault_token_account,
        vault_data: vault.vault_data,
        token_program: spl_token::id(),
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: asset_vault::instruction::DepositTokens { amount }.data(),
    }
}

pub fn withdraw_tokens_ix(
    program_id: &Pubkey,
    vault: &VaultAccounts,
    manager: &Pubkey,
    manager_token_account: &Pubkey,
    amount: u64,
) -> Instruction {
    let accounts = asset_vault::accounts::WithdrawTokens {
        vault_data: vault.vault_data,
        manager: *manager,
        mint: vault.mint,
        vault_token_account: vault.vault_token_account,
        manager_token_account: *manager_token_account,
        token_program: spl_token::id(),
    };

    Instruction {
        program_id: *program_id,
        accounts: accounts.to_account_metas(None),
        data: asset_vault::instruction::WithdrawTokens { amount }.data(),
    }
}

// ============================================================================
// Instruction Execution
// ============================================================================

pub async fn initialize_vault(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    manager: &Keypair,
) -> Result<(), BanksClientError> {
    let ix = initialize_vault_ix(program_id, &manager.pubkey());
    process_instruction_with_signer(context, ix, manager).await
}

pub async fn deposit_tokens(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    vault: &VaultAccounts,
    user: &UserAccounts,
    amount: u64,
) -> Result<(), BanksClientError> {
    let ix = deposit_tokens_ix(
        program_id,
        vault,
        &user.owner.pubkey(),
        &user.token_account,
        amount,
    );
    process_instruction_with_signer(context, ix, &user.owner).await
}

pub async fn withdraw_tokens(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    vault: &VaultAccounts,
    caller: &UserAccounts,
    amount: u64,
) -> Result<(), BanksClientError> {
    let ix = withdraw_tokens_ix(
        program_id,
        vault,
        &caller.owner.pubkey(),
        &caller.token_account,
        amount,
    );
    process_instruction_with_signer(context, ix, &caller.owner).await
}

// ============================================================================
// PDA Derivation Helpers
// ============================================================================

/// Derive vault data PDA
pub fn derive_vault_data_pda(program_id: &Pubkey) -> FuzzResult<(Pubkey, u8)> {
    let derived = asset_vault::find_vault_address(program_id)?;
    Ok(derived)
}

// ============================================================================
// Account State Verification Helpers
// ============================================================================

/// Fetch and return the vault data record
pub async fn get_vault_data(
    context: &mut ProgramTestContext,
    vault_data: &Pubkey,
) -> FuzzResult<VaultData> {
    let account = context
        .banks_client
        .get_account(*vault_data)
        .await?
        .ok_or("Vault data account not found")?;

    let record = VaultData::try_deserialize(&mut account.data.as_ref())?;
    Ok(record)
}

/// Get token account balance
pub async fn get_token_balance(
    context: &mut ProgramTestContext,
    account: &Pubkey,
) -> FuzzResult<u64> {
    let account_data = context
        .banks_client
        .get_account(*account)
        .await?
        .ok_or("Token account not found")?;

    let token_account = TokenAccount::try_deserialize(&mut account_data.data.as_ref())?;
    Ok(token_account.amount)
}

// ============================================================================
// Error Helpers
// ============================================================================

/// Custom program error code carried by a failed transaction, if any
pub fn custom_error_code(err: &BanksClientError) -> Option<u32> {
    match err {
        BanksClientError::TransactionError(TransactionError::InstructionError(
            _,
            InstructionError::Custom(code),
        ))
        | BanksClientError::SimulationError {
            err: TransactionError::InstructionError(_, InstructionError::Custom(code)),
            ..
        } => Some(*code),
        _ => None,
    }
}

/// Anchor events of type `T` found in the `Program data:` lines of `logs`
pub fn decode_events<T: Event>(logs: &[String]) -> Vec<T> {
    let discriminator: &[u8] = &T::DISCRIMINATOR[..];

    logs.iter()
        .filter_map(|line| line.strip_prefix("Program data: "))
        .filter_map(|encoded| STANDARD.decode(encoded).ok())
        .filter(|data| data.starts_with(discriminator))
        .filter_map(|data| T::try_from_slice(&data[discriminator.len()..]).ok())
        .collect()
}

/// Whether a failed transaction carries the given program error code
pub fn is_error_code(result: &Result<(), BanksClientError>, expected: impl Into<u32>) -> bool {
    match result {
        Err(err) => custom_error_code(err) == Some(expected.into()),
        Ok(()) => false,
    }
}
