use anchor_lang::error::ErrorCode;
use asset_vault::error::VaultError;
use asset_vault::events::{TokensDeposited, TokensWithdrawn, VaultInitialized};
use fuzz_helpers::*;
use solana_sdk::signature::Signer;

const DECIMALS: u8 = 9;

#[tokio::test]
async fn initialize_records_caller_as_manager() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(0, DECIMALS).await?;

    let record = get_vault_data(&mut env.context, &setup.vault.vault_data).await?;
    assert_eq!(record.manager, setup.manager.owner.pubkey());
    assert_eq!(record.bump, setup.vault.bump);

    let (expected, _) = derive_vault_data_pda(&env.program_id)?;
    assert_eq!(setup.vault.vault_data, expected);

    Ok(())
}

#[tokio::test]
async fn initialize_emits_vault_initialized() -> FuzzResult<()> {
    let mut env = setup_program_test().await;
    let program_id = env.program_id;
    let ctx = &mut env.context;

    let mint = setup_mint(ctx, DECIMALS).await?;
    let manager = setup_user(ctx, &mint.mint).await?;
    let (vault_data, bump) = derive_vault_data_pda(&program_id)?;

    let ix = initialize_vault_ix(&program_id, &manager.owner.pubkey());
    let logs = process_instruction_with_logs(ctx, ix, &manager.owner).await?;

    let events = decode_events::<VaultInitialized>(&logs);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].vault, vault_data);
    assert_eq!(events[0].manager, manager.owner.pubkey());
    assert_eq!(events[0].bump, bump);
    assert!(logs.iter().any(|l| l == "Program log: Vault initialized successfully!"));

    Ok(())
}

#[tokio::test]
async fn second_initialize_is_rejected() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(0, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;
    let intruder = setup_user(ctx, &setup.mint.mint).await?;

    let result = initialize_vault(ctx, &program_id, &intruder.owner).await;
    assert!(is_error_code(&result, VaultError::AlreadyInitialized));

    // Same manager again, on a fresh blockhash so the transaction is not a duplicate
    ctx.get_new_latest_blockhash().await?;
    let result = initialize_vault(ctx, &program_id, &setup.manager.owner).await;
    assert!(is_error_code(&result, VaultError::AlreadyInitialized));

    let record = get_vault_data(ctx, &setup.vault.vault_data).await?;
    assert_eq!(record.manager, setup.manager.owner.pubkey());

    Ok(())
}

#[tokio::test]
async fn deposit_moves_exact_amount_into_custody() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(1_000, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;

    deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 500).await?;

    assert_eq!(get_token_balance(ctx, &setup.vault.vault_token_account).await?, 500);
    assert_eq!(get_token_balance(ctx, &setup.depositor.token_account).await?, 500);

    Ok(())
}

#[tokio::test]
async fn deposit_emits_tokens_deposited() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(1_000, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;

    deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 300).await?;

    let ix = deposit_tokens_ix(
        &program_id,
        &setup.vault,
        &setup.depositor.owner.pubkey(),
        &setup.depositor.token_account,
        200,
    );
    let logs = process_instruction_with_logs(ctx, ix, &setup.depositor.owner).await?;

    let events = decode_events::<TokensDeposited>(&logs);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].vault, setup.vault.vault_data);
    assert_eq!(events[0].depositor, setup.depositor.owner.pubkey());
    assert_eq!(events[0].amount, 200);
    assert_eq!(events[0].custody_balance, 500);
    assert!(logs.iter().any(|l| l == "Program log: Deposit successful!"));

    Ok(())
}

#[tokio::test]
async fn any_key_may_deposit() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(100, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;

    let stranger = setup_user(ctx, &setup.mint.mint).await?;
    let mint = &setup.mint;
    mint_tokens(ctx, &mint.mint, &mint.mint_authority, &stranger.token_account, 40).await?;

    deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 100).await?;
    deposit_tokens(ctx, &program_id, &setup.vault, &stranger, 40).await?;

    assert_eq!(get_token_balance(ctx, &setup.vault.vault_token_account).await?, 140);

    Ok(())
}

#[tokio::test]
async fn zero_deposit_is_rejected() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(1_000, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;

    let result = deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 0).await;
    assert!(is_error_code(&result, VaultError::InvalidAmount));

    Ok(())
}

#[tokio::test]
async fn underfunded_deposit_moves_nothing() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(100, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;

    let result = deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 101).await;
    assert!(is_error_code(&result, VaultError::InsufficientDepositorBalance));

    assert_eq!(get_token_balance(ctx, &setup.vault.vault_token_account).await?, 0);
    assert_eq!(get_token_balance(ctx, &setup.depositor.token_account).await?, 100);

    Ok(())
}

#[tokio::test]
async fn custody_account_must_belong_to_vault() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(100, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;

    let depositor_key = setup.depositor.owner.pubkey();
    let foreign_custody = create_token_account(ctx, &setup.mint.mint, &depositor_key).await?;
    let mut vault = setup.vault.clone();
    vault.vault_token_account = foreign_custody;

    let result = deposit_tokens(ctx, &program_id, &vault, &setup.depositor, 50).await;
    assert!(is_error_code(&result, ErrorCode::ConstraintTokenOwner));

    assert_eq!(get_token_balance(ctx, &setup.depositor.token_account).await?, 100);

    Ok(())
}

#[tokio::test]
async fn deposit_requires_initialized_vault() -> FuzzResult<()> {
    let mut env = setup_program_test().await;
    let program_id = env.program_id;
    let ctx = &mut env.context;

    let mint = setup_mint(ctx, DECIMALS).await?;
    let depositor = setup_user(ctx, &mint.mint).await?;
    mint_tokens(ctx, &mint.mint, &mint.mint_authority, &depositor.token_account, 10).await?;

    let (vault_data, bump) = derive_vault_data_pda(&program_id)?;
    let vault_token_account = create_token_account(ctx, &mint.mint, &vault_data).await?;
    let vault = VaultAccounts {
        vault_data,
        bump,
        vault_token_account,
        mint: mint.mint,
    };

    let result = deposit_tokens(ctx, &program_id, &vault, &depositor, 10).await;
    assert!(is_error_code(&result, ErrorCode::AccountNotInitialized));

    assert_eq!(get_token_balance(ctx, &depositor.token_account).await?, 10);

    Ok(())
}

#[tokio::test]
async fn manager_withdraws_exact_amount() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(1_000, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;
    deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 1_000).await?;

    withdraw_tokens(ctx, &program_id, &setup.vault, &setup.manager, 1_000).await?;

    assert_eq!(get_token_balance(ctx, &setup.vault.vault_token_account).await?, 0);
    assert_eq!(get_token_balance(ctx, &setup.manager.token_account).await?, 1_000);

    Ok(())
}

#[tokio::test]
async fn withdraw_emits_tokens_withdrawn() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(500, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;
    deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 500).await?;

    let ix = withdraw_tokens_ix(
        &program_id,
        &setup.vault,
        &setup.manager.owner.pubkey(),
        &setup.manager.token_account,
        200,
    );
    let logs = process_instruction_with_logs(ctx, ix, &setup.manager.owner).await?;

    let events = decode_events::<TokensWithdrawn>(&logs);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].vault, setup.vault.vault_data);
    assert_eq!(events[0].manager, setup.manager.owner.pubkey());
    assert_eq!(events[0].amount, 200);
    assert_eq!(events[0].custody_balance, 300);
    assert!(logs.iter().any(|l| l == "Program log: Withdraw successful!"));
    assert!(decode_events::<TokensDeposited>(&logs).is_empty());

    Ok(())
}

#[tokio::test]
async fn non_manager_withdraw_is_unauthorized() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(300, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;
    deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 300).await?;

    // Rejected regardless of amount, including amounts the vault could cover
    for amount in [0, 1, 300, u64::MAX] {
        let result =
            withdraw_tokens(ctx, &program_id, &setup.vault, &setup.depositor, amount).await;
        assert!(is_error_code(&result, VaultError::Unauthorized));
    }

    assert_eq!(get_token_balance(ctx, &setup.vault.vault_token_account).await?, 300);
    assert_eq!(get_token_balance(ctx, &setup.depositor.token_account).await?, 0);

    Ok(())
}

#[tokio::test]
async fn overdrawn_withdraw_moves_nothing() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(300, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;
    deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 300).await?;

    let result = withdraw_tokens(ctx, &program_id, &setup.vault, &setup.manager, 301).await;
    assert!(is_error_code(&result, VaultError::InsufficientVaultBalance));

    assert_eq!(get_token_balance(ctx, &setup.vault.vault_token_account).await?, 300);
    assert_eq!(get_token_balance(ctx, &setup.manager.token_account).await?, 0);

    Ok(())
}

#[tokio::test]
async fn zero_withdraw_is_rejected() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(10, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;
    deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, 10).await?;

    let result = withdraw_tokens(ctx, &program_id, &setup.vault, &setup.manager, 0).await;
    assert!(is_error_code(&result, VaultError::InvalidAmount));

    Ok(())
}

#[tokio::test]
async fn deposit_withdraw_scenario() -> FuzzResult<()> {
    let (mut env, setup) = setup_complete_environment(1_000, DECIMALS).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;
    let vault = &setup.vault;
    let unauthorized = setup_user(ctx, &setup.mint.mint).await?;

    deposit_tokens(ctx, &program_id, vault, &setup.depositor, 500).await?;
    assert_eq!(get_token_balance(ctx, &vault.vault_token_account).await?, 500);

    withdraw_tokens(ctx, &program_id, vault, &setup.manager, 200).await?;
    assert_eq!(get_token_balance(ctx, &vault.vault_token_account).await?, 300);
    assert_eq!(get_token_balance(ctx, &setup.manager.token_account).await?, 200);

    let result = withdraw_tokens(ctx, &program_id, vault, &unauthorized, 100).await;
    assert!(is_error_code(&result, VaultError::Unauthorized));
    assert_eq!(get_token_balance(ctx, &vault.vault_token_account).await?, 300);

    let result = withdraw_tokens(ctx, &program_id, vault, &setup.manager, 600).await;
    assert!(is_error_code(&result, VaultError::InsufficientVaultBalance));
    assert_eq!(get_token_balance(ctx, &vault.vault_token_account).await?, 300);
    assert_eq!(get_token_balance(ctx, &setup.manager.token_account).await?, 200);
    assert_eq!(get_token_balance(ctx, &unauthorized.token_account).await?, 0);

    Ok(())
}
