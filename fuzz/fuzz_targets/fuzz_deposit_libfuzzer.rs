#![no_main]

use arbitrary::Arbitrary;
use asset_vault::error::VaultError;
use fuzz_helpers::*;
use libfuzzer_sys::fuzz_target;

/// Fuzzable input for the deposit instruction
#[derive(Debug, Clone, Arbitrary)]
struct DepositFuzzInput {
    /// Amount to deposit (fuzzed, zero included)
    amount: u64,
    /// Depositor balance before the deposit
    initial_balance: u64,
    /// Token decimals (for setup)
    decimals: u8,
    /// Tokens already in custody before the deposit
    prior_deposit: u64,
}

/// Execute a single fuzz iteration for the deposit instruction
async fn fuzz_deposit_once(input: DepositFuzzInput) -> Result<(), Box<dyn std::error::Error>> {
    let decimals = input.decimals % 10;
    let prior_deposit = input.prior_deposit.min(input.initial_balance);

    let (mut env, setup) = match setup_complete_environment(input.initial_balance, decimals).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Setup failed: {}", e);
            return Ok(());
        }
    };

    let program_id = env.program_id;
    let ctx = &mut env.context;

    if prior_deposit > 0
        && deposit_tokens(ctx, &program_id, &setup.vault, &setup.depositor, prior_deposit)
            .await
            .is_err()
    {
        return Ok(());
    }

    // Repeating the prior deposit verbatim needs a fresh blockhash
    if prior_deposit > 0 && prior_deposit == input.amount {
        ctx.get_new_latest_blockhash().await?;
    }

    let vault_balance_before = get_token_balance(ctx, &setup.vault.vault_token_account).await?;
    let user_balance_before = get_token_balance(ctx, &setup.depositor.token_account).await?;

    let depositor = &setup.depositor;
    let result = deposit_tokens(ctx, &program_id, &setup.vault, depositor, input.amount).await;

    let vault_balance_after = get_token_balance(ctx, &setup.vault.vault_token_account).await?;
    let user_balance_after = get_token_balance(ctx, &setup.depositor.token_account).await?;

    // Tokens are never created or destroyed, whatever the outcome
    assert_eq!(
        vault_balance_before as u128 + user_balance_before as u128,
        vault_balance_after as u128 + user_balance_after as u128,
        "Token conservation violated. Before: vault={} user={}, After: vault={} user={}",
        vault_balance_before,
        user_balance_before,
        vault_balance_after,
        user_balance_after
    );

    match result {
        Ok(()) => {
            assert!(input.amount > 0, "Zero deposit was accepted");
            assert_eq!(vault_balance_after, vault_balance_before + input.amount);
            assert_eq!(user_balance_after, user_balance_before - input.amount);

            println!(
                "✓ PASS - deposit={}, vault: {}→{}",
                input.amount, vault_balance_before, vault_balance_after
            );
        }
        Err(e) => {
            assert_eq!(vault_balance_after, vault_balance_before, "Failed deposit moved tokens");

            let expected = if input.amount == 0 {
                VaultError::InvalidAmount
            } else if input.amount > user_balance_before {
                VaultError::InsufficientDepositorBalance
            } else {
                panic!(
                    "Unexpected error during deposit: {:?}\nInput: {:?}",
                    e, input
                );
            };

            assert_eq!(
                custom_error_code(&e),
                Some(u32::from(expected)),
                "Wrong error for input {:?}: {:?}",
                input,
                e
            );
        }
    }

    Ok(())
}

fuzz_target!(|input: DepositFuzzInput| {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        if let Err(e) = fuzz_deposit_once(input).await {
            eprintln!("Fuzz iteration failed: {}", e);
        }
    });
});
