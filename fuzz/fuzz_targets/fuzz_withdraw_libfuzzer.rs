#![no_main]

use arbitrary::Arbitrary;
use asset_vault::error::VaultError;
use fuzz_helpers::*;
use libfuzzer_sys::fuzz_target;

/// Fuzzable input for the withdraw instruction
#[derive(Debug, Clone, Arbitrary)]
struct WithdrawFuzzInput {
    /// Tokens put into custody before the withdrawal
    deposit_amount: u64,
    /// Amount to withdraw (fuzzed, zero and overdrafts included)
    amount: u64,
    /// Whether the caller is the manager or some other key
    caller_is_manager: bool,
}

/// Execute a single fuzz iteration for the withdraw instruction
async fn fuzz_withdraw_once(input: WithdrawFuzzInput) -> Result<(), Box<dyn std::error::Error>> {
    let (mut env, setup) = match setup_complete_environment(input.deposit_amount, 6).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Setup failed: {}", e);
            return Ok(());
        }
    };

    if input.deposit_amount > 0 {
        deposit_tokens(
            &mut env.context,
            &env.program_id,
            &setup.vault,
            &setup.depositor,
            input.deposit_amount,
        )
        .await?;
    }

    let outsider = setup_user(&mut env.context, &setup.mint.mint).await?;
    let caller = if input.caller_is_manager {
        &setup.manager
    } else {
        &outsider
    };

    let vault = &setup.vault;
    let vault_balance_before = get_token_balance(&mut env.context, &vault.vault_token_account)
        .await?;
    let caller_balance_before = get_token_balance(&mut env.context, &caller.token_account).await?;

    let result =
        withdraw_tokens(&mut env.context, &env.program_id, vault, caller, input.amount).await;

    let vault_balance_after = get_token_balance(&mut env.context, &vault.vault_token_account)
        .await?;
    let caller_balance_after = get_token_balance(&mut env.context, &caller.token_account).await?;

    assert_eq!(
        vault_balance_before as u128 + caller_balance_before as u128,
        vault_balance_after as u128 + caller_balance_after as u128,
        "Token conservation violated"
    );

    // Checks run in order: authority, amount, balance
    let expected = if !input.caller_is_manager {
        Some(VaultError::Unauthorized)
    } else if input.amount == 0 {
        Some(VaultError::InvalidAmount)
    } else if input.amount > vault_balance_before {
        Some(VaultError::InsufficientVaultBalance)
    } else {
        None
    };

    match (result, expected) {
        (Ok(()), None) => {
            assert_eq!(vault_balance_after, vault_balance_before - input.amount);
            assert_eq!(caller_balance_after, caller_balance_before + input.amount);
        }
        (Err(e), Some(expected)) => {
            assert_eq!(vault_balance_after, vault_balance_before, "Failed withdrawal moved tokens");
            assert_eq!(
                custom_error_code(&e),
                Some(u32::from(expected)),
                "Wrong error for input {:?}: {:?}",
                input,
                e
            );
        }
        (Ok(()), Some(expected)) => {
            panic!("Withdrawal succeeded, expected {:?}. Input: {:?}", expected, input);
        }
        (Err(e), None) => {
            panic!("Unexpected error during withdrawal: {:?}\nInput: {:?}", e, input);
        }
    }

    Ok(())
}

fuzz_target!(|input: WithdrawFuzzInput| {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        if let Err(e) = fuzz_withdraw_once(input).await {
            eprintln!("Fuzz iteration failed: {}", e);
        }
    });
});
