use arbitrary::{Arbitrary, Unstructured};
use asset_vault::error::VaultError;
use fuzz_helpers::*;
use solana_sdk::signature::Signer;

/// One step of a fuzzed session against a single vault
#[derive(Debug, Clone, PartialEq, Arbitrary)]
enum VaultAction {
    Deposit { depositor: bool, amount: u64 },
    Withdraw { as_manager: bool, amount: u64 },
    Reinitialize { as_manager: bool },
}

#[derive(Debug, Arbitrary)]
struct SequenceFuzzInput {
    depositor_balance: u64,
    actions: Vec<VaultAction>,
}

const MAX_ACTIONS: usize = 16;

/// Balances the vault must end up with if every check holds
#[derive(Debug, Default)]
struct ShadowLedger {
    custody: u64,
    depositor: u64,
    outsider: u64,
    manager: u64,
}

async fn run_sequence(input: SequenceFuzzInput) -> Result<(), Box<dyn std::error::Error>> {
    let (mut env, setup) = setup_complete_environment(input.depositor_balance, 0).await?;
    let program_id = env.program_id;
    let ctx = &mut env.context;
    let vault = &setup.vault;
    let outsider = setup_user(ctx, &setup.mint.mint).await?;

    let mut ledger = ShadowLedger {
        depositor: input.depositor_balance,
        ..ShadowLedger::default()
    };
    let mut sent_on_blockhash: Vec<VaultAction> = Vec::new();

    for action in input.actions.into_iter().take(MAX_ACTIONS) {
        // An identical transaction on the same blockhash would be dropped as a duplicate
        if sent_on_blockhash.contains(&action) {
            ctx.get_new_latest_blockhash().await?;
            sent_on_blockhash.clear();
        }

        match &action {
            VaultAction::Deposit { depositor, amount } => {
                let (user, balance) = if *depositor {
                    (&setup.depositor, &mut ledger.depositor)
                } else {
                    (&outsider, &mut ledger.outsider)
                };
                let result = deposit_tokens(ctx, &program_id, vault, user, *amount).await;

                if *amount == 0 {
                    assert!(is_error_code(&result, VaultError::InvalidAmount));
                } else if *amount > *balance {
                    assert!(is_error_code(&result, VaultError::InsufficientDepositorBalance));
                } else {
                    assert!(result.is_ok(), "deposit rejected: {:?}", result);
                    *balance -= amount;
                    ledger.custody += amount;
                }
            }
            VaultAction::Withdraw { as_manager, amount } => {
                let caller = if *as_manager { &setup.manager } else { &outsider };
                let result = withdraw_tokens(ctx, &program_id, vault, caller, *amount).await;

                if !*as_manager {
                    assert!(is_error_code(&result, VaultError::Unauthorized));
                } else if *amount == 0 {
                    assert!(is_error_code(&result, VaultError::InvalidAmount));
                } else if *amount > ledger.custody {
                    assert!(is_error_code(&result, VaultError::InsufficientVaultBalance));
                } else {
                    assert!(result.is_ok(), "withdrawal rejected: {:?}", result);
                    ledger.custody -= amount;
                    ledger.manager += amount;
                }
            }
            VaultAction::Reinitialize { as_manager } => {
                let caller = if *as_manager { &setup.manager } else { &outsider };
                let result = initialize_vault(ctx, &program_id, &caller.owner).await;
                assert!(is_error_code(&result, VaultError::AlreadyInitialized));
            }
        }

        sent_on_blockhash.push(action);
    }

    let custody = get_token_balance(ctx, &vault.vault_token_account).await?;
    assert_eq!(custody, ledger.custody);
    assert_eq!(get_token_balance(ctx, &setup.depositor.token_account).await?, ledger.depositor);
    assert_eq!(get_token_balance(ctx, &outsider.token_account).await?, ledger.outsider);
    assert_eq!(get_token_balance(ctx, &setup.manager.token_account).await?, ledger.manager);

    let record = get_vault_data(ctx, &vault.vault_data).await?;
    assert_eq!(record.manager, setup.manager.owner.pubkey());

    Ok(())
}

fn main() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    loop {
        honggfuzz::fuzz!(|data: &[u8]| {
            let mut unstructured = Unstructured::new(data);
            let Ok(input) = SequenceFuzzInput::arbitrary(&mut unstructured) else {
                return;
            };

            runtime.block_on(async {
                if let Err(e) = run_sequence(input).await {
                    eprintln!("Fuzz iteration failed: {}", e);
                }
            });
        });
    }
}
