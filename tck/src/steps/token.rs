//! Token service steps: creation, minting, balances and transfers.

use ledger_common::{
    ErrorKind, Hbar, LedgerError, TokenCreate, TokenId, TokenTransfer, Transaction,
    TransactionBody, TransactionReceipt,
};

use crate::ensure_step;
use crate::error::StepFailure;
use crate::fixtures::{MultiPartyTransfer, PendingTransfer, TestAccount, TREASURY_INDEX};
use crate::scenarios::{StepArgs, StepFuture, StepRegistry, World};

use super::{ensure_hbar_above, ordinal};

const TOKEN_NAME: &str = "Test Token";
const TOKEN_SYMBOL: &str = "HTT";
const TOKEN_DECIMALS: u32 = 2;
/// Amount the fixed-supply mint attempt asks for.
const REJECTED_MINT_AMOUNT: u64 = 100;

pub(super) fn register(registry: &mut StepRegistry) -> Result<(), regex_lite::Error> {
    registry.register(r"A Hedera account with more than (\d+) hbar", treasury_account)?;
    registry.register(r"I create a token named Test Token \(HTT\)", create_mintable_token)?;
    registry.register(r#"The token has the name "([^"]*)""#, token_has_name)?;
    registry.register(r#"The token has the symbol "([^"]*)""#, token_has_symbol)?;
    registry.register(r"The token has (\d+) decimals", token_has_decimals)?;
    registry.register(r"The token is owned by the account", token_owned_by_treasury)?;
    registry.register(r"An attempt to mint (\d+) additional tokens succeeds", mint_succeeds)?;
    registry.register(
        r"I create a fixed supply token named Test Token \(HTT\) with (\d+) tokens",
        create_fixed_supply_token,
    )?;
    registry.register(r"The total supply of the token is (\d+)", total_supply_is)?;
    registry.register(r"An attempt to mint tokens fails", mint_fails)?;
    registry.register(r"A first hedera account with more than (\d+) hbar", first_account)?;
    registry.register(r"A second Hedera account", second_account)?;
    registry.register(
        r"A token named Test Token \(HTT\) with (\d+) tokens",
        create_transferable_token,
    )?;
    registry.register(
        r"The (first|second|third|fourth) account holds (\d+) HTT tokens",
        account_holds,
    )?;
    registry.register(
        r"The (first|second) account creates a transaction to transfer (\d+) HTT tokens to the (first|second) account",
        create_transfer,
    )?;
    registry.register(
        r"The (first|second) account (?:submits|has submitted) the transaction",
        submit_transaction,
    )?;
    registry.register(
        r"The (first|second) account has paid for the transaction fee",
        paid_transaction_fee,
    )?;
    registry.register(
        r"A (first|second|third|fourth) [Hh]edera account with (more than )?(\d+) hbar and (\d+) HTT tokens",
        account_with_tokens,
    )?;
    registry.register(
        r"A transaction is created to transfer (\d+) HTT tokens out of the first and second account and (\d+) HTT tokens into the third account and (\d+) HTT tokens into the fourth account",
        create_multi_party_transfer,
    )?;
    Ok(())
}

fn treasury_account(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let hbars: i64 = args.get(0)?;
        let account = world.use_operator(TREASURY_INDEX)?;
        ensure_hbar_above(world, &account, hbars).await
    })
}

/// Create a token with the treasury as treasury and admin key.
async fn create_token(world: &mut World, token: TokenCreate) -> Result<(), StepFailure> {
    let treasury = world.context.treasury()?;
    let mut transaction = Transaction::new(TransactionBody::TokenCreate(token));
    world.client.freeze(&mut transaction)?;
    transaction.sign(&treasury.key)?;

    let receipt = world.client.execute_and_confirm(transaction).await?;
    let token_id = receipt
        .token_id
        .ok_or_else(|| StepFailure::Assertion("Receipt carries no token id".to_string()))?;
    world.context.set_token_id(token_id)?;
    world.context.set_last_transaction_id(receipt.transaction_id);
    if log::log_enabled!(log::Level::Info) {
        log::info!(
            "Created token {} (supply {:?})",
            token_id,
            receipt.total_supply
        );
    }
    Ok(())
}

fn create_mintable_token(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let treasury = world.context.treasury()?;
        let token = TokenCreate::new(TOKEN_NAME, TOKEN_SYMBOL, treasury.id)
            .with_decimals(TOKEN_DECIMALS)
            .with_initial_supply(0)
            .with_admin_key(treasury.public_key())
            .with_supply_key(treasury.public_key());
        create_token(world, token).await
    })
}

fn create_fixed_supply_token(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let supply: u64 = args.get(0)?;
        let treasury = world.context.treasury()?;
        let token = TokenCreate::new(TOKEN_NAME, TOKEN_SYMBOL, treasury.id)
            .with_decimals(TOKEN_DECIMALS)
            .with_initial_supply(supply)
            .with_admin_key(treasury.public_key());
        create_token(world, token).await
    })
}

fn create_transferable_token(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let supply: u64 = args.get(0)?;
        let treasury = world.context.treasury()?;
        let token = TokenCreate::new(TOKEN_NAME, TOKEN_SYMBOL, treasury.id)
            .with_decimals(TOKEN_DECIMALS)
            .with_initial_supply(supply)
            .with_admin_key(treasury.public_key())
            .with_freeze_default(false);
        create_token(world, token).await
    })
}

fn token_has_name(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected = args.str(0)?;
        let info = world.client.token_info(&world.context.token_id()?).await?;
        ensure_step!(
            info.name == expected,
            "Token name is {:?}, expected {:?}",
            info.name,
            expected
        );
        Ok(())
    })
}

fn token_has_symbol(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected = args.str(0)?;
        let info = world.client.token_info(&world.context.token_id()?).await?;
        ensure_step!(
            info.symbol == expected,
            "Token symbol is {:?}, expected {:?}",
            info.symbol,
            expected
        );
        Ok(())
    })
}

fn token_has_decimals(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected: u32 = args.get(0)?;
        let info = world.client.token_info(&world.context.token_id()?).await?;
        ensure_step!(
            info.decimals == expected,
            "Token has {} decimals, expected {}",
            info.decimals,
            expected
        );
        Ok(())
    })
}

fn token_owned_by_treasury(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let treasury = world.context.treasury()?;
        let info = world.client.token_info(&world.context.token_id()?).await?;
        ensure_step!(
            info.treasury_account_id == treasury.id,
            "Token treasury is {}, expected {}",
            info.treasury_account_id,
            treasury.id
        );
        Ok(())
    })
}

fn total_supply_is(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected: u64 = args.get(0)?;
        let info = world.client.token_info(&world.context.token_id()?).await?;
        ensure_step!(
            info.total_supply == expected,
            "Total supply is {}, expected {}",
            info.total_supply,
            expected
        );
        Ok(())
    })
}

/// Mint `amount` signed by the treasury, which holds the supply key when
/// there is one.
async fn mint(
    world: &World,
    token_id: TokenId,
    treasury: &TestAccount,
    amount: u64,
) -> Result<TransactionReceipt, LedgerError> {
    let mut transaction = Transaction::new(TransactionBody::TokenMint { token_id, amount });
    world.client.freeze(&mut transaction)?;
    transaction.sign(&treasury.key)?;
    world.client.execute_and_confirm(transaction).await
}

fn mint_succeeds(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let amount: u64 = args.get(0)?;
        let token_id = world.context.token_id()?;
        let treasury = world.context.treasury()?;
        let receipt = mint(world, token_id, &treasury, amount).await?;
        ensure_step!(
            receipt.status.is_success(),
            "Mint returned status {}",
            receipt.status
        );
        Ok(())
    })
}

fn mint_fails(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let token_id = world.context.token_id()?;
        let treasury = world.context.treasury()?;
        match mint(world, token_id, &treasury, REJECTED_MINT_AMOUNT).await {
            Ok(receipt) => Err(StepFailure::Assertion(format!(
                "Token minting should have failed, got status {}",
                receipt.status
            ))),
            Err(err) if err.kind() == ErrorKind::Submission => {
                if log::log_enabled!(log::Level::Info) {
                    log::info!("Mint rejected as expected: {}", err);
                }
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    })
}

fn first_account(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let hbars: i64 = args.get(0)?;
        let account = world.account(1)?;
        if log::log_enabled!(log::Level::Info) {
            log::info!("Account1: {}", account.id);
        }
        ensure_hbar_above(world, &account, hbars).await
    })
}

fn second_account(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let account = world.account(2)?;
        if log::log_enabled!(log::Level::Info) {
            log::info!("Account2: {}", account.id);
        }
        Ok(())
    })
}

/// Accounts the holds step may fund from the treasury before any transfer.
const FUNDED_HOLDERS: usize = 2;

/// The first time the first or second account is named before any transfer,
/// it is funded to the amount. Every other use only reads the balance.
fn account_holds(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let index = ordinal(args.str(0)?)?;
        let expected: u64 = args.get(1)?;
        let token_id = world.context.token_id()?;
        let account = world.account(index)?;

        let funds = index <= FUNDED_HOLDERS
            && !world.context.transfer_submitted()
            && !world.context.is_funded(index);
        let held = if funds {
            let treasury = world.context.treasury()?;
            let observed = world
                .reconciler()
                .reconcile(token_id, &treasury, &account, expected)
                .await?;
            world.context.mark_funded(index);
            observed.amount
        } else {
            world
                .client
                .account_balance(&account.id)
                .await?
                .token_balance(&token_id)
        };
        if log::log_enabled!(log::Level::Info) {
            log::info!("Account {} balance: {}", index, held);
        }
        ensure_step!(
            held == expected,
            "{} holds {} HTT tokens, expected {}",
            account.id,
            held,
            expected
        );
        Ok(())
    })
}

fn create_transfer(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let sender = world.account(ordinal(args.str(0)?)?)?;
        let amount: i64 = args.get(1)?;
        let receiver = world.account(ordinal(args.str(2)?)?)?;
        let token_id = world.context.token_id()?;

        let transaction = Transaction::token_transfer(vec![
            TokenTransfer {
                token_id,
                account_id: sender.id,
                amount: -amount,
            },
            TokenTransfer {
                token_id,
                account_id: receiver.id,
                amount,
            },
        ]);
        world.context.set_pending(PendingTransfer::Single {
            transaction,
            signers: vec![sender.index],
        });
        Ok(())
    })
}

fn submit_transaction(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let submitter = world.account(ordinal(args.str(0)?)?)?;
        match world.context.take_pending()? {
            PendingTransfer::Single {
                mut transaction,
                signers,
            } => {
                transaction.freeze_with(submitter.id);
                for index in signers {
                    let signer = world.account(index)?;
                    transaction.sign(&signer.key)?;
                }
                transaction.sign(&submitter.key)?;

                let receipt = world.client.execute_and_confirm(transaction).await?;
                if log::log_enabled!(log::Level::Info) {
                    log::info!(
                        "{} submitted transaction {}: {}",
                        submitter.id,
                        receipt.transaction_id,
                        receipt.status
                    );
                }
                world.context.set_last_transaction_id(receipt.transaction_id);
            }
            PendingTransfer::MultiParty(transfer) => {
                let mode = world.config.settlement_mode;
                let outcome = transfer
                    .paid_by(submitter)
                    .settle(&world.client, mode)
                    .await?;
                for skipped in &outcome.skipped {
                    if log::log_enabled!(log::Level::Warn) {
                        log::warn!(
                            "Leg of {} skipped: balance {} does not exceed {}",
                            skipped.account_id,
                            skipped.balance,
                            skipped.amount
                        );
                    }
                }
                if let Some(last) = outcome.transactions.last() {
                    world.context.set_last_transaction_id(*last);
                }
            }
        }
        world.context.mark_transfer_submitted();
        Ok(())
    })
}

fn paid_transaction_fee(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let payer = world.account(ordinal(args.str(0)?)?)?;
        let transaction_id = world.context.last_transaction_id()?;
        let record = world.client.record(&transaction_id).await?;
        ensure_step!(
            record.payer == payer.id,
            "Fee for {} was paid by {}, expected {}",
            transaction_id,
            record.payer,
            payer.id
        );
        ensure_step!(
            record.transaction_fee > Hbar::ZERO,
            "No fee charged for {}",
            transaction_id
        );
        Ok(())
    })
}

fn account_with_tokens(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let index = ordinal(args.str(0)?)?;
        let asserts_hbar = !args.str(1)?.is_empty();
        let hbars: i64 = args.get(2)?;
        let desired: u64 = args.get(3)?;
        let account = world.account(index)?;
        if log::log_enabled!(log::Level::Info) {
            log::info!("Account{}: {}", index, account.id);
        }

        if asserts_hbar {
            ensure_hbar_above(world, &account, hbars).await?;
        } else if log::log_enabled!(log::Level::Debug) {
            log::debug!("Account{} described with {} hbar", index, hbars);
        }

        let token_id = world.context.token_id()?;
        let treasury = world.context.treasury()?;
        let observed = world
            .reconciler()
            .reconcile(token_id, &treasury, &account, desired)
            .await?;
        world.context.mark_funded(index);
        ensure_step!(
            observed.amount == desired,
            "{} holds {} HTT tokens after funding, expected {}",
            account.id,
            observed.amount,
            desired
        );
        Ok(())
    })
}

fn create_multi_party_transfer(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let out_amount: u64 = args.get(0)?;
        let third_amount: u64 = args.get(1)?;
        let fourth_amount: u64 = args.get(2)?;
        let token_id = world.context.token_id()?;

        let transfer = MultiPartyTransfer::new(token_id)
            .debit(world.account(1)?, out_amount)
            .debit(world.account(2)?, out_amount)
            .credit(world.account(3)?, third_amount)
            .credit(world.account(4)?, fourth_amount);
        transfer.validate()?;
        world
            .context
            .set_pending(PendingTransfer::MultiParty(transfer));
        Ok(())
    })
}
