use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chain_sol::amount::{format_ui_amount, parse_ui_amount, SOL_DECIMALS};
use chain_sol::{address_to_bytes, pubkey_to_address, Keypair, SignedTransaction};
use signer_core::{offline, Submitter, TokenInspector, TransferBuilder, WalletConfig};
use sol_rpc::{Cluster, HttpRpcClient, SolanaRpc};
use tracing::{error, info};

use crate::Command;

pub async fn run(command: Command, config: &WalletConfig) -> Result<()> {
    match command {
        Command::Keygen => keygen(config),
        Command::Address => addresses(config),
        Command::Checkpoint => checkpoint(config).await,
        Command::Transfer {
            from,
            to,
            amount,
            raw,
            out,
        } => {
            let lamports = if raw {
                amount
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid lamport amount: {amount}"))?
            } else {
                parse_ui_amount(&amount, SOL_DECIMALS)?
            };
            transfer(config, &from, &to, lamports, out.as_deref()).await
        }
        Command::TokenTransfer {
            from,
            to,
            mint,
            amount,
            decimals,
            out,
        } => token_transfer(config, &from, &to, &mint, &amount, decimals, out.as_deref()).await,
        Command::MintTo {
            payer,
            authority,
            mint,
            owner,
            amount,
            decimals,
            out,
        } => {
            let authority = authority.unwrap_or_else(|| payer.clone());
            let target = MintTarget {
                payer: &payer,
                authority: &authority,
                mint: &mint,
                owner: &owner,
            };
            mint_to(config, target, &amount, decimals, out.as_deref()).await
        }
        Command::Sign { input, signer, out } => sign(config, &input, &signer, out.as_deref()),
        Command::Inspect { input } => inspect(&input),
        Command::Submit { input } => submit(config, &input).await,
        Command::Status { id } => status(config, &id).await,
        Command::History { address, limit } => history(config, &address, limit).await,
        Command::Balance { address } => balance(config, &address).await,
        Command::Airdrop { address, amount } => {
            let lamports = parse_ui_amount(&amount, SOL_DECIMALS)?;
            airdrop(config, &address, lamports).await
        }
        Command::Tokens { address } => tokens(config, &address).await,
        Command::MintInfo { mint } => mint_info(config, &mint).await,
        Command::Owner { address } => owner(config, &address).await,
        Command::Rent { address } => rent(config, &address).await,
    }
}

// ─── Keys ────────────────────────────────────────────────────────────

fn keygen(config: &WalletConfig) -> Result<()> {
    let store = config.keypair_store();
    let keypair = store.create()?;
    let path = store.path_for(&keypair.address())?;
    info!(path = %path.display(), "Keypair created");
    println!("{}", keypair.address());
    Ok(())
}

fn addresses(config: &WalletConfig) -> Result<()> {
    if let Some(keypair) = config.env_keypair()? {
        println!("{} (SOLANA_PRIVATE_KEY)", keypair.address());
    }
    for address in config.keypair_store().list()? {
        println!("{address}");
    }
    Ok(())
}

/// The environment key if it matches `address`, otherwise the stored one.
fn resolve_signer(config: &WalletConfig, address: &str) -> Result<Keypair> {
    if let Some(keypair) = config.env_keypair()? {
        if keypair.address() == address {
            return Ok(keypair);
        }
    }
    config
        .keypair_store()
        .load(address)
        .with_context(|| format!("No keypair available for {address}"))
}

fn pubkey(address: &str) -> Result<[u8; 32]> {
    address_to_bytes(address).with_context(|| format!("Invalid address: {address}"))
}

// ─── Build + sign ────────────────────────────────────────────────────

async fn checkpoint(config: &WalletConfig) -> Result<()> {
    let rpc = config.rpc_client()?;
    let checkpoint = TransferBuilder::new(&rpc).latest_checkpoint().await?;
    println!("{}", checkpoint.blockhash_base58());
    println!("last valid block height: {}", checkpoint.last_valid_block_height);
    Ok(())
}

async fn transfer(
    config: &WalletConfig,
    from: &str,
    to: &str,
    lamports: u64,
    out: Option<&Path>,
) -> Result<()> {
    let sender = resolve_signer(config, from)?;
    let rpc = config.rpc_client()?;
    let builder = TransferBuilder::new(&rpc);

    let checkpoint = builder.latest_checkpoint().await?;
    let unsigned =
        builder.build_native_transfer(&sender.pubkey(), &pubkey(to)?, lamports, &checkpoint)?;
    let signed = offline::sign(&unsigned, &sender)?;

    info!(
        amount = %format_ui_amount(lamports, SOL_DECIMALS),
        id = ?signed.id(),
        "Signed SOL transfer"
    );
    write_blob(&signed, out)
}

/// Scale a token amount by the mint's on-chain decimals. A `--decimals`
/// that disagrees with the mint is an error.
async fn token_base_units<R: SolanaRpc + ?Sized>(
    rpc: &R,
    mint: &[u8; 32],
    amount: &str,
    decimals: Option<u8>,
) -> Result<u64> {
    let decimals = TokenInspector::new(rpc).resolve_decimals(mint, decimals).await?;
    Ok(parse_ui_amount(amount, decimals)?)
}

async fn token_transfer(
    config: &WalletConfig,
    from: &str,
    to: &str,
    mint: &str,
    amount: &str,
    decimals: Option<u8>,
    out: Option<&Path>,
) -> Result<()> {
    let sender = resolve_signer(config, from)?;
    let mint = pubkey(mint)?;
    let rpc = config.rpc_client()?;
    let amount = token_base_units(&rpc, &mint, amount, decimals).await?;
    let builder = TransferBuilder::new(&rpc);

    let checkpoint = builder.latest_checkpoint().await?;
    let unsigned = builder
        .build_token_transfer(&sender.pubkey(), &pubkey(to)?, &mint, amount, &checkpoint)
        .await?;
    let signed = offline::sign(&unsigned, &sender)?;

    info!(id = ?signed.id(), "Signed token transfer");
    write_blob(&signed, out)
}

/// Addresses involved in a `mint-to`.
struct MintTarget<'a> {
    payer: &'a str,
    authority: &'a str,
    mint: &'a str,
    owner: &'a str,
}

async fn mint_to(
    config: &WalletConfig,
    target: MintTarget<'_>,
    amount: &str,
    decimals: Option<u8>,
    out: Option<&Path>,
) -> Result<()> {
    let MintTarget {
        payer,
        authority,
        mint,
        owner,
    } = target;
    let mint_key = pubkey(mint)?;
    let rpc = config.rpc_client()?;
    let amount = token_base_units(&rpc, &mint_key, amount, decimals).await?;
    let builder = TransferBuilder::new(&rpc);

    let checkpoint = builder.latest_checkpoint().await?;
    let unsigned = builder
        .build_mint_to(
            &pubkey(payer)?,
            &pubkey(authority)?,
            &mint_key,
            &pubkey(owner)?,
            amount,
            &checkpoint,
        )
        .await?;

    let mut signed = SignedTransaction::new(unsigned);
    let mut signers = vec![payer];
    if authority != payer {
        signers.push(authority);
    }
    for address in signers {
        match resolve_signer(config, address) {
            Ok(keypair) => offline::partial_sign(&mut signed, &keypair)?,
            Err(e) => info!(signer = address, error = %e, "Leaving signature slot empty"),
        }
    }
    if signed.missing_signers().len() == signed.signatures.len() {
        bail!("None of the required signers ({payer}, {authority}) are available locally");
    }

    write_blob(&signed, out)
}

fn sign(config: &WalletConfig, input: &str, signer: &str, out: Option<&Path>) -> Result<()> {
    let mut signed = offline::decode(&read_blob(input)?)?;
    let keypair = resolve_signer(config, signer)?;
    offline::partial_sign(&mut signed, &keypair)?;
    write_blob(&signed, out)
}

// ─── Blob inspection + submission ────────────────────────────────────

fn inspect(input: &str) -> Result<()> {
    let signed = offline::decode(&read_blob(input)?)?;
    let message = &signed.message;

    println!("id:           {}", signed.id().as_deref().unwrap_or("(unsigned)"));
    println!(
        "fee payer:    {}",
        message.fee_payer().map(pubkey_to_address).unwrap_or_default()
    );
    println!("blockhash:    {}", pubkey_to_address(&message.recent_blockhash));
    println!("signers:");
    for (key, sig) in message.signer_keys().iter().zip(&signed.signatures) {
        let state = if sig.iter().all(|b| *b == 0) { "missing" } else { "signed" };
        println!("  {} {state}", pubkey_to_address(key));
    }
    println!("instructions:");
    for program in message.instruction_programs() {
        println!("  {}", pubkey_to_address(&program));
    }
    match signed.verify_signatures() {
        Ok(()) if signed.is_fully_signed() => println!("status:       ready to submit"),
        Ok(()) => println!("status:       awaiting signatures"),
        Err(e) => println!("status:       invalid ({e})"),
    }
    Ok(())
}

async fn submit(config: &WalletConfig, input: &str) -> Result<()> {
    let blob = read_blob(input)?;
    let rpc = config.rpc_client()?;

    match Submitter::new(&rpc).submit(&blob).await {
        Ok(id) => {
            println!("{id}");
            Ok(())
        }
        Err(e) => {
            if input != "-" {
                error!(blob = input, "Submission failed; the blob is unchanged and can be resubmitted");
            }
            Err(e.into())
        }
    }
}

async fn status(config: &WalletConfig, id: &str) -> Result<()> {
    let rpc = config.rpc_client()?;
    match Submitter::new(&rpc).status(id).await? {
        Some(record) => {
            let outcome = match record.succeeded() {
                Some(true) => "success",
                Some(false) => "failed",
                None => "unknown",
            };
            println!("slot:   {}", record.slot);
            println!("status: {outcome}");
            if let Some(meta) = &record.meta {
                println!("fee:    {} SOL", format_ui_amount(meta.fee, SOL_DECIMALS));
            }
        }
        None => println!("not found"),
    }
    Ok(())
}

async fn history(config: &WalletConfig, address: &str, limit: usize) -> Result<()> {
    let rpc = config.rpc_client()?;
    let entries = Submitter::new(&rpc).history(&pubkey(address)?, limit).await?;
    for entry in entries {
        let outcome = if entry.signature.err.is_some() { "failed" } else { "ok" };
        println!("{} slot {} {outcome}", entry.signature.signature, entry.signature.slot);
    }
    Ok(())
}

async fn balance(config: &WalletConfig, address: &str) -> Result<()> {
    let rpc = config.rpc_client()?;
    let lamports = rpc.get_balance(&pubkey(address)?).await?;
    println!("{} SOL", format_ui_amount(lamports, SOL_DECIMALS));
    Ok(())
}

async fn airdrop(config: &WalletConfig, address: &str, lamports: u64) -> Result<()> {
    if let Some(cluster) = config.cluster {
        if !cluster.supports_airdrop() {
            bail!("Airdrops are not available on {cluster}");
        }
    } else if config.rpc.url == Cluster::MainnetBeta.url() {
        bail!("Airdrops are not available on mainnet-beta");
    }

    let rpc: HttpRpcClient = config.rpc_client()?;
    let signature = rpc.request_airdrop(&pubkey(address)?, lamports).await?;
    println!("{signature}");
    Ok(())
}

// ─── Token queries ───────────────────────────────────────────────────

async fn tokens(config: &WalletConfig, address: &str) -> Result<()> {
    let rpc = config.rpc_client()?;
    let holdings = TokenInspector::new(&rpc).holdings(&pubkey(address)?).await?;
    if holdings.is_empty() {
        println!("no token accounts");
    }
    for holding in holdings {
        let frozen = if holding.frozen { " (frozen)" } else { "" };
        println!(
            "{} {} in {}{frozen}",
            pubkey_to_address(&holding.mint),
            format_ui_amount(holding.amount, holding.decimals),
            pubkey_to_address(&holding.account)
        );
    }
    Ok(())
}

async fn mint_info(config: &WalletConfig, mint: &str) -> Result<()> {
    let rpc = config.rpc_client()?;
    let state = TokenInspector::new(&rpc).mint_info(&pubkey(mint)?).await?;
    let authority = |key: Option<[u8; 32]>| {
        key.map(|k| pubkey_to_address(&k))
            .unwrap_or_else(|| "none".into())
    };

    println!("decimals:         {}", state.decimals);
    println!("supply:           {}", format_ui_amount(state.supply, state.decimals));
    println!("mint authority:   {}", authority(state.mint_authority));
    println!("freeze authority: {}", authority(state.freeze_authority));
    Ok(())
}

async fn owner(config: &WalletConfig, address: &str) -> Result<()> {
    let rpc = config.rpc_client()?;
    let resolved = TokenInspector::new(&rpc).account_owner(&pubkey(address)?).await?;
    println!("owner: {}", pubkey_to_address(&resolved.owner));
    if let Some(mint) = resolved.mint {
        println!("mint:  {}", pubkey_to_address(&mint));
    }
    Ok(())
}

async fn rent(config: &WalletConfig, address: &str) -> Result<()> {
    let rpc = config.rpc_client()?;
    let lamports = TokenInspector::new(&rpc)
        .rent_exempt_minimum(&pubkey(address)?)
        .await?;
    println!("{} SOL", format_ui_amount(lamports, SOL_DECIMALS));
    Ok(())
}

// ─── Blob I/O ────────────────────────────────────────────────────────

fn read_blob(input: &str) -> Result<String> {
    if input == "-" {
        let mut blob = String::new();
        std::io::stdin()
            .read_to_string(&mut blob)
            .context("Failed to read blob from stdin")?;
        return Ok(blob);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read blob from {input}"))
}

fn write_blob(signed: &SignedTransaction, out: Option<&Path>) -> Result<()> {
    let blob = offline::encode(signed)?;
    match out {
        Some(path) => {
            fs::write(path, format!("{blob}\n"))
                .with_context(|| format!("Failed to write blob to {}", path.display()))?;
            info!(path = %path.display(), missing = signed.missing_signers().len(), "Wrote blob");
        }
        None => println!("{blob}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tx.hex");
        let keypair = Keypair::from_seed(&[1u8; 32]);
        let unsigned =
            chain_sol::build_sol_transfer(&keypair.pubkey(), &[2u8; 32], 1, &[3u8; 32]).unwrap();
        let signed = offline::sign(&unsigned, &keypair).unwrap();

        write_blob(&signed, Some(&path)).unwrap();
        let blob = read_blob(path.to_str().unwrap()).unwrap();

        assert_eq!(offline::decode(&blob).unwrap(), signed);
    }

    #[test]
    fn missing_blob_file_is_an_error() {
        assert!(read_blob("/nonexistent/tx.hex").is_err());
    }

    #[test]
    fn pubkey_rejects_garbage() {
        assert!(pubkey("not-an-address").is_err());
        assert!(pubkey("11111111111111111111111111111111").is_ok());
    }

    #[test]
    fn anyhow_keeps_wallet_error() {
        let err = anyhow::Error::from(signer_core::WalletError::NotFound("x".into()));
        assert!(err.downcast_ref::<signer_core::WalletError>().is_some());
    }
}
