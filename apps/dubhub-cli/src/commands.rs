//! Subcommand handlers.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, anyhow, bail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dubhub_api::{ApiClient, LoginSession};
use dubhub_pricing::{
    CostEstimate, QualityTier, estimate_cost, estimate_duration_from_size, format_duration,
    format_file_size,
};
use dubhub_protocol::{OperationType, StartTranslationRequest};
use dubhub_transfer::validate_source_file;
use dubhub_upload::{ChunkedUploadSession, JobOutcome, StatusPoller};

use crate::bridge::ApiStatusSource;
use crate::cli::Command;
use crate::config::CliConfig;
use crate::render;

const DEFAULT_RESOLUTION: &str = "1920x1080";

/// Effective configuration plus where it is persisted.
pub struct Context {
    pub config: CliConfig,
    pub config_path: PathBuf,
}

impl Context {
    pub fn new(config: CliConfig, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    fn client(&self) -> anyhow::Result<ApiClient> {
        Ok(ApiClient::new(&self.config.backend_url)?)
    }

    fn authed_client(&self) -> anyhow::Result<ApiClient> {
        let token = self
            .config
            .token()
            .ok_or_else(|| anyhow!("not logged in; run `dubhub login <mobile>` first"))?;
        Ok(self.client()?.with_token(token)?)
    }

    /// Persists `token` to the config file. The file is re-read so that
    /// environment overrides never end up on disk.
    fn store_token(&mut self, token: &str) -> anyhow::Result<()> {
        let mut on_disk = CliConfig::load_from(&self.config_path)?;
        on_disk.token = token.to_string();
        on_disk.save_to(&self.config_path)?;
        self.config.token = token.to_string();
        Ok(())
    }
}

pub async fn execute(command: Command, ctx: &mut Context) -> anyhow::Result<()> {
    match command {
        Command::Login {
            mobile,
            otp,
            password,
        } => login(ctx, &mobile, otp, password).await,
        Command::Logout => {
            ctx.store_token("")?;
            println!("logged out");
            Ok(())
        }
        Command::Signup { mobile, password } => signup(ctx, &mobile, password).await,
        Command::Estimate {
            operation,
            resolution,
            duration,
            file,
            balance,
        } => {
            let op = operation.unwrap_or(ctx.config.default_operation);
            let duration = match (duration, file) {
                (Some(d), _) => d,
                (None, Some(file)) => estimate_duration_from_size(validate_source_file(&file)?),
                (None, None) => 60.0,
            };
            let balance = if balance {
                let balance = ctx.authed_client()?.account_balance().await?;
                Some(balance.floor() as i64)
            } else {
                None
            };
            let estimate = estimate_cost(op, &resolution, duration, balance);
            for line in estimate_lines(op, &resolution, duration, &estimate) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Upload {
            file,
            operation,
            resolution,
            duration,
            wallet,
            no_wait,
        } => {
            let op = operation.unwrap_or(ctx.config.default_operation);
            upload(ctx, &file, op, resolution, duration, wallet, no_wait).await
        }
        Command::Status { project_id, watch } => status(ctx, project_id, watch).await,
        Command::Balance => {
            let balance = ctx.authed_client()?.account_balance().await?;
            println!("wallet balance: {balance:.0} Toman");
            Ok(())
        }
        Command::Topup { amount } => {
            let url = ctx.authed_client()?.wallet_payment(amount).await?;
            println!("complete the payment at: {url}");
            Ok(())
        }
        Command::Profile {
            first_name,
            last_name,
        } => {
            let message = ctx
                .authed_client()?
                .update_profile(&first_name, &last_name)
                .await?;
            println!("{}", or_default(message, "profile updated"));
            Ok(())
        }
        Command::Password => {
            let client = ctx.authed_client()?;
            let current = prompt("current password").await?;
            let new = prompt("new password").await?;
            let confirm = prompt("repeat new password").await?;
            let message = client.change_password(&current, &new, &confirm).await?;
            println!("{}", or_default(message, "password changed"));
            Ok(())
        }
    }
}

async fn login(
    ctx: &mut Context,
    mobile: &str,
    otp: bool,
    password: Option<String>,
) -> anyhow::Result<()> {
    let mut client = ctx.client()?;
    let session = if otp {
        let challenge = client.request_login_otp(mobile).await?;
        println!("{}", or_default(challenge.message, "code sent"));
        let code = prompt("code").await?;
        client
            .verify_login_otp(mobile, &code, &challenge.otp_id)
            .await?
    } else {
        let password = match password {
            Some(p) => p,
            None => prompt("password").await?,
        };
        client.login_password(mobile, &password).await?
    };
    finish_login(ctx, session)
}

async fn signup(ctx: &mut Context, mobile: &str, password: Option<String>) -> anyhow::Result<()> {
    let mut client = ctx.client()?;
    let challenge = client.request_signup_otp(mobile).await?;
    println!("{}", or_default(challenge.message, "code sent"));
    let code = prompt("code").await?;
    let password = match password {
        Some(p) => p,
        None => prompt("choose a password").await?,
    };
    let session = client
        .complete_signup(mobile, &code, &challenge.otp_id, &password)
        .await?;
    finish_login(ctx, session)
}

fn finish_login(ctx: &mut Context, session: LoginSession) -> anyhow::Result<()> {
    ctx.store_token(&session.token)
        .context("logged in but failed to save the session token")?;
    match session.user {
        Some(user) => println!("logged in as {}", user.mobile),
        None => println!("logged in"),
    }
    Ok(())
}

async fn upload(
    ctx: &Context,
    file: &Path,
    op: OperationType,
    resolution: Option<String>,
    duration: Option<f64>,
    wallet: bool,
    no_wait: bool,
) -> anyhow::Result<()> {
    let client = ctx.authed_client()?;
    let size = validate_source_file(file)?;
    let duration = duration.unwrap_or_else(|| estimate_duration_from_size(size));
    let preview = estimate_cost(
        op,
        resolution.as_deref().unwrap_or(DEFAULT_RESOLUTION),
        duration,
        None,
    );
    println!(
        "{}  {}  about {} Toman",
        op.display_name(),
        format_file_size(size),
        preview.total
    );

    let request = StartTranslationRequest {
        video_size: size,
        project_type: op,
        use_wallet_balance: wallet,
        resolution,
        duration: Some(duration),
    };
    let started = client.start_translation(&request).await?;
    let project_id = started.project_id;
    match (started.price, started.estimated_time.as_deref()) {
        (Some(price), Some(eta)) => {
            println!("project {project_id} created, price {price:.0} Toman, ready in {eta}")
        }
        (Some(price), None) => println!("project {project_id} created, price {price:.0} Toman"),
        _ => println!("project {project_id} created"),
    }

    let mut session = ChunkedUploadSession::new(started, file, ctx.config.session_config());
    let events = session
        .take_events()
        .ok_or_else(|| anyhow!("session events already taken"))?;
    let printer = tokio::spawn(render::pump(events));
    let ctrl_c = cancel_on_ctrl_c(session.cancel_token());

    let result = if no_wait {
        session.run().await.map(|transfer| (transfer, None))
    } else {
        session
            .run_to_completion(&ApiStatusSource::new(&client))
            .await
            .map(|outcome| (outcome.transfer, Some(outcome.job)))
    };

    ctrl_c.abort();
    drop(session);
    let _ = printer.await;

    let (transfer, job) = result?;
    info!(
        project_id,
        bytes = transfer.bytes_sent,
        chunks = transfer.chunks_sent,
        "upload finished"
    );
    match job {
        None | Some(JobOutcome::Completed) => Ok(()),
        Some(JobOutcome::Failed) => bail!("translation of project {project_id} failed"),
        Some(JobOutcome::Cancelled) => bail!("stopped waiting for project {project_id}"),
    }
}

async fn status(ctx: &Context, project_id: u64, watch: bool) -> anyhow::Result<()> {
    let client = ctx.authed_client()?;
    if !watch {
        let report = client.translation_status(project_id).await?;
        let mut line = format!("project {project_id}: {}", report.raw_status);
        if let Some(progress) = report.progress {
            line.push_str(&format!(" ({progress:.0}%)"));
        }
        if let Some(eta) = report.estimated_time_remaining {
            line.push_str(&format!(", about {eta} left"));
        }
        println!("{line}");
        return Ok(());
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let poller = StatusPoller::new(ctx.config.session_config().poll_interval, tx, cancel.clone());
    let printer = tokio::spawn(render::pump(rx));
    let ctrl_c = cancel_on_ctrl_c(cancel);

    let outcome = poller.run(&ApiStatusSource::new(&client), project_id).await;
    ctrl_c.abort();
    drop(poller);
    let _ = printer.await;

    match outcome {
        JobOutcome::Completed => Ok(()),
        JobOutcome::Failed => bail!("translation of project {project_id} failed"),
        JobOutcome::Cancelled => Ok(()),
    }
}

fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            cancel.cancel();
        }
    })
}

fn estimate_lines(
    op: OperationType,
    resolution: &str,
    duration_secs: f64,
    estimate: &CostEstimate,
) -> Vec<String> {
    let tier = QualityTier::from_resolution(resolution);
    let mut lines = vec![
        format!("operation:   {}", op.display_name()),
        format!("quality:     {} (x{})", tier.label(), tier.multiplier()),
        format!(
            "duration:    {} ({} billed min)",
            format_duration(duration_secs),
            estimate.minutes
        ),
        format!("per minute:  {} Toman", estimate.cost_per_minute),
        format!("total:       {} Toman", estimate.total),
    ];
    if let (Some(remaining), Some(affordable)) = (estimate.remaining, estimate.affordable) {
        if affordable {
            lines.push(format!("after:       {remaining} Toman left in wallet"));
        } else {
            lines.push(format!(
                "after:       short by {} Toman, top up with `dubhub topup`",
                remaining.unsigned_abs()
            ));
        }
    }
    lines
}

fn or_default(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

async fn prompt(label: &str) -> anyhow::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{label}: ").as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    if read == 0 {
        bail!("no input for {label}");
    }
    Ok(line.trim().to_string())
}
