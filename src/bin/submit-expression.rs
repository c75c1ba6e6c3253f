//! Expression submission utility
//!
//! Submits an expression to a running orchestrator and optionally waits for
//! the result.
//!
//! ## Usage
//!
//! ```bash
//! # Submit and print the identifier
//! submit-expression "2 + 2 * 2"
//!
//! # Submit to another orchestrator and wait for the outcome
//! submit-expression --url http://calc:8080 --wait "10 / 4 - 1"
//! ```

use clap::Parser;
use distcalc::protocol::routes::{endpoint_url, expression_url, CALCULATE_PATH};
use distcalc::protocol::{CalculateRequest, CalculateResponse, ErrorResponse, Expression};
use std::process;
use tokio::time::{sleep, Duration, Instant};
use url::Url;

#[derive(Parser)]
#[command(
    name = "submit-expression",
    about = "Submit an arithmetic expression to a distcalc orchestrator"
)]
struct Args {
    /// Expression with space-separated tokens, e.g. "2 + 2 * 2"
    expression: String,

    /// Orchestrator base URL
    #[arg(long, env = "ORCHESTRATOR_URL", default_value = "http://localhost:8080")]
    url: Url,

    /// Poll until the expression reaches a terminal status
    #[arg(long)]
    wait: bool,

    /// Polling interval in milliseconds while waiting
    #[arg(long, default_value_t = 500)]
    poll_ms: u64,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("❌ {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let response = client
        .post(endpoint_url(&args.url, CALCULATE_PATH))
        .json(&CalculateRequest {
            expression: args.expression.clone(),
        })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body: Option<ErrorResponse> = response.json().await.ok();
        let reason = body.map(|b| b.error).unwrap_or_else(|| status.to_string());
        return Err(format!("submission rejected ({status}): {reason}").into());
    }

    let created: CalculateResponse = response.json().await?;
    println!("📤 Submitted '{}' as {}", args.expression, created.id);

    if !args.wait {
        return Ok(());
    }

    let url = expression_url(&args.url, &created.id.to_string());
    let deadline = Instant::now() + Duration::from_secs(args.timeout_secs);

    loop {
        let expression: Expression = client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if expression.status.is_terminal() {
            match (expression.result, expression.error) {
                (Some(value), _) => println!("✅ {} = {value}", expression.expression),
                (None, Some(error)) => println!("❌ {} failed: {error}", expression.expression),
                (None, None) => println!("⚠️  {} is {}", expression.expression, expression.status),
            }
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(format!(
                "timed out after {}s; expression still {}",
                args.timeout_secs, expression.status
            )
            .into());
        }

        sleep(Duration::from_millis(args.poll_ms)).await;
    }
}
