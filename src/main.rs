use std::net::IpAddr;
use std::process::ExitCode;
use std::time::Duration;

use bringin_offramp::auth::Credentials;
use bringin_offramp::error::Error;
use bringin_offramp::offramp::{
    DEFAULT_LABEL, Invoice, IpPolicy, OfframpClient, OfframpConfig, Sats,
};
use bringin_offramp::{BRINGIN_HOST, Result};
use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Request an off-ramp order at Bringin and print the invoice to pay.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Opt {
    /// Application API key issued by Bringin.
    #[arg(long, env = "BRINGIN_API_KEY")]
    api_key: String,

    /// Application secret used to sign requests.
    #[arg(long, env = "BRINGIN_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Lightning address the payout is tied to, e.g. `alice@example.com`.
    #[arg(long, env = "BRINGIN_LIGHTNING_ADDRESS")]
    lightning_address: String,

    /// Amount to off-ramp, in satoshis.
    #[arg(long, env = "BRINGIN_AMOUNT_SATS")]
    amount_sats: Sats,

    /// Bringin API host.
    #[arg(long, env = "BRINGIN_HOST", default_value = BRINGIN_HOST)]
    host: Url,

    /// Label shown for the payout.
    #[arg(long, default_value = DEFAULT_LABEL)]
    label: String,

    /// Caller-side reference attached to the order.
    #[arg(long)]
    source_id: Option<String>,

    /// Send this IP address instead of discovering it.
    #[arg(long, conflicts_with_all = ["no_ip", "ip_service"])]
    ip: Option<IpAddr>,

    /// Send the order without an IP address.
    #[arg(long, conflicts_with = "ip_service")]
    no_ip: bool,

    /// IP echo service used for discovery.
    #[arg(long, default_value = bringin_offramp::ip::DEFAULT_IP_SERVICE)]
    ip_service: Url,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,
}

impl Opt {
    fn into_config(self) -> Result<OfframpConfig> {
        let ip = match (self.ip, self.no_ip) {
            (Some(ip), _) => IpPolicy::Fixed(ip),
            (None, true) => IpPolicy::Omit,
            (None, false) => IpPolicy::Echo(self.ip_service),
        };

        OfframpConfig::builder()
            .credentials(Credentials::new(self.api_key, SecretString::from(self.secret_key))?)
            .lightning_address(self.lightning_address)
            .amount(self.amount_sats)
            .host(self.host)
            .label(self.label)
            .maybe_source_id(self.source_id)
            .ip(ip)
            .timeout(Duration::from_secs(self.timeout))
            .build()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opt = Opt::parse();

    let result = run(opt).await;
    match &result {
        Ok(invoice) => report_invoice(invoice),
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), status = ?e.status_code(), "offramp run aborted");
            report_failure(e);
        }
    }

    exit_code(&result)
}

/// Zero only when an invoice came back.
fn exit_code(result: &Result<Invoice>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

#[expect(clippy::print_stdout, reason = "the invoice is the program's output")]
fn report_invoice(invoice: &Invoice) {
    println!("Offramp order created, pay invoice: {invoice}");
}

#[expect(clippy::print_stderr, reason = "diagnostics go to stderr")]
fn report_failure(e: &Error) {
    eprintln!("Offramp run failed: {e}");
}

async fn run(opt: Opt) -> Result<Invoice> {
    let client = OfframpClient::new(opt.into_config()?)?;
    client.run().await
}
