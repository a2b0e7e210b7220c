use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;

use talon::cli::{Cli, Commands};
use talon::config::{ProtocolSelection, ScanContext};
use talon::models::TierConfig;
use talon::probes::payloads::PayloadSet;
use talon::reporter::{ConsoleReporter, HtmlExporter, JsonExporter, Report};
use talon::scanner::Scanner;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            url,
            protocols,
            token,
            admin_token,
            header,
            concurrency,
            timeout,
            session_timeout,
            timing_threshold_ms,
            payloads,
            public_paths,
            graphql_path,
            soap_path,
            output,
            verbose,
        } => {
            let selection = ProtocolSelection::parse(&protocols)?;

            let mut ctx = ScanContext::new(&url);
            ctx.concurrency = concurrency;
            ctx.request_timeout = Duration::from_secs(timeout);
            ctx.session_timeout = Duration::from_secs(session_timeout);
            ctx.timing_threshold_ms = timing_threshold_ms;
            ctx.graphql_path = graphql_path;
            ctx.soap_path = soap_path;
            if let Some(token) = token {
                ctx.credentials.normal = TierConfig::with_token(token, header.clone());
            }
            if let Some(admin_token) = admin_token {
                ctx.credentials.elevated = TierConfig::with_token(admin_token, header);
            }
            if let Some(path) = payloads {
                ctx.payloads = PayloadSet::load_overrides(&path)?;
            }
            if let Some(paths) = public_paths {
                ctx.public_paths = paths.split(',').map(|p| p.trim().to_string()).collect();
            }

            let cancel = ctx.cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\n{}", "Interrupt received, finalizing partial results...".yellow());
                    cancel.cancel();
                }
            });

            println!(
                "{} {}",
                "Assessing".green().bold(),
                ctx.base_url.white().bold()
            );
            let scanner = Scanner::new(ctx, verbose);
            let session = scanner.run(selection).await?;
            let report = Report::from_session(session);

            ConsoleReporter::new().print(&report);

            if let Some(path) = output {
                JsonExporter::export(&report, &path)?;
                println!("\nReport written to {}", path.white().bold());
            }
        }

        Commands::Report {
            input,
            format,
            output,
        } => {
            let report = JsonExporter::load(&input)?;
            match format.as_str() {
                "html" => {
                    let path = output.unwrap_or_else(|| "talon-report.html".to_string());
                    HtmlExporter::export(&report, &path)?;
                    println!("Report written to {}", path.white().bold());
                }
                "console" => {
                    ConsoleReporter::new().print(&report);
                }
                other => bail!("Unknown report format '{}'. Supported: html, console", other),
            }
        }
    }

    Ok(())
}
