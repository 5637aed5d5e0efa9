// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// dni-scan: read identity fields from photographs of national ID cards.
//
// Entry point. Initialises logging and dispatches subcommands. Results go to
// stdout as JSON; logs, progress and guest hints go to stderr.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use checkin_core::ScanResult;
use checkin_core::error::Result;
use checkin_core::human_errors::{HumanError, humanize_error, humanize_failure};
use checkin_scan::parse_payload;
use clap::{Parser, Subcommand};
use serde::Serialize;

use commands::{ScanRequest, Side};

/// Read identity fields from photographs of national ID cards
#[derive(Parser, Debug)]
#[command(name = "dni-scan", version)]
#[command(about = "Read identity fields from photographs of national ID cards")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a photograph and print the result as JSON
    Scan {
        /// Photograph of the card (JPEG, PNG, ...)
        image: PathBuf,

        /// Which side of the card the photograph shows
        #[arg(long, value_enum, default_value_t = Side::Back)]
        side: Side,

        /// JSON scan configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Give up after this many seconds (overrides the config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Directory holding the OCR detection and recognition models
        #[arg(long)]
        models: Option<PathBuf>,
    },

    /// Parse a stored PDF417 payload and print the fields as JSON
    ParsePayload {
        /// The raw `@`-separated payload text
        payload: String,
    },

    /// Sanitize and review a stored identity record (JSON file)
    Review {
        /// JSON file holding the record
        record: PathBuf,

        /// JSON scan configuration file (review policy)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "dni-scan failed");
            print_hint(&humanize_error(&err));
            ExitCode::from(2)
        }
    }
}

async fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Scan {
            image,
            side,
            config,
            timeout,
            models,
        } => {
            let request = ScanRequest {
                image,
                side,
                config,
                timeout_secs: timeout,
                models,
            };
            let result = commands::scan(&request).await?;
            print_json(&result)?;
            if let ScanResult::Failure { reason } = &result {
                print_hint(&humanize_failure(reason));
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::ParsePayload { payload } => match parse_payload(&payload) {
            Some(fields) => {
                print_json(&fields)?;
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("Not a recognised ID barcode payload.");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Review { record, config } => {
            let report = commands::review(&record, config.as_deref())?;
            print_json(&report)?;
            Ok(if report.review.accepted {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_hint(hint: &HumanError) {
    eprintln!("{}\n{}", hint.message, hint.suggestion);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_defaults_to_back_side() {
        let cli = Cli::try_parse_from(["dni-scan", "scan", "dni.jpg"]).unwrap();
        match cli.command {
            Command::Scan {
                image, side, timeout, ..
            } => {
                assert_eq!(image, PathBuf::from("dni.jpg"));
                assert_eq!(side, Side::Back);
                assert_eq!(timeout, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn scan_accepts_front_side_and_timeout() {
        let cli = Cli::try_parse_from([
            "dni-scan", "scan", "front.jpg", "--side", "front", "--timeout", "20",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Scan {
                side: Side::Front,
                timeout: Some(20),
                ..
            }
        ));
    }

    #[test]
    fn parse_payload_takes_raw_text() {
        let cli = Cli::try_parse_from([
            "dni-scan",
            "parse-payload",
            "001@GARCIA@JUAN@M@30627652@A@19900115@20150101",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::ParsePayload { .. }));
    }

    #[test]
    fn unknown_side_is_rejected() {
        assert!(Cli::try_parse_from(["dni-scan", "scan", "x.jpg", "--side", "left"]).is_err());
    }
}
