#![deny(unsafe_code)]
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scim_cli::commands::{self, ProbeArgs, EXIT_FAILURE};

/// SCIM 2.0 payload validator and server conformance probe.
#[derive(Parser, Debug)]
#[command(name = "scim-sanity", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a resource (or PatchOp, with --patch) JSON file to validate.
    /// Omit to read from stdin with --stdin.
    file: Option<PathBuf>,

    /// Validate the input as a SCIM PatchOp document instead of a resource.
    #[arg(long)]
    patch: bool,

    /// Read the document from standard input instead of a file.
    #[arg(long)]
    stdin: bool,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the server conformance probe against a live SCIM endpoint.
    Probe {
        /// Base URL of the SCIM server under test.
        url: String,

        /// Bearer token. Takes precedence over --username/--password.
        #[arg(long)]
        token: Option<String>,

        /// HTTP Basic username.
        #[arg(long)]
        username: Option<String>,

        /// HTTP Basic password.
        #[arg(long)]
        password: Option<String>,

        /// Skip TLS certificate verification.
        #[arg(long)]
        tls_no_verify: bool,

        /// Path to a custom CA bundle (PEM).
        #[arg(long)]
        ca_bundle: Option<PathBuf>,

        /// HTTP/HTTPS proxy URL.
        #[arg(long)]
        proxy: Option<String>,

        /// Leave created test resources on the server afterwards.
        #[arg(long)]
        skip_cleanup: bool,

        /// Emit a structured JSON report instead of terminal output.
        #[arg(long)]
        json_output: bool,

        /// Narrow the probe to a single resource type.
        #[arg(long)]
        resource: Option<String>,

        /// Fail on known real-world deviations instead of warning (default).
        #[arg(long, conflicts_with = "compat")]
        strict: bool,

        /// Warn instead of fail on known real-world deviations.
        #[arg(long, conflicts_with = "strict")]
        compat: bool,

        /// Per-request timeout, in seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Mandatory consent gate: without this, the probe refuses to run.
        #[arg(long = "i-accept-side-effects")]
        accept_side_effects: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("scim=debug")
    } else {
        EnvFilter::new("scim=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let exit_code = match cli.command {
        Some(Commands::Probe {
            url,
            token,
            username,
            password,
            tls_no_verify,
            ca_bundle,
            proxy,
            skip_cleanup,
            json_output,
            resource,
            strict,
            compat,
            timeout,
            accept_side_effects,
        }) => {
            let args = ProbeArgs {
                url,
                token,
                username,
                password,
                tls_no_verify,
                ca_bundle,
                proxy,
                skip_cleanup,
                json_output,
                resource,
                strict: !compat || strict,
                timeout,
                accept_side_effects,
            };
            commands::run_probe_command(args).await?
        }
        None => cmd_validate(cli.file, cli.patch, cli.stdin),
    };

    std::process::exit(exit_code);
}

fn cmd_validate(file: Option<PathBuf>, as_patch: bool, from_stdin: bool) -> i32 {
    let path = if from_stdin { None } else { file.as_deref() };
    if path.is_none() && !from_stdin {
        eprintln!("error: provide a file argument or --stdin");
        return EXIT_FAILURE;
    }

    let doc = match commands::read_json(path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_FAILURE;
        }
    };

    let (ok, errors) = commands::validate(&doc, as_patch);
    commands::print_validation_report(ok, &errors)
}
