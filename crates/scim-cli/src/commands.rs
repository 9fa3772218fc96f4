//! Implementations behind each subcommand, kept free of `clap` types so
//! they're testable without going through argument parsing.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use scim_error::{ErrorCode, ScimError};
use scim_probe::{run_probe, ProbeOptions};
use scim_report::{render_json, render_terminal, Summary};
use scim_transport::{ReqwestTransport, TransportConfig};
use scim_validate::payload::{validate_full, validate_patch, ValidationError};
use serde_json::Value;

/// Exit code for a clean pass.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for a failed validation, a refused probe, or an input error.
pub const EXIT_FAILURE: i32 = 1;

/// Read `path` as JSON, or stdin when `path` is `None`.
pub fn read_json(path: Option<&Path>) -> Result<Value, ScimError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            ScimError::new(ErrorCode::InputFileNotFound, format!("{}: {e}", path.display()))
                .with_source(e)
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(|e| {
                ScimError::new(ErrorCode::InputStdinUnreadable, e.to_string()).with_source(e)
            })?;
            buf
        }
    };
    serde_json::from_str(&text)
        .map_err(|e| ScimError::new(ErrorCode::InputInvalidJson, e.to_string()).with_source(e))
}

/// Validate `doc` as a full resource, or as a PatchOp document when
/// `as_patch` is set.
pub fn validate(doc: &Value, as_patch: bool) -> (bool, Vec<ValidationError>) {
    if as_patch {
        validate_patch(doc)
    } else {
        validate_full(doc)
    }
}

/// Print a plain-text validation report and return the process exit code.
pub fn print_validation_report(ok: bool, errors: &[ValidationError]) -> i32 {
    if ok {
        println!("valid");
        return EXIT_SUCCESS;
    }
    for error in errors {
        println!("error: {error}");
    }
    EXIT_FAILURE
}

/// Everything the `probe` subcommand needs, independent of `clap`.
pub struct ProbeArgs {
    /// Base URL of the SCIM server under test.
    pub url: String,
    /// `--token`.
    pub token: Option<String>,
    /// `--username`.
    pub username: Option<String>,
    /// `--password`.
    pub password: Option<String>,
    /// `--tls-no-verify`.
    pub tls_no_verify: bool,
    /// `--ca-bundle`.
    pub ca_bundle: Option<PathBuf>,
    /// `--proxy`.
    pub proxy: Option<String>,
    /// `--skip-cleanup`.
    pub skip_cleanup: bool,
    /// `--json-output`.
    pub json_output: bool,
    /// `--resource`.
    pub resource: Option<String>,
    /// `--strict` (true, default) / `--compat` (false).
    pub strict: bool,
    /// `--timeout`, in seconds.
    pub timeout: u64,
    /// `--i-accept-side-effects`.
    pub accept_side_effects: bool,
}

/// Build the transport, run the probe, render the report, and return the
/// exit code: 0 on a clean run, 1 on any FAIL/ERROR result (or a refusal).
pub async fn run_probe_command(args: ProbeArgs) -> Result<i32> {
    let mut transport_config = TransportConfig::new(&args.url);
    transport_config.token = args.token;
    transport_config.username = args.username;
    transport_config.password = args.password;
    transport_config.tls_no_verify = args.tls_no_verify;
    transport_config.ca_bundle = args.ca_bundle;
    transport_config.proxy = args.proxy;
    transport_config.timeout = Duration::from_secs(args.timeout);

    let transport = ReqwestTransport::new(transport_config).context("build HTTP transport")?;

    let options = ProbeOptions {
        strict: args.strict,
        skip_cleanup: args.skip_cleanup,
        resource: args.resource,
        accept_side_effects: args.accept_side_effects,
    };

    let results = run_probe(&transport, &args.url, &options).await;
    let summary = Summary::from_results(&results);

    if args.json_output {
        let mode = if args.strict { "strict" } else { "compat" };
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let report = render_json(&results, mode, env!("CARGO_PKG_VERSION"), timestamp);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        use std::io::IsTerminal;
        let color = std::io::stdout().is_terminal();
        print!("{}", render_terminal(&results, color));
    }

    Ok(if summary.is_success() { EXIT_SUCCESS } else { EXIT_FAILURE })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_full_passes_minimal_user() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "userName": "john.doe@example.com",
        });
        let (ok, errors) = validate(&doc, false);
        assert!(ok, "{errors:?}");
    }

    #[test]
    fn validate_patch_requires_patchop_schema() {
        let doc = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "Operations": [],
        });
        let (ok, _) = validate(&doc, true);
        assert!(!ok);
    }

    #[test]
    fn print_report_returns_success_exit_code_when_valid() {
        assert_eq!(print_validation_report(true, &[]), EXIT_SUCCESS);
    }

    #[test]
    fn print_report_returns_failure_exit_code_when_invalid() {
        let errors = vec![];
        assert_eq!(print_validation_report(false, &errors), EXIT_FAILURE);
    }

    #[test]
    fn read_json_reports_missing_file() {
        let err = read_json(Some(Path::new("/no/such/file.json"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputFileNotFound);
    }

    #[test]
    fn read_json_rejects_malformed_input() {
        let dir = std::env::temp_dir().join(format!("scim-cli-test-{}", std::process::id()));
        std::fs::write(&dir, "{not json").unwrap();
        let err = read_json(Some(&dir)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputInvalidJson);
        let _ = std::fs::remove_file(&dir);
    }
}
