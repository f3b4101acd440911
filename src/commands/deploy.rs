//! Main deploy command

use crate::local::DiskFs;
use crate::remote::{FtpTransport, MemoryTransport};
use crate::sync::{synchronize, SyncEvent};
use crate::types::{RemoteErrorKind, SyncAction, SyncError, UploadReport};
use crate::ui::ProgressReporter;
use crate::Config;
use std::io::ErrorKind;
use tracing::{debug, info};

/// Run the deployment
///
/// A dry run drives an in-memory remote with the same walk, so the printed
/// plan is exactly what a real run would do against an empty server.
pub fn run(config: &Config, reporter: &ProgressReporter) -> Result<UploadReport, SyncError> {
    let on_event = |event: &SyncEvent| match event {
        SyncEvent::Connected { .. } => reporter.start_transfer(),
        SyncEvent::UploadStarted { remote, .. } => reporter.set_current_upload(remote.as_str()),
        SyncEvent::Recorded(action) => reporter.record(action),
    };

    let address = config.server.to_string();
    reporter.start_connect(&address);

    let result = if config.dry_run {
        info!("Dry run: no connection will be made");
        synchronize(config, &MemoryTransport::new(), &DiskFs, Some(&on_event))
    } else {
        synchronize(config, &FtpTransport::new(config.timeout), &DiskFs, Some(&on_event))
    };

    match result {
        Ok(report) => {
            reporter.finish(&report.stats);
            if config.dry_run {
                println!("{}", format_plan(&report));
                println!("Dry-run mode: no changes were made.");
            }
            Ok(report)
        }
        Err(err) => {
            reporter.abandon();
            debug!(error = ?err, "Deployment failed");
            eprintln!("{}", format_failure(&err));
            Err(err)
        }
    }
}

fn format_plan(report: &UploadReport) -> String {
    if report.actions.is_empty() {
        return "Dry-run actions:\n  (no planned actions)".to_string();
    }

    let mut lines = Vec::with_capacity(report.actions.len() + 1);
    lines.push("Dry-run actions:".to_string());
    for action in &report.actions {
        let target = match action {
            SyncAction::CreateDir(remote) | SyncAction::ExistingDir(remote) => remote.to_string(),
            SyncAction::Prune(local) | SyncAction::Skip(local) => local.to_string(),
            SyncAction::Upload { local, remote, .. } => format!("{} -> {}", local, remote),
        };
        lines.push(format!("  {:<9} {}", action.label(), target));
    }
    lines.join("\n")
}

fn humanize_error(error: &SyncError) -> (String, Option<String>) {
    match error {
        SyncError::Config(msg) => (msg.clone(), None),
        SyncError::Connection { address, source } => match source.kind {
            RemoteErrorKind::NotLoggedIn => (
                format!("The server at {} rejected the login", address),
                Some("Check FTP_USERNAME and FTP_PASSWORD.".to_string()),
            ),
            _ => (
                format!("Could not reach the FTP server at {}: {}", address, source),
                Some("Check FTP_SERVER, the port, and that the host accepts FTP connections.".to_string()),
            ),
        },
        SyncError::RemoteDirectory { path, source } => match source.kind {
            RemoteErrorKind::PermissionDenied => (
                format!("Not allowed to create or enter remote directory {}", path),
                Some("Check the account's write permissions or choose another FTP_REMOTE_PATH.".to_string()),
            ),
            _ => (
                format!("Remote directory {} could not be set up: {}", path, source),
                None,
            ),
        },
        SyncError::LocalIo { path, source } => match source.kind() {
            ErrorKind::NotFound => (
                format!("Local path {} was not found", path.display()),
                Some("Verify the path still exists and retry.".to_string()),
            ),
            ErrorKind::PermissionDenied => (
                format!("Permission denied while reading {}", path.display()),
                Some("Check file permissions or run with a user that has access.".to_string()),
            ),
            _ => (
                format!("Could not read {}: {}", path.display(), source),
                None,
            ),
        },
        SyncError::Transport { path, source } => (
            format!("Upload of {} failed: {}", path, source),
            Some("Retry the deployment; files uploaded so far were kept on the server.".to_string()),
        ),
    }
}

fn error_kind_label(error: &SyncError) -> &'static str {
    match error {
        SyncError::Config(_) => "Configuration error",
        SyncError::Connection { .. } => "Connection error",
        SyncError::RemoteDirectory { .. } => "Remote directory error",
        SyncError::LocalIo { .. } => "Local I/O error",
        SyncError::Transport { .. } => "Transport error",
    }
}

fn format_failure(error: &SyncError) -> String {
    let (message, suggestion) = humanize_error(error);
    let mut lines = vec![format!("{}: {}", error_kind_label(error), message)];
    if let Some(suggestion) = suggestion {
        lines.push(format!("  Try: {}", suggestion));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LocalPath, RemoteError, RemotePath};
    use std::path::PathBuf;

    #[test]
    fn test_format_plan_lists_actions() {
        let mut report = UploadReport::new();
        report.record(SyncAction::CreateDir(RemotePath::base("/site/css")));
        report.record(SyncAction::Prune(LocalPath::root().join(".git")));
        report.record(SyncAction::Upload {
            local: LocalPath::root().join("index.html"),
            remote: RemotePath::base("/site/index.html"),
            bytes: 10,
        });
        report.record(SyncAction::Skip(LocalPath::root().join(".env")));

        let plan = format_plan(&report);
        assert!(plan.contains("Dry-run actions:"));
        assert!(plan.contains("MKDIR     /site/css"));
        assert!(plan.contains("PRUNE     .git"));
        assert!(plan.contains("UPLOAD    index.html -> /site/index.html"));
        assert!(plan.contains("SKIP      .env"));
    }

    #[test]
    fn test_format_plan_handles_empty_report() {
        assert!(format_plan(&UploadReport::new()).contains("(no planned actions)"));
    }

    #[test]
    fn test_login_failure_suggests_credentials() {
        let err = SyncError::Connection {
            address: "ftp.example.com:21".to_string(),
            source: RemoteError::new(RemoteErrorKind::NotLoggedIn, "Login incorrect").with_code(530),
        };
        let text = format_failure(&err);
        assert!(text.starts_with("Connection error:"));
        assert!(text.contains("rejected the login"));
        assert!(text.contains("FTP_PASSWORD"));
    }

    #[test]
    fn test_unreachable_server_keeps_cause() {
        let err = SyncError::Connection {
            address: "127.0.0.1:1".to_string(),
            source: RemoteError::new(RemoteErrorKind::Connection, "Connection refused"),
        };
        let text = format_failure(&err);
        assert!(text.contains("127.0.0.1:1"));
        assert!(text.contains("Connection refused"));
    }

    #[test]
    fn test_transport_failure_names_path() {
        let err = SyncError::Transport {
            path: "/site/c.txt".to_string(),
            source: RemoteError::new(RemoteErrorKind::Connection, "Transfer aborted").with_code(426),
        };
        let text = format_failure(&err);
        assert!(text.contains("/site/c.txt"));
        assert!(text.contains("Try:"));
    }

    #[test]
    fn test_local_permission_error() {
        let err = SyncError::LocalIo {
            path: PathBuf::from("site/secret.bin"),
            source: std::io::Error::new(ErrorKind::PermissionDenied, "denied"),
        };
        let text = format_failure(&err);
        assert!(text.starts_with("Local I/O error:"));
        assert!(text.contains("site/secret.bin"));
    }

    #[test]
    fn test_config_error_passes_message_through() {
        let err = SyncError::Config("Missing required setting(s): FTP_SERVER".to_string());
        assert_eq!(
            format_failure(&err),
            "Configuration error: Missing required setting(s): FTP_SERVER"
        );
    }
}
