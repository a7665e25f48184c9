//! Desktop notification backends.

use async_trait::async_trait;
use ogsn_core::processors::{Notifier, NotifyError};
use std::path::Path;
use tokio::process::Command;

use crate::config::file::NotifierBackend;

/// Shells out to the platform's notification tool.
pub struct CommandNotifier;

impl CommandNotifier {
    fn command(title: &str, body: &str, icon: Option<&Path>) -> Command {
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification {} with title {}",
                applescript_string(body),
                applescript_string(title)
            );
            let mut command = Command::new("osascript");
            command.arg("-e").arg(script);
            command
        } else {
            let mut command = Command::new("notify-send");
            command.arg("--app-name=ogsn-notifier");
            if let Some(icon) = icon {
                command.arg("--icon").arg(icon);
            }
            command.arg(title).arg(body);
            command
        }
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(
        &self,
        title: &str,
        body: &str,
        icon: Option<&Path>,
    ) -> Result<(), NotifyError> {
        let mut command = Self::command(title, body, icon);
        tracing::trace!(?command, "Executing notifier");

        let output = command.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => NotifyError::Unavailable(format!(
                "{:?} not found",
                command.as_std().get_program()
            )),
            _ => NotifyError::Io(e),
        })?;
        if !output.status.success() {
            return Err(NotifyError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Writes notifications to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        title: &str,
        body: &str,
        _icon: Option<&Path>,
    ) -> Result<(), NotifyError> {
        tracing::info!(%title, %body, "New game");
        Ok(())
    }
}

/// The backend chosen in `[notifier]`.
pub enum DesktopNotifier {
    Command(CommandNotifier),
    Log(LogNotifier),
}

impl From<NotifierBackend> for DesktopNotifier {
    fn from(backend: NotifierBackend) -> Self {
        match backend {
            NotifierBackend::Command => DesktopNotifier::Command(CommandNotifier),
            NotifierBackend::Log => DesktopNotifier::Log(LogNotifier),
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(
        &self,
        title: &str,
        body: &str,
        icon: Option<&Path>,
    ) -> Result<(), NotifyError> {
        match self {
            DesktopNotifier::Command(n) => n.notify(title, body, icon).await,
            DesktopNotifier::Log(n) => n.notify(title, body, icon).await,
        }
    }
}

/// Quote `s` as an AppleScript string literal.
fn applescript_string(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
