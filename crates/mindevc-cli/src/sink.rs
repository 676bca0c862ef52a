use mindevc_events::{EventSink, MindevcEvent};
use nu_ansi_term::Color::{Blue, Cyan, Green};
use tracing::{debug, info, trace, warn};

use crate::utils::{format_bytes, Colored};

/// Renders pipeline events as log lines.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: MindevcEvent) {
        match event {
            MindevcEvent::ToolSkipped { tool, reason } => {
                warn!("Skipping {}: {}", Colored(Blue, &tool), reason);
            }
            MindevcEvent::CacheHit { tool, path } => {
                info!(
                    "{}: using cached {}",
                    Colored(Blue, &tool),
                    Colored(Cyan, path.display())
                );
            }
            MindevcEvent::DownloadStarting { tool, url, total } => {
                if total > 0 {
                    info!(
                        "{}: downloading {} ({})",
                        Colored(Blue, &tool),
                        url,
                        format_bytes(total)
                    );
                } else {
                    info!("{}: downloading {}", Colored(Blue, &tool), url);
                }
            }
            MindevcEvent::DownloadProgress {
                tool,
                current,
                total,
            } => {
                trace!("{}: {}/{}", tool, format_bytes(current), format_bytes(total));
            }
            MindevcEvent::DownloadComplete { tool, total } => {
                debug!("{}: downloaded {}", tool, format_bytes(total));
            }
            MindevcEvent::Extracting {
                tool,
                archive,
                destination,
            } => {
                debug!(
                    "{}: extracting {} into {}",
                    tool,
                    archive.display(),
                    destination.display()
                );
            }
            MindevcEvent::Linked { tool, link, target } => {
                info!(
                    "{}: linked {} -> {}",
                    Colored(Blue, &tool),
                    Colored(Cyan, link.display()),
                    target.display()
                );
            }
            MindevcEvent::ToolInstalled { tool } => {
                info!("{} {}", Colored(Green, "Installed"), Colored(Blue, &tool));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use mindevc_events::SkipReason;

    use super::*;

    #[test]
    fn test_log_sink_handles_every_event() {
        let sink = LogSink;
        let tool = "fd".to_string();
        for event in [
            MindevcEvent::ToolSkipped {
                tool: tool.clone(),
                reason: SkipReason::UnknownTool,
            },
            MindevcEvent::CacheHit {
                tool: tool.clone(),
                path: PathBuf::from("/cache/tools/_download/abc"),
            },
            MindevcEvent::DownloadStarting {
                tool: tool.clone(),
                url: "https://example.com/fd.tar.gz".to_string(),
                total: 0,
            },
            MindevcEvent::DownloadProgress {
                tool: tool.clone(),
                current: 1,
                total: 2,
            },
            MindevcEvent::DownloadComplete {
                tool: tool.clone(),
                total: 2,
            },
            MindevcEvent::Extracting {
                tool: tool.clone(),
                archive: PathBuf::from("/cache/tools/_download/abc"),
                destination: PathBuf::from("/cache/tools/x86_64/fd"),
            },
            MindevcEvent::Linked {
                tool: tool.clone(),
                link: PathBuf::from("/opt/mindevc/bin/fd"),
                target: PathBuf::from("/cache/tools/x86_64/fd/fd"),
            },
            MindevcEvent::ToolInstalled { tool },
        ] {
            sink.emit(event);
        }
    }
}
