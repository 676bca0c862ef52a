mod event;
mod sink;

use std::sync::Arc;

pub use event::*;
pub use sink::*;

/// Shared handle to an event sink.
pub type EventSinkHandle = Arc<dyn EventSink>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        sink.emit(MindevcEvent::ToolInstalled {
            tool: "fd".to_string(),
        });
    }

    #[test]
    fn test_channel_sink() {
        let (sink, rx) = ChannelSink::new();
        sink.emit(MindevcEvent::DownloadStarting {
            tool: "fd".to_string(),
            url: "https://example.com/fd.tar.gz".to_string(),
            total: 1024,
        });
        sink.emit(MindevcEvent::DownloadProgress {
            tool: "fd".to_string(),
            current: 512,
            total: 1024,
        });
        sink.emit(MindevcEvent::DownloadComplete {
            tool: "fd".to_string(),
            total: 1024,
        });

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            MindevcEvent::DownloadStarting { total: 1024, .. }
        ));
        assert!(matches!(
            &events[1],
            MindevcEvent::DownloadProgress { current: 512, .. }
        ));
        assert!(matches!(&events[2], MindevcEvent::DownloadComplete { .. }));
    }

    #[test]
    fn test_channel_sink_receiver_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(MindevcEvent::ToolInstalled {
            tool: "orphaned".to_string(),
        });
    }

    #[test]
    fn test_collector_sink() {
        let sink = CollectorSink::default();
        assert!(sink.is_empty());

        sink.emit(MindevcEvent::ToolSkipped {
            tool: "fd".to_string(),
            reason: SkipReason::NoArchiveForArch {
                arch: "aarch64".to_string(),
            },
        });
        sink.emit(MindevcEvent::Linked {
            tool: "zig".to_string(),
            link: PathBuf::from("/opt/mindevc/bin/zig"),
            target: PathBuf::from("/cache/tools/x86_64/zig/zig"),
        });

        assert_eq!(sink.len(), 2);
        let events = sink.events();
        assert_eq!(events[0].tool(), "fd");
        assert_eq!(events[1].tool(), "zig");
    }

    #[test]
    fn test_event_sink_handle() {
        let collector = Arc::new(CollectorSink::default());
        let sink: EventSinkHandle = collector.clone();
        sink.emit(MindevcEvent::CacheHit {
            tool: "gosu".to_string(),
            path: PathBuf::from("/cache/tools/_download/abc"),
        });
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(
            SkipReason::UnknownTool.to_string(),
            "not found in the tool registry"
        );
        assert_eq!(
            SkipReason::UnsupportedSource {
                source: "git-repo".to_string()
            }
            .to_string(),
            "source kind `git-repo` is not implemented"
        );
        assert_eq!(
            SkipReason::NoArchiveForArch {
                arch: "aarch64".to_string()
            }
            .to_string(),
            "no archive available for aarch64"
        );
        assert_eq!(
            SkipReason::UnsupportedScheme {
                url: "ftp://host/file".to_string(),
                scheme: "ftp".to_string()
            }
            .to_string(),
            "unsupported url scheme `ftp` in `ftp://host/file`"
        );
    }
}
