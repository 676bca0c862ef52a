//! Download, extract and link tools from the registry.

use std::path::{Path, PathBuf};

use mindevc_config::{
    arch::Architecture,
    tools::{ArchiveSpec, ToolRegistry, ToolSource},
};
use mindevc_dl::{download::Download, types::Progress};
use mindevc_events::{EventSinkHandle, MindevcEvent, SkipReason};
use mindevc_package::{extract_archive, publish_links, Extraction};
use tracing::debug;
use url::Url;

use crate::{
    error::{MindevcError, Stage},
    layout::{check_arch, download_dir, extract_dir},
    MindevcResult,
};

/// A tool that went through every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTool {
    pub name: String,
    /// Verified download in the content-addressed cache.
    pub archive: PathBuf,
    pub extraction: Extraction,
    /// Published symlink paths.
    pub links: Vec<PathBuf>,
}

/// A requested tool that was not installed because of a registry gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTool {
    pub name: String,
    pub reason: SkipReason,
}

/// Result of a pipeline run, in request order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub installed: Vec<InstalledTool>,
    pub skipped: Vec<SkippedTool>,
}

impl PipelineOutcome {
    pub fn installed(&self, name: &str) -> Option<&InstalledTool> {
        self.installed.iter().find(|tool| tool.name == name)
    }
}

/// Installs tools for one architecture into one cache directory.
///
/// Tools are processed one at a time in the order they are requested. Registry gaps skip
/// the tool and are reported through the event sink; any failure while downloading,
/// extracting or linking stops the whole run.
pub struct ToolPipeline {
    cache_dir: PathBuf,
    arch: Architecture,
    events: EventSinkHandle,
}

impl ToolPipeline {
    pub fn new(cache_dir: impl Into<PathBuf>, arch: Architecture, events: EventSinkHandle) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            arch,
            events,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn arch(&self) -> &Architecture {
        &self.arch
    }

    pub fn run(&self, tools: &[String], registry: &ToolRegistry) -> MindevcResult<PipelineOutcome> {
        check_arch(&self.arch)?;
        let mut outcome = PipelineOutcome::default();

        for name in tools {
            let spec = match self.resolve(name, registry) {
                Ok(spec) => spec,
                Err(reason) => {
                    debug!("skipping {}: {}", name, reason);
                    self.events.emit(MindevcEvent::ToolSkipped {
                        tool: name.clone(),
                        reason: reason.clone(),
                    });
                    outcome.skipped.push(SkippedTool {
                        name: name.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let installed = self.install(name, spec)?;
            outcome.installed.push(installed);
        }

        Ok(outcome)
    }

    fn resolve<'a>(
        &self,
        name: &str,
        registry: &'a ToolRegistry,
    ) -> Result<&'a ArchiveSpec, SkipReason> {
        let tool = registry.get(name).ok_or(SkipReason::UnknownTool)?;

        if tool.source != ToolSource::Archive {
            return Err(SkipReason::UnsupportedSource {
                source: tool.source.to_string(),
            });
        }

        let spec = tool.archive_for(&self.arch).ok_or_else(|| {
            SkipReason::NoArchiveForArch {
                arch: self.arch.to_string(),
            }
        })?;

        let url = Url::parse(&spec.url).map_err(|err| {
            SkipReason::InvalidUrl {
                url: spec.url.clone(),
                reason: err.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SkipReason::UnsupportedScheme {
                url: spec.url.clone(),
                scheme: url.scheme().to_string(),
            });
        }

        Ok(spec)
    }

    fn install(&self, name: &str, spec: &ArchiveSpec) -> MindevcResult<InstalledTool> {
        debug!("installing {} ({})", name, self.arch);

        let archive = self
            .download(name, spec)
            .map_err(|err| MindevcError::tool_failed(name, Stage::Download, err))?;

        let destination = extract_dir(&self.cache_dir, &self.arch, name);
        self.events.emit(MindevcEvent::Extracting {
            tool: name.to_string(),
            archive: archive.clone(),
            destination: destination.clone(),
        });
        let extraction = extract_archive(&archive, spec.encoding, name, &destination)
            .map_err(|err| MindevcError::tool_failed(name, Stage::Extract, err))?;
        debug!("extracted {} into {}", name, extraction.root.display());

        let published = publish_links(&extraction, &spec.links)
            .map_err(|err| MindevcError::tool_failed(name, Stage::Link, err))?;
        let links = published
            .into_iter()
            .map(|published| {
                self.events.emit(MindevcEvent::Linked {
                    tool: name.to_string(),
                    link: published.link.clone(),
                    target: published.target,
                });
                published.link
            })
            .collect();

        self.events.emit(MindevcEvent::ToolInstalled {
            tool: name.to_string(),
        });

        Ok(InstalledTool {
            name: name.to_string(),
            archive,
            extraction,
            links,
        })
    }

    fn download(&self, name: &str, spec: &ArchiveSpec) -> MindevcResult<PathBuf> {
        let events = self.events.clone();
        let tool = name.to_string();
        let url = spec.url.clone();

        let artifact = Download::new(&spec.url)
            .cache_dir(download_dir(&self.cache_dir))
            .checksum(&spec.hash)
            .progress(move |progress| {
                let event = match progress {
                    Progress::Starting { total } => {
                        MindevcEvent::DownloadStarting {
                            tool: tool.clone(),
                            url: url.clone(),
                            total,
                        }
                    }
                    Progress::Chunk { current, total } => {
                        MindevcEvent::DownloadProgress {
                            tool: tool.clone(),
                            current,
                            total,
                        }
                    }
                    Progress::Complete { total } => {
                        MindevcEvent::DownloadComplete {
                            tool: tool.clone(),
                            total,
                        }
                    }
                };
                events.emit(event);
            })
            .execute()?;

        if artifact.cache_hit {
            self.events.emit(MindevcEvent::CacheHit {
                tool: name.to_string(),
                path: artifact.path.clone(),
            });
        }

        Ok(artifact.path)
    }
}
