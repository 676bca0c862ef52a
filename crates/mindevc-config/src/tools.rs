use std::{collections::BTreeMap, fmt, path::PathBuf};

use mindevc_package::{ArchiveEncoding, LinkTarget};
use serde::{Deserialize, Serialize};

use crate::arch::Architecture;

/// Tool name to tool definition.
pub type ToolRegistry = BTreeMap<String, ToolConfig>;

/// Directory the built-in registry publishes links into.
pub const DEFAULT_BIN_DIR: &str = "/opt/mindevc/bin";

/// How a tool is obtained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ToolSource {
    /// A prebuilt archive per architecture.
    #[default]
    Archive,
    /// Built from a git repository. Declared but not installable yet.
    GitRepo,
    /// Any other source kind.
    Unsupported(String),
}

impl ToolSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Archive => "archive",
            Self::GitRepo => "git-repo",
            Self::Unsupported(name) => name,
        }
    }
}

impl From<String> for ToolSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "archive" => Self::Archive,
            "git-repo" => Self::GitRepo,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<ToolSource> for String {
    fn from(source: ToolSource) -> Self {
        match source {
            ToolSource::Unsupported(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downloadable artifact of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSpec {
    pub url: String,
    /// SHA-256 of the artifact, hex encoded.
    pub hash: String,
    #[serde(rename = "type")]
    pub encoding: ArchiveEncoding,
    /// Absolute link path to what it points at inside the extraction.
    #[serde(default)]
    pub links: BTreeMap<PathBuf, LinkTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub source: ToolSource,
    #[serde(default)]
    pub archives: BTreeMap<Architecture, ArchiveSpec>,
}

impl ToolConfig {
    pub fn archive_for(&self, arch: &Architecture) -> Option<&ArchiveSpec> {
        self.archives.get(arch)
    }
}

fn bin_link(name: &str) -> PathBuf {
    PathBuf::from(DEFAULT_BIN_DIR).join(name)
}

fn archive(
    url: &str,
    hash: &str,
    encoding: ArchiveEncoding,
    links: &[(&str, &str)],
) -> ArchiveSpec {
    ArchiveSpec {
        url: url.to_string(),
        hash: hash.to_string(),
        encoding,
        links: links
            .iter()
            .map(|(link, target)| (bin_link(link), LinkTarget::from(*target)))
            .collect(),
    }
}

fn tool(x86_64: ArchiveSpec, aarch64: ArchiveSpec) -> ToolConfig {
    ToolConfig {
        source: ToolSource::Archive,
        archives: BTreeMap::from([
            (Architecture::X86_64, x86_64),
            (Architecture::Aarch64, aarch64),
        ]),
    }
}

/// Tools installed when the configuration does not say otherwise.
pub fn default_install_tools() -> Vec<String> {
    ["fd", "ripgrep", "gosu", "curl", "zig", "make"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// The built-in tool registry.
pub fn default_tools() -> ToolRegistry {
    use ArchiveEncoding::{Bin, BinGz, TarGz, TarXz};

    BTreeMap::from([
        (
            "fd".to_string(),
            tool(
                archive(
                    "https://github.com/sharkdp/fd/releases/download/v10.2.0/fd-v10.2.0-x86_64-unknown-linux-musl.tar.gz",
                    "d9bfa25ec28624545c222992e1b00673b7c9ca5eb15393c40369f10b28f9c932",
                    TarGz,
                    &[("fd", "fd-v10.2.0-x86_64-unknown-linux-musl/fd")],
                ),
                archive(
                    "https://github.com/sharkdp/fd/releases/download/v10.2.0/fd-v10.2.0-aarch64-unknown-linux-musl.tar.gz",
                    "4e8e596646d047d904f2c5ca74b39dccc69978b6e1fb101094e534b0b59c1bb0",
                    TarGz,
                    &[("fd", "fd-v10.2.0-aarch64-unknown-linux-musl/fd")],
                ),
            ),
        ),
        (
            "ripgrep".to_string(),
            tool(
                archive(
                    "https://github.com/BurntSushi/ripgrep/releases/download/14.1.1/ripgrep-14.1.1-x86_64-unknown-linux-musl.tar.gz",
                    "4cf9f2741e6c465ffdb7c26f38056a59e2a2544b51f7cc128ef28337eeae4d8e",
                    TarGz,
                    &[("rg", "ripgrep-14.1.1-x86_64-unknown-linux-musl/rg")],
                ),
                archive(
                    "https://github.com/BurntSushi/ripgrep/releases/download/14.1.1/ripgrep-14.1.1-armv7-unknown-linux-musleabi.tar.gz",
                    "e6512cb9d3d53050022b9236edd2eff4244cea343a451bfb3c008af23d0000e5",
                    TarGz,
                    &[("rg", "ripgrep-14.1.1-armv7-unknown-linux-musleabi/rg")],
                ),
            ),
        ),
        (
            "gosu".to_string(),
            tool(
                archive(
                    "https://github.com/tianon/gosu/releases/download/1.17/gosu-amd64",
                    "bbc4136d03ab138b1ad66fa4fc051bafc6cc7ffae632b069a53657279a450de3",
                    Bin,
                    &[("gosu", "$bin")],
                ),
                archive(
                    "https://github.com/tianon/gosu/releases/download/1.17/gosu-arm64",
                    "c3805a85d17f4454c23d7059bcb97e1ec1af272b90126e79ed002342de08389b",
                    Bin,
                    &[("gosu", "$bin")],
                ),
            ),
        ),
        (
            "curl".to_string(),
            tool(
                archive(
                    "https://github.com/stunnel/static-curl/releases/download/8.14.1/curl-linux-x86_64-musl-8.14.1.tar.xz",
                    "0b4622d9df4fd282b5a2d222e4e0146fc409053ee15ee1979784f6c8a56cf573",
                    TarXz,
                    &[("curl", "curl"), ("trurl", "trurl")],
                ),
                archive(
                    "https://github.com/stunnel/static-curl/releases/download/8.14.1/curl-linux-aarch64-musl-8.14.1.tar.xz",
                    "e0fecb5ecaba101b4b560f1035835770e7d1c151416ee84e18c813ba32b9d1dd",
                    TarXz,
                    &[("curl", "curl"), ("trurl", "trurl")],
                ),
            ),
        ),
        (
            "zig".to_string(),
            tool(
                archive(
                    "https://ziglang.org/download/0.14.1/zig-x86_64-linux-0.14.1.tar.xz",
                    "24aeeec8af16c381934a6cd7d95c807a8cb2cf7df9fa40d359aa884195c4716c",
                    TarXz,
                    &[("zig", "zig-x86_64-linux-0.14.1/zig")],
                ),
                archive(
                    "https://ziglang.org/download/0.14.1/zig-aarch64-linux-0.14.1.tar.xz",
                    "f7a654acc967864f7a050ddacfaa778c7504a0eca8d2b678839c21eea47c992b",
                    TarXz,
                    &[("zig", "zig-aarch64-linux-0.14.1/zig")],
                ),
            ),
        ),
        (
            "make".to_string(),
            tool(
                archive(
                    "https://github.com/davidrios/static-make/releases/download/v4.4.1+1/make-x86_64-linux-musl.gz",
                    "b6a734830c6be3bfc7e0a2f39b4923059132df1439c72c7a03ab65f4df610bb9",
                    BinGz,
                    &[("make", "$bin")],
                ),
                archive(
                    "https://github.com/davidrios/static-make/releases/download/v4.4.1+1/make-aarch64-linux-musl.gz",
                    "13f1311198ba6826d92ee6b7c0d6406a27db441b1171598c075bf44dfceee2f9",
                    BinGz,
                    &[("make", "$bin")],
                ),
            ),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use mindevc_utils::hash::is_sha256_hex;

    use super::*;

    #[test]
    fn test_default_registry_covers_install_tools() {
        let tools = default_tools();
        for name in default_install_tools() {
            let tool = &tools[&name];
            assert_eq!(tool.source, ToolSource::Archive);
            assert!(tool.archive_for(&Architecture::X86_64).is_some(), "{name}");
            assert!(tool.archive_for(&Architecture::Aarch64).is_some(), "{name}");
        }
    }

    #[test]
    fn test_default_registry_hashes_are_sha256() {
        for (name, tool) in default_tools() {
            for (arch, spec) in &tool.archives {
                assert!(is_sha256_hex(&spec.hash), "{name} {arch}");
            }
        }
    }

    #[test]
    fn test_default_binary_tools_link_artifact() {
        let tools = default_tools();
        let gosu = tools["gosu"].archive_for(&Architecture::X86_64).unwrap();
        assert_eq!(gosu.encoding, ArchiveEncoding::Bin);
        assert_eq!(
            gosu.links[Path::new("/opt/mindevc/bin/gosu")],
            LinkTarget::Artifact
        );
    }

    #[test]
    fn test_tool_source_from_string() {
        assert_eq!(ToolSource::from("archive".to_string()), ToolSource::Archive);
        assert_eq!(ToolSource::from("git-repo".to_string()), ToolSource::GitRepo);
        assert_eq!(
            ToolSource::from("svn".to_string()),
            ToolSource::Unsupported("svn".to_string())
        );
        assert_eq!(String::from(ToolSource::GitRepo), "git-repo");
    }

    #[test]
    fn test_tool_config_deserialize() {
        let tool: ToolConfig = toml::from_str(
            r#"
            [archives.amd64]
            url = "https://example.com/tool.gz"
            hash = "6ae8a75555209fd6c44157c0aed8016e763ff435a19cf186f76863140143ff72"
            type = "bin.gz"
            links = { "/usr/local/bin/tool" = "$bin" }
            "#,
        )
        .unwrap();

        assert_eq!(tool.source, ToolSource::Archive);
        let spec = tool.archive_for(&Architecture::X86_64).unwrap();
        assert_eq!(spec.encoding, ArchiveEncoding::BinGz);
        assert_eq!(
            spec.links[Path::new("/usr/local/bin/tool")],
            LinkTarget::Artifact
        );
    }

    #[test]
    fn test_tool_config_rejects_unknown_encoding() {
        let result = toml::from_str::<ToolConfig>(
            r#"
            [archives.x86_64]
            url = "https://example.com/tool.rar"
            hash = "6ae8a75555209fd6c44157c0aed8016e763ff435a19cf186f76863140143ff72"
            type = "rar"
            "#,
        );
        assert!(result.is_err());
    }
}
