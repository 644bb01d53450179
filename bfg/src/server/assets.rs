//! Static front-end resources
//!
//! Only names in [`ALLOWED_ASSETS`] are ever served. The requested name is
//! used solely as a lookup key; any file path is built from the allow-list
//! entry, so request paths never reach the filesystem.
//!
//! The viewer itself (`index.html`, `stylesheet.css`, `code.js`) is compiled
//! into the binary. An optional override directory is consulted first, which
//! is also where the d3 modules and `progress.gif` come from when present.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use log::debug;

use crate::domain::AssetError;

/// One servable resource name
#[derive(Debug, Clone, Copy)]
pub struct AllowedAsset {
    pub name: &'static str,
    pub content_type: &'static str,
    /// Copy compiled into the binary, if any
    pub embedded: Option<&'static [u8]>,
}

const fn compiled_in(
    name: &'static str,
    content_type: &'static str,
    bytes: &'static [u8],
) -> AllowedAsset {
    AllowedAsset {
        name,
        content_type,
        embedded: Some(bytes),
    }
}

const fn on_disk(name: &'static str, content_type: &'static str) -> AllowedAsset {
    AllowedAsset {
        name,
        content_type,
        embedded: None,
    }
}

/// Servable resources
pub const ALLOWED_ASSETS: &[AllowedAsset] = &[
    compiled_in(
        "index.html",
        "text/html",
        include_bytes!("../../resources/index.html"),
    ),
    compiled_in(
        "stylesheet.css",
        "text/css",
        include_bytes!("../../resources/stylesheet.css"),
    ),
    compiled_in(
        "code.js",
        "text/javascript",
        include_bytes!("../../resources/code.js"),
    ),
    on_disk("d3-color.js", "text/javascript"),
    on_disk("d3-collection.js", "text/javascript"),
    on_disk("d3-dispatch.js", "text/javascript"),
    on_disk("d3-hierarchy.js", "text/javascript"),
    on_disk("d3-interpolate.js", "text/javascript"),
    on_disk("d3-scale.js", "text/javascript"),
    on_disk("d3-selection.js", "text/javascript"),
    on_disk("d3-request.js", "text/javascript"),
    on_disk("progress.gif", "image/gif"),
];

/// Look up the allow-list entry for a requested name
pub fn lookup(name: &str) -> Option<&'static AllowedAsset> {
    ALLOWED_ASSETS.iter().find(|asset| asset.name == name)
}

/// Content type of an allow-listed name
pub fn content_type(name: &str) -> Option<&'static str> {
    lookup(name).map(|asset| asset.content_type)
}

/// A loaded resource ready to be sent
#[derive(Debug, Clone)]
pub struct Asset {
    pub content_type: &'static str,
    pub bytes: Cow<'static, [u8]>,
}

/// Embedded front-end plus an optional directory overriding it
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    override_dir: Option<PathBuf>,
}

impl AssetBundle {
    /// Serve the embedded resources only
    pub fn embedded() -> Self {
        Self::default()
    }

    /// Serve files from `dir` first, falling back to the embedded copies
    pub fn with_override_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    /// Load an allow-listed resource
    pub async fn load(&self, name: &str) -> Result<Asset, AssetError> {
        let entry = lookup(name).ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        let from_disk = match &self.override_dir {
            Some(dir) => Some(tokio::fs::read(dir.join(entry.name)).await),
            None => None,
        };

        let bytes = match (from_disk, entry.embedded) {
            (Some(Ok(bytes)), _) => Cow::Owned(bytes),
            (Some(Err(e)), Some(bytes)) => {
                debug!("Using embedded {} ({e})", entry.name);
                Cow::Borrowed(bytes)
            }
            (None, Some(bytes)) => Cow::Borrowed(bytes),
            (Some(Err(source)), None) => {
                return Err(AssetError::Io {
                    name: entry.name.to_string(),
                    source,
                })
            }
            (None, None) => return Err(AssetError::NotBundled(entry.name.to_string())),
        };

        Ok(Asset {
            content_type: entry.content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_content_types() {
        assert_eq!(content_type("index.html"), Some("text/html"));
        assert_eq!(content_type("code.js"), Some("text/javascript"));
        assert_eq!(content_type("progress.gif"), Some("image/gif"));
        assert_eq!(content_type("not-a-real-file.js"), None);
        assert_eq!(content_type("../Cargo.toml"), None);
        assert_eq!(content_type(""), None);
    }

    #[test]
    fn test_viewer_is_embedded() {
        for name in ["index.html", "stylesheet.css", "code.js"] {
            let bytes = lookup(name).and_then(|a| a.embedded).unwrap();
            assert!(!bytes.is_empty(), "empty embedded {name}");
        }
        assert!(lookup("d3-scale.js").unwrap().embedded.is_none());
    }

    #[tokio::test]
    async fn test_embedded_bundle_needs_no_files() {
        let bundle = AssetBundle::embedded();
        let asset = bundle.load("index.html").await.unwrap();
        assert_eq!(asset.content_type, "text/html");
        assert!(matches!(asset.bytes, Cow::Borrowed(_)));
        assert!(matches!(
            bundle.load("d3-scale.js").await,
            Err(AssetError::NotBundled(_))
        ));
    }

    #[tokio::test]
    async fn test_override_dir_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("code.js"), b"main();").unwrap();
        std::fs::write(dir.path().join("d3-scale.js"), b"scale();").unwrap();

        let bundle = AssetBundle::with_override_dir(dir.path());
        let code = bundle.load("code.js").await.unwrap();
        assert_eq!(code.content_type, "text/javascript");
        assert_eq!(&*code.bytes, b"main();");
        assert_eq!(&*bundle.load("d3-scale.js").await.unwrap().bytes, b"scale();");

        // Not in the override dir, so the embedded copy is used
        let index = bundle.load("index.html").await.unwrap();
        assert!(matches!(index.bytes, Cow::Borrowed(_)));
    }

    #[tokio::test]
    async fn test_load_rejects_unlisted_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"nope").unwrap();

        let bundle = AssetBundle::with_override_dir(dir.path());
        assert!(matches!(
            bundle.load("secret.txt").await,
            Err(AssetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_listed_file() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = AssetBundle::with_override_dir(dir.path());
        assert!(matches!(
            bundle.load("d3-scale.js").await,
            Err(AssetError::Io { .. })
        ));
    }
}
