use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub root: Root,
    pub server: Server,
    pub limits: Limits,
    pub upload: Upload,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Root {
    pub root_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Server {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Limits {
    pub max_upload_kb: usize,
    pub max_request_kb: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Upload {
    pub allowed_extensions: Vec<String>,
}

impl Default for Root {
    fn default() -> Self {
        Self { root_dir: PathBuf::from("uploads") }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0".to_string(), port: 5050 }
    }
}

impl Default for Limits {
    fn default() -> Self {
        // 50 MiB uploads, 256 KiB JSON bodies
        Self { max_upload_kb: 51200, max_request_kb: 256 }
    }
}

impl Default for Upload {
    fn default() -> Self {
        Self {
            allowed_extensions: [
                "txt", "pdf", "png", "jpg", "jpeg", "gif", "zip", "mp4", "mp3", "csv",
                "xlsx", "docx",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: Root::default(),
            server: Server::default(),
            limits: Limits::default(),
            upload: Upload::default(),
        }
    }
}

impl Config {
    /// Loads TOML (or JSON, by extension) from `path`. A missing file yields
    /// the built-in defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.root.root_dir.as_os_str().is_empty() {
            anyhow::bail!("root_dir must not be empty");
        }
        if self.limits.max_upload_kb == 0 {
            anyhow::bail!("max_upload_kb must be > 0");
        }
        if self.limits.max_request_kb == 0 {
            anyhow::bail!("max_request_kb must be > 0");
        }
        if self.upload.allowed_extensions.is_empty() {
            anyhow::bail!("allowed_extensions must not be empty");
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.limits.max_upload_kb * 1024
    }
}

/// Creates the root directory if missing and returns its canonical form.
/// Every resolved path is prefix-checked against this value.
pub fn canonical_root(root: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(root)?;
    let c = dunce::canonicalize(root)?;
    Ok(c)
}
