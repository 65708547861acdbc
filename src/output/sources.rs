//! Source text loading for analysed files.
//!
//! Loaders are shared across worker threads, so every implementation
//! must be `Sync`.

use crate::aggregator::location::is_remote;
use crate::utils::config::DEFAULT_HTTP_TIMEOUT;
use crate::utils::error::SourceError;
use log::debug;
use reqwest::blocking::Client;
use std::path::Path;

/// Loads the text of a script from its full path
pub trait SourceLoader: Sync {
    fn load(&self, full_path: &str) -> Result<String, SourceError>;
}

impl<F> SourceLoader for F
where
    F: Fn(&str) -> Result<String, SourceError> + Sync,
{
    fn load(&self, full_path: &str) -> Result<String, SourceError> {
        self(full_path)
    }
}

/// Reads scripts from the local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceLoader;

impl SourceLoader for FsSourceLoader {
    fn load(&self, full_path: &str) -> Result<String, SourceError> {
        let path = Path::new(full_path);
        if !path.exists() {
            return Err(SourceError::NotFound(full_path.to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Fetches scripts served over http(s)
pub struct HttpSourceLoader {
    client: Client,
}

impl HttpSourceLoader {
    /// Create a new loader with the default timeout
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(SourceError::RequestFailed)?;

        Ok(Self { client })
    }
}

impl SourceLoader for HttpSourceLoader {
    fn load(&self, full_path: &str) -> Result<String, SourceError> {
        if !is_remote(full_path) {
            return Err(SourceError::Unsupported(full_path.to_string()));
        }

        debug!("Fetching source: {}", full_path);
        let response = self.client.get(full_path).send()?;
        if !response.status().is_success() {
            return Err(SourceError::NotFound(format!(
                "{} (HTTP {})",
                full_path,
                response.status()
            )));
        }
        Ok(response.text()?)
    }
}

/// Local files from disk, http(s) URLs over the network
///
/// **Public** - what the CLI uses
pub struct DefaultSourceLoader {
    fs: FsSourceLoader,
    http: Option<HttpSourceLoader>,
}

impl DefaultSourceLoader {
    /// Create a loader; remote loading is disabled if no HTTP client can be built
    pub fn new() -> Self {
        let http = match HttpSourceLoader::new() {
            Ok(http) => Some(http),
            Err(e) => {
                debug!("Remote source loading disabled: {}", e);
                None
            }
        };
        Self {
            fs: FsSourceLoader,
            http,
        }
    }
}

impl Default for DefaultSourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLoader for DefaultSourceLoader {
    fn load(&self, full_path: &str) -> Result<String, SourceError> {
        if !is_remote(full_path) {
            return self.fs.load(full_path);
        }
        match &self.http {
            Some(http) => http.load(full_path),
            None => Err(SourceError::Unsupported(full_path.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fs_loader_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "function f() {{}}").unwrap();
        let text = FsSourceLoader.load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(text, "function f() {}");
    }

    #[test]
    fn test_fs_loader_missing_file() {
        let result = FsSourceLoader.load("/definitely/not/here.js");
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_closure_loader() {
        let loader = |path: &str| -> Result<String, SourceError> { Ok(format!("// {}", path)) };
        assert_eq!(loader.load("/a.js").unwrap(), "// /a.js");
    }

    #[test]
    fn test_http_loader_rejects_local_paths() {
        let loader = HttpSourceLoader::new().unwrap();
        assert!(matches!(
            loader.load("/tmp/a.js"),
            Err(SourceError::Unsupported(_))
        ));
    }
}
