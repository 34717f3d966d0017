//! # pdfium-auto
//!
//! Finds a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, downloading it once if nothing is available.
//!
//! Resolution order, first hit wins:
//!
//! 1. `PDFIUM_LIB_PATH` pointing at an existing file.
//! 2. The per-version cache directory (`{cache}/pdf2jpg/pdfium-{VERSION}/`,
//!    overridable with `PDFIUM_AUTO_CACHE_DIR`).
//! 3. A fresh download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    extracted into the cache directory.
//!
//! ```rust,no_run
//! use pdfium_auto::{bind_pdfium_from_path, LibraryLocator};
//!
//! let locator = LibraryLocator::from_env();
//! let path = locator.ensure(None).expect("PDFium unavailable");
//! let pdfium = bind_pdfium_from_path(&path).expect("bind failed");
//! ```
//!
//! | OS      | Arch    | Library           |
//! |---------|---------|-------------------|
//! | macOS   | arm64   | `libpdfium.dylib` |
//! | macOS   | x86_64  | `libpdfium.dylib` |
//! | Linux   | x86_64  | `libpdfium.so`    |
//! | Linux   | aarch64 | `libpdfium.so`    |
//! | Windows | x86_64  | `pdfium.dll`      |
//! | Windows | aarch64 | `pdfium.dll`      |

use std::io::Read;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

/// Env var naming an existing library file; skips the cache and download.
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Env var overriding the cache root.
pub const CACHE_DIR_ENV: &str = "PDFIUM_AUTO_CACHE_DIR";

const RELEASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Progress callback: `(bytes_downloaded, total_bytes)`.
pub type ProgressFn<'a> = &'a dyn Fn(u64, Option<u64>);

#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

/// Release asset and in-archive layout for one OS/arch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformAsset {
    pub os: &'static str,
    pub arch: &'static str,
    pub archive: &'static str,
    pub member: &'static str,
}

impl PlatformAsset {
    /// File name the library is stored under in the cache.
    pub fn lib_name(&self) -> &'static str {
        self.member.rsplit('/').next().unwrap_or(self.member)
    }

    fn download_url(&self) -> String {
        format!("{RELEASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", self.archive)
    }
}

const fn asset(
    os: &'static str,
    arch: &'static str,
    archive: &'static str,
    member: &'static str,
) -> PlatformAsset {
    PlatformAsset {
        os,
        arch,
        archive,
        member,
    }
}

const ASSETS: &[PlatformAsset] = &[
    asset("macos", "aarch64", "pdfium-mac-arm64.tgz", "lib/libpdfium.dylib"),
    asset("macos", "x86_64", "pdfium-mac-x64.tgz", "lib/libpdfium.dylib"),
    asset("linux", "x86_64", "pdfium-linux-x64.tgz", "lib/libpdfium.so"),
    asset("linux", "aarch64", "pdfium-linux-arm64.tgz", "lib/libpdfium.so"),
    asset("windows", "x86_64", "pdfium-win-x64.tgz", "bin/pdfium.dll"),
    asset("windows", "aarch64", "pdfium-win-arm64.tgz", "bin/pdfium.dll"),
];

/// Look up the release asset for an OS/arch pair.
pub fn asset_for(os: &str, arch: &str) -> Result<PlatformAsset, PdfiumAutoError> {
    ASSETS
        .iter()
        .find(|a| a.os == os && a.arch == arch)
        .copied()
        .ok_or_else(|| PdfiumAutoError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
}

/// Release asset for the running platform.
pub fn current_asset() -> Result<PlatformAsset, PdfiumAutoError> {
    asset_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Where to look for, and where to put, the PDFium library.
#[derive(Debug, Clone)]
pub struct LibraryLocator {
    explicit: Option<PathBuf>,
    cache_root: PathBuf,
}

impl LibraryLocator {
    /// Build a locator from `PDFIUM_LIB_PATH` / `PDFIUM_AUTO_CACHE_DIR`,
    /// falling back to the platform cache directory.
    pub fn from_env() -> Self {
        let explicit = std::env::var_os(LIB_PATH_ENV).map(PathBuf::from);
        let cache_root = std::env::var_os(CACHE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::cache_dir()
                    .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
                    .unwrap_or_else(std::env::temp_dir)
                    .join("pdf2jpg")
            });
        Self { explicit, cache_root }
    }

    /// A locator rooted at `cache_root`, ignoring the environment.
    pub fn with_cache_root(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            explicit: None,
            cache_root: cache_root.into(),
        }
    }

    /// Prefer `path` over the cache when it exists.
    pub fn with_explicit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Per-version cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_root.join(format!("pdfium-{PDFIUM_VERSION}"))
    }

    /// Path of an already available library, without touching the network.
    pub fn cached(&self) -> Option<PathBuf> {
        if let Some(p) = self.explicit.as_ref().filter(|p| p.exists()) {
            return Some(p.clone());
        }
        let asset = current_asset().ok()?;
        let p = self.cache_dir().join(asset.lib_name());
        p.exists().then_some(p)
    }

    /// Return the library path, downloading into the cache if necessary.
    ///
    /// Blocking. Run it before starting the async runtime's workers or inside
    /// `block_in_place` / `spawn_blocking`.
    pub fn ensure(&self, on_progress: Option<ProgressFn<'_>>) -> Result<PathBuf, PdfiumAutoError> {
        if let Some(p) = self.cached() {
            return Ok(p);
        }
        if let Some(p) = &self.explicit {
            eprintln!(
                "pdfium-auto: {LIB_PATH_ENV} '{}' not found; downloading …",
                p.display()
            );
        }

        let asset = current_asset()?;
        let dir = self.cache_dir();
        std::fs::create_dir_all(&dir).map_err(PdfiumAutoError::CacheDir)?;

        let archive = download(&asset.download_url(), on_progress)?;
        let dest = dir.join(asset.lib_name());
        unpack_member(&archive, asset.member, &dest)?;
        Ok(dest)
    }
}

/// Load the PDFium library at `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn download(url: &str, on_progress: Option<ProgressFn<'_>>) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if let Some(cb) = on_progress {
                    cb(buf.len() as u64, total);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumAutoError::Download(format!("Read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Copy the archive member named `member` out of a `.tgz` into `dest`.
fn unpack_member(tgz: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    let extract = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(tgz));

    for entry in archive.entries().map_err(extract)? {
        let mut entry = entry.map_err(extract)?;
        if entry.path().map_err(extract)?.to_string_lossy() == member {
            entry
                .unpack(dest)
                .map_err(|e| PdfiumAutoError::Extract(format!("Unpack failed: {e}")))?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!("'{member}' not found in archive")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn tgz_with(member: &str, contents: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, member, contents).unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn known_platforms_resolve() {
        let a = asset_for("linux", "x86_64").unwrap();
        assert_eq!(a.lib_name(), "libpdfium.so");
        assert!(a.download_url().ends_with("/chromium%2F7690/pdfium-linux-x64.tgz"));
        assert_eq!(asset_for("windows", "x86_64").unwrap().lib_name(), "pdfium.dll");
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = asset_for("plan9", "mips").unwrap_err();
        assert!(err.to_string().contains("plan9/mips"));
    }

    #[test]
    fn cache_dir_is_versioned_under_root() {
        let locator = LibraryLocator::with_cache_root("/tmp/pdf2jpg-cache");
        let dir = locator.cache_dir();
        assert!(dir.starts_with("/tmp/pdf2jpg-cache"));
        assert!(dir.to_string_lossy().ends_with(&format!("pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn explicit_path_wins_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = tmp.path().join("libpdfium.so");
        std::fs::write(&lib, b"stub").unwrap();

        let locator =
            LibraryLocator::with_cache_root(tmp.path().join("cache")).with_explicit_path(&lib);
        assert_eq!(locator.cached(), Some(lib));
    }

    #[test]
    fn missing_explicit_path_and_empty_cache_yield_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let locator = LibraryLocator::with_cache_root(tmp.path())
            .with_explicit_path(tmp.path().join("nope.so"));
        assert_eq!(locator.cached(), None);
    }

    #[test]
    fn unpack_member_extracts_only_the_named_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("libpdfium.so");
        let tgz = tgz_with("lib/libpdfium.so", b"ELF");

        unpack_member(&tgz, "lib/libpdfium.so", &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"ELF");

        let err = unpack_member(&tgz, "bin/pdfium.dll", &tmp.path().join("x")).unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(_)));
    }
}
