//! Host seams for file dialogs, downloads and file picking.

use log::warn;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Native save/open dialogs (desktop).
pub trait FileDialogs {
    /// Destination chosen by the user, `None` when cancelled.
    fn save_path(&mut self, suggested_name: &str) -> Option<PathBuf>;
    fn open_path(&mut self) -> Option<PathBuf>;
}

/// Receives exported text as a named download (browser).
pub trait DownloadSink {
    fn deliver(&mut self, file_name: &str, text: &str) -> io::Result<()>;
}

/// Supplies the text of a user-chosen file (browser).
pub trait FilePicker {
    fn pick_text(&mut self) -> Option<String>;
}

/// Host without any interactive surface; every transfer is cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl FileDialogs for NoHost {
    fn save_path(&mut self, _suggested_name: &str) -> Option<PathBuf> {
        None
    }

    fn open_path(&mut self) -> Option<PathBuf> {
        None
    }
}

impl DownloadSink for NoHost {
    fn deliver(&mut self, _file_name: &str, _text: &str) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no download target available",
        ))
    }
}

impl FilePicker for NoHost {
    fn pick_text(&mut self) -> Option<String> {
        None
    }
}

/// Pre-chosen paths standing in for user interaction (CLI, FFI, tests).
///
/// A `save` path that is an existing directory receives the suggested name.
#[derive(Debug, Clone, Default)]
pub struct FixedPaths {
    pub save: Option<PathBuf>,
    pub open: Option<PathBuf>,
}

impl FixedPaths {
    fn resolve_save(&self, suggested_name: &str) -> Option<PathBuf> {
        let path = self.save.as_ref()?;
        if path.is_dir() {
            Some(path.join(suggested_name))
        } else {
            Some(path.clone())
        }
    }
}

impl FileDialogs for FixedPaths {
    fn save_path(&mut self, suggested_name: &str) -> Option<PathBuf> {
        self.resolve_save(suggested_name)
    }

    fn open_path(&mut self) -> Option<PathBuf> {
        self.open.clone()
    }
}

impl DownloadSink for FixedPaths {
    fn deliver(&mut self, file_name: &str, text: &str) -> io::Result<()> {
        let target = self.resolve_save(file_name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no download target configured")
        })?;
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, text)
    }
}

impl FilePicker for FixedPaths {
    fn pick_text(&mut self) -> Option<String> {
        read_text(self.open.as_deref()?)
    }
}

pub(crate) fn read_text(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(
                "event=file_read module=backend status=error path={} error={}",
                path.display(),
                err
            );
            None
        }
    }
}

/// Host seams handed to `open_backend`; each backend keeps the ones it uses.
pub struct HostIo {
    pub dialogs: Box<dyn FileDialogs>,
    pub downloads: Box<dyn DownloadSink>,
    pub picker: Box<dyn FilePicker>,
}

impl HostIo {
    pub fn none() -> Self {
        Self {
            dialogs: Box::new(NoHost),
            downloads: Box::new(NoHost),
            picker: Box::new(NoHost),
        }
    }

    /// Same fixed paths for dialogs, downloads and picking.
    pub fn fixed(paths: FixedPaths) -> Self {
        Self {
            dialogs: Box::new(paths.clone()),
            downloads: Box::new(paths.clone()),
            picker: Box::new(paths),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_save_directory_receives_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = FixedPaths {
            save: Some(dir.path().to_path_buf()),
            open: None,
        };
        assert_eq!(
            paths.save_path("journal-backup-2024-01-01.json"),
            Some(dir.path().join("journal-backup-2024-01-01.json"))
        );

        paths.deliver("b.json", "{}").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("b.json")).unwrap(), "{}");
    }

    #[test]
    fn no_host_cancels_every_transfer() {
        let mut host = NoHost;
        assert!(host.save_path("x.json").is_none());
        assert!(host.pick_text().is_none());
        assert!(host.deliver("x.json", "{}").is_err());
    }
}
