use std::io;
use std::path::{Path, PathBuf};

/// Something a finished document can be written into.
pub trait DocumentWriter {
    /// Replaces the whole document. There is no partial update.
    fn write_document(&mut self, html: &str) -> io::Result<()>;
}

/// Host of a preview. `document()` is `None` when the environment refuses
/// access to the rendering surface's document.
pub trait PreviewSurface {
    fn document(&mut self) -> Option<&mut dyn DocumentWriter>;
}

/// Writes the preview to an HTML file on every render.
#[derive(Debug, Clone)]
pub struct FileSurface {
    path: PathBuf,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentWriter for FileSurface {
    fn write_document(&mut self, html: &str) -> io::Result<()> {
        std::fs::write(&self.path, html)
    }
}

impl PreviewSurface for FileSurface {
    fn document(&mut self) -> Option<&mut dyn DocumentWriter> {
        Some(self)
    }
}

/// Keeps every written document; `detached()` models a host without
/// document access.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    writes: Vec<String>,
    detached: bool,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn detached() -> Self {
        Self {
            writes: Vec::new(),
            detached: true,
        }
    }

    #[cfg(test)]
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    pub fn current(&self) -> Option<&str> {
        self.writes.last().map(String::as_str)
    }
}

impl DocumentWriter for MemorySurface {
    fn write_document(&mut self, html: &str) -> io::Result<()> {
        self.writes.push(html.to_string());
        Ok(())
    }
}

impl PreviewSurface for MemorySurface {
    fn document(&mut self) -> Option<&mut dyn DocumentWriter> {
        if self.detached {
            None
        } else {
            Some(self)
        }
    }
}
