use tracing::debug;

use super::document::{build_preview_document, Fidelity};
use super::surface::PreviewSurface;
use crate::models::Template;

/// The slice of a template the preview depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSource {
    pub name: String,
    pub markup: Option<String>,
    pub style: Option<String>,
}

impl From<&Template> for PreviewSource {
    fn from(template: &Template) -> Self {
        Self {
            name: template.name.clone(),
            markup: template.html_structure.clone(),
            style: template.css_styles.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Loading,
    Loaded,
}

/// Keeps a surface in sync with a template's markup, style and fidelity.
///
/// Any change to one of those rebuilds and rewrites the whole document.
/// `Loaded` latches after the first successful write and stays set for the
/// lifetime of this renderer.
pub struct PreviewRenderer<S: PreviewSurface> {
    surface: S,
    source: PreviewSource,
    fidelity: Fidelity,
    rendered: Option<(Option<String>, Option<String>, Fidelity)>,
    loaded: bool,
}

impl<S: PreviewSurface> PreviewRenderer<S> {
    pub fn new(surface: S, source: PreviewSource, fidelity: Fidelity) -> Self {
        Self {
            surface,
            source,
            fidelity,
            rendered: None,
            loaded: false,
        }
    }

    #[cfg(test)]
    pub fn fidelity(&self) -> Fidelity {
        self.fidelity
    }

    #[cfg(test)]
    pub fn source(&self) -> &PreviewSource {
        &self.source
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn status(&self) -> RenderStatus {
        if self.loaded {
            RenderStatus::Loaded
        } else {
            RenderStatus::Loading
        }
    }

    /// Writes the document if its inputs changed since the last write.
    pub fn render(&mut self) -> RenderStatus {
        let inputs = (
            self.source.markup.clone(),
            self.source.style.clone(),
            self.fidelity,
        );
        if self.rendered.as_ref() == Some(&inputs) {
            return self.status();
        }

        let Some(document) = self.surface.document() else {
            debug!(
                "Preview surface for '{}' has no document; staying in loading state",
                self.source.name
            );
            return self.status();
        };

        let html = build_preview_document(inputs.0.as_deref(), inputs.1.as_deref(), inputs.2);
        match document.write_document(&html) {
            Ok(()) => {
                self.rendered = Some(inputs);
                self.loaded = true;
            }
            Err(e) => debug!("Preview write for '{}' failed: {e}", self.source.name),
        }
        self.status()
    }

    /// Replaces the template inputs and re-renders.
    pub fn update(&mut self, source: PreviewSource) -> RenderStatus {
        self.source = source;
        self.render()
    }

    #[cfg(test)]
    pub fn set_fidelity(&mut self, fidelity: Fidelity) -> RenderStatus {
        self.fidelity = fidelity;
        self.render()
    }

    /// The thumbnail's "full preview" affordance: a second, independent
    /// renderer over the same template data at full fidelity. Full-fidelity
    /// renderers have no such affordance.
    pub fn open_full_preview<T: PreviewSurface>(&self, surface: T) -> Option<PreviewRenderer<T>> {
        match self.fidelity {
            Fidelity::Thumbnail => {
                let mut full = PreviewRenderer::new(surface, self.source.clone(), Fidelity::Full);
                full.render();
                Some(full)
            }
            Fidelity::Full => None,
        }
    }
}
