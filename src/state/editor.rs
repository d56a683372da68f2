//! Editor controller
//!
//! Owns the scene surface, the edit session for the loaded photo, the
//! compiled mask and the undo log. The UI feeds it pointer and keyboard
//! actions and renders what it exposes; it has no drawing code itself, so
//! every editing flow is testable headless.

use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use super::blobs::BlobStore;
use super::data::{Image, MaskKind, MaskPayload, Variant, VariantPayload};
use super::edit::{Algorithm, RecolorParams};
use super::history::ShapeHistory;
use super::library::Library;
use super::session::{AppliedColor, EditSession};
use crate::color::Rgb;
use crate::config::EditorConfig;
use crate::error::StoreError;
use crate::photo::LoadedPhoto;
use crate::recolor::{RecolorJob, RecolorOutcome};
use crate::render::FitTransform;
use crate::scene::mask;
use crate::scene::path::CompoundPath;
use crate::scene::shape::ShapeId;
use crate::scene::surface::{GeometryError, PointerEvent, SceneSurface, SurfaceEvent, Tool};

/// Name stored with every saved mask
pub const MASK_NAME: &str = "Roof";

#[derive(Debug)]
pub struct Editor {
    surface: SceneSurface,
    history: ShapeHistory,
    session: Option<EditSession>,
    mask: Option<CompoundPath>,
    /// Bumped whenever the compiled mask changes
    mask_revision: u64,
    /// Revision last written to the store for the current image
    saved_revision: Option<u64>,
    params: RecolorParams,
    project_id: Option<i64>,
    /// Photo of the current session not yet written to the store
    pending_upload: Option<Arc<LoadedPhoto>>,
}

impl Editor {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            surface: SceneSurface::new(config.surface_width, config.surface_height, config.surface_settings()),
            history: ShapeHistory::new(config.history_limit),
            session: None,
            mask: None,
            mask_revision: 0,
            saved_revision: None,
            params: config.recolor,
            project_id: None,
            pending_upload: None,
        }
    }

    pub fn surface(&self) -> &SceneSurface {
        &self.surface
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn mask(&self) -> Option<&CompoundPath> {
        self.mask.as_ref()
    }

    pub fn params(&self) -> &RecolorParams {
        &self.params
    }

    pub fn project_id(&self) -> Option<i64> {
        self.project_id
    }

    pub fn set_project(&mut self, project_id: i64) {
        self.project_id = Some(project_id);
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.params.algorithm = algorithm;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether the current mask still has to be written to the store
    pub fn mask_dirty(&self) -> bool {
        self.mask.is_some() && self.saved_revision != Some(self.mask_revision)
    }

    /// Start a session for a freshly decoded photo
    ///
    /// Shapes and history from the previous photo are dropped.
    pub fn open_photo(&mut self, pixels: RgbaImage) -> Result<FitTransform, GeometryError> {
        let (width, height) = pixels.dimensions();
        let (sw, sh) = self.surface.size();
        let fit = FitTransform::fit(sw, sh, width as f32, height as f32)
            .ok_or(GeometryError::EmptyImage { width, height })?;

        self.surface.clear();
        self.history.clear();
        self.session = Some(EditSession::new(pixels, fit));
        self.mask = None;
        self.mask_revision += 1;
        self.saved_revision = None;
        self.pending_upload = None;

        info!(width, height, scale = fit.scale, axis = ?fit.axis, "photo opened");
        Ok(fit)
    }

    /// Discard the session (project closed)
    pub fn close_photo(&mut self) {
        self.session = None;
        self.surface.clear();
        self.history.clear();
        self.mask = None;
        self.saved_revision = None;
        self.pending_upload = None;
    }

    /// Whether the open photo still has to be written to the store
    pub fn upload_pending(&self) -> bool {
        self.pending_upload.is_some()
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.surface.set_tool(tool);
    }

    pub fn pointer(&mut self, event: PointerEvent) -> Option<SurfaceEvent> {
        let event = self.surface.handle_pointer(event)?;
        self.after_surface_event(event);
        Some(event)
    }

    pub fn finalize_polygon(&mut self) -> Result<ShapeId, GeometryError> {
        let id = self.surface.finalize_polygon()?;
        self.after_surface_event(SurfaceEvent::ShapeAdded(id));
        Ok(id)
    }

    pub fn resize_selected(&mut self, sx: f32, sy: f32) -> bool {
        match self.surface.resize_selected(sx, sy) {
            Some(event) => {
                self.after_surface_event(event);
                true
            }
            None => false,
        }
    }

    pub fn remove_selected(&mut self) -> bool {
        match self.surface.remove_selected() {
            Some(event) => {
                self.after_surface_event(event);
                true
            }
            None => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(shapes) => {
                self.surface.restore_shapes(shapes);
                self.recompile();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(shapes) => {
                self.surface.restore_shapes(shapes);
                self.recompile();
                true
            }
            None => false,
        }
    }

    fn after_surface_event(&mut self, event: SurfaceEvent) {
        if event.affects_mask() {
            self.recompile();
        }
        if !matches!(event, SurfaceEvent::VertexAdded(_)) {
            self.history.record(self.surface.snapshot());
        }
    }

    /// Rebuild the mask from the visible mask shapes
    fn recompile(&mut self) {
        let compiled = self
            .session
            .as_ref()
            .and_then(|s| mask::compile(self.surface.mask_shapes(), &s.fit()));

        if compiled != self.mask {
            self.mask = compiled;
            self.mask_revision += 1;
            debug!(
                revision = self.mask_revision,
                subpaths = self.mask.as_ref().map_or(0, |m| m.subpath_count()),
                "mask recompiled"
            );
        }
    }

    /// Prepare a background recolor
    ///
    /// `None` when there is no photo or no mask yet; that is expected while
    /// authoring and not an error.
    pub fn request_recolor(&mut self, color_key: &str, color: Rgb) -> Option<RecolorJob> {
        let mask = self.mask.clone()?;
        let session = self.session.as_mut()?;
        let ticket = session.begin_recolor();
        debug!(token = ticket.token, color = color_key, "recolor requested");

        Some(RecolorJob {
            token: ticket.token,
            original: ticket.original,
            mask,
            color_key: color_key.to_string(),
            color,
            params: self.params,
        })
    }

    /// Display a finished recolor if it is still the newest request
    pub fn finish_recolor(&mut self, outcome: RecolorOutcome) -> bool {
        let (Some(session), Some(image)) = (self.session.as_mut(), outcome.image) else {
            return false;
        };
        session.commit(
            outcome.token,
            image,
            AppliedColor {
                key: outcome.color_key,
                color: outcome.color,
            },
        )
    }

    /// Show the untouched photo again; shapes and mask stay
    pub fn reset_display(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.reset();
                true
            }
            None => false,
        }
    }

    /// Record the upload of the open photo, creating the project on the first one
    ///
    /// On failure the photo stays pending and the next [`Editor::persist_choice`]
    /// tries again.
    pub fn register_upload(
        &mut self,
        library: &Library,
        blobs: &BlobStore,
        photo: Arc<LoadedPhoto>,
    ) -> Result<Image, StoreError> {
        self.pending_upload = Some(Arc::clone(&photo));
        self.store_upload(library, blobs, &photo)
    }

    fn store_upload(&mut self, library: &Library, blobs: &BlobStore, photo: &LoadedPhoto) -> Result<Image, StoreError> {
        let project_id = match self.project_id {
            Some(id) => id,
            None => {
                let project = library.create_project(None, None)?;
                self.project_id = Some(project.id);
                project.id
            }
        };

        let image = library.upload_image(project_id, photo, blobs)?;
        if let Some(session) = self.session.as_mut() {
            session.set_image_id(image.id);
        }
        self.pending_upload = None;
        Ok(image)
    }

    /// Write the current mask unless it is already stored
    ///
    /// Returns `Ok(false)` when there was nothing to write. A failure leaves
    /// the mask marked unsaved so the next save retries it.
    pub fn save_mask(&mut self, library: &Library) -> Result<bool, StoreError> {
        let Some(image_id) = self.session.as_ref().and_then(|s| s.image_id()) else {
            return Ok(false);
        };
        if !self.mask_dirty() {
            return Ok(false);
        }
        let Some(path) = self.mask.as_ref() else {
            return Ok(false);
        };

        let payload = MaskPayload {
            image_id,
            name: MASK_NAME.to_string(),
            kind: MaskKind::Include,
            svg_path: path.to_svg(),
        };
        library.save_mask(&payload)?;
        self.saved_revision = Some(self.mask_revision);
        info!(image = image_id, revision = self.mask_revision, "mask persisted");
        Ok(true)
    }

    /// Persist the mask (if changed) and a variant for the displayed color
    ///
    /// A photo whose upload failed earlier is stored first. `Ok(None)` when
    /// nothing is applied or the photo was never offered for upload. The
    /// displayed result is kept whatever happens here.
    pub fn persist_choice(&mut self, library: &Library, blobs: &BlobStore) -> Result<Option<Variant>, StoreError> {
        let Some(applied) = self.session.as_ref().and_then(|s| s.applied().cloned()) else {
            return Ok(None);
        };
        if let Some(photo) = self.pending_upload.clone() {
            info!(file = %photo.file_name, "retrying photo upload");
            self.store_upload(library, blobs, &photo)?;
        }
        let Some(image_id) = self.session.as_ref().and_then(|s| s.image_id()) else {
            return Ok(None);
        };

        self.save_mask(library)?;

        let preview = match self.session.as_ref().map(|s| blobs.put_preview(s.displayed())) {
            Some(Ok(reference)) => Some(reference),
            Some(Err(e)) => {
                warn!(error = %e, "failed to store variant preview");
                None
            }
            None => None,
        };

        let payload = VariantPayload {
            image_id,
            color_key: applied.key,
            hex: applied.color.to_hex(),
        };
        let variant = library.save_variant(&payload, preview.as_deref())?;
        info!(image = image_id, variant = variant.id, color = %variant.color_key, "variant persisted");
        Ok(Some(variant))
    }
}
