use iced::keyboard::{self, key::Named, Key, Modifiers};
use iced::widget::{button, canvas, column, container, image, row, stack, text, Row};
use iced::{Alignment, Background, ContentFit, Element, Length, Padding, Subscription, Task, Theme};
use rfd::FileDialog;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use roof_recolor::catalog::{self, CATALOG};
use roof_recolor::photo::{self, LoadedPhoto};
use roof_recolor::recolor::{worker, RecolorOutcome};
use roof_recolor::scene::surface::{PointerEvent, Tool};
use roof_recolor::state::blobs::BlobStore;
use roof_recolor::state::library::Library;
use roof_recolor::{Editor, EditorConfig, EditorError};

mod ui;

/// Main application state
struct RoofRecolor {
    config: EditorConfig,
    editor: Editor,
    /// Project database; `None` when it could not be opened (editing still works)
    library: Option<Library>,
    blobs: Option<BlobStore>,
    /// What is currently painted under the shapes
    background: Option<image::Handle>,
    /// Status message to display to the user
    status: String,
    loading: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked "Upload photo"
    UploadPhoto,
    /// Background decode finished
    PhotoLoaded(Result<Arc<LoadedPhoto>, String>),
    ToolSelected(Tool),
    Pointer(PointerEvent),
    FinalizePolygon,
    RemoveSelected,
    /// Uniform resize factor for the selection
    ResizeSelected(f32),
    Undo,
    Redo,
    /// Index into the color catalog
    ColorChosen(usize),
    RecolorFinished(RecolorOutcome),
    ToggleAlgorithm,
    Reset,
    /// Escape: back to select mode
    Cancel,
}

impl RoofRecolor {
    fn new(config: EditorConfig, config_error: Option<EditorError>) -> (Self, Task<Message>) {
        let library = match Library::open(config.database_path()) {
            Ok(library) => Some(library),
            Err(e) => {
                error!(error = %e, "failed to open project database, saving is disabled");
                None
            }
        };
        let blobs = match BlobStore::open(config.blob_dir()) {
            Ok(blobs) => Some(blobs),
            Err(e) => {
                error!(error = %e, "failed to open blob storage, saving is disabled");
                None
            }
        };

        let status = match (&config_error, &library) {
            (Some(e), _) => format!("Using default settings ({e}). Upload a photo to start."),
            (None, Some(library)) => format!(
                "Ready. {} photos in the library. Upload a photo to start.",
                library.image_count().unwrap_or(0)
            ),
            (None, None) => "Ready (saving disabled). Upload a photo to start.".to_string(),
        };

        let editor = Editor::new(&config);
        (
            RoofRecolor {
                config,
                editor,
                library,
                blobs,
                background: None,
                status,
                loading: false,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::UploadPhoto => {
                let file = FileDialog::new()
                    .set_title("Select a photo of the roof")
                    .add_filter("Photos", &["jpg", "jpeg", "png", "webp"])
                    .pick_file();

                if let Some(path) = file {
                    self.status = format!("Loading {}...", path.display());
                    self.loading = true;
                    return Task::perform(photo::load_photo(path, self.config.max_upload_bytes), |result| {
                        Message::PhotoLoaded(result.map(Arc::new).map_err(|e| e.to_string()))
                    });
                }
                Task::none()
            }
            Message::PhotoLoaded(Err(e)) => {
                self.loading = false;
                warn!(error = %e, "upload rejected");
                self.status = e;
                Task::none()
            }
            Message::PhotoLoaded(Ok(photo)) => {
                self.loading = false;
                if let Err(e) = self.editor.open_photo(photo.pixels.clone()) {
                    self.report("Cannot edit this photo", e.into());
                    return Task::none();
                }
                self.refresh_background();

                let (w, h) = photo.dimensions();
                self.status = format!("{} ({}x{}). Outline the roof, then pick a color.", photo.file_name, w, h);

                let stored = match (&self.library, &self.blobs) {
                    (Some(library), Some(blobs)) => self.editor.register_upload(library, blobs, Arc::clone(&photo)).map(|_| ()),
                    _ => Ok(()),
                };
                if let Err(e) = stored {
                    self.report("Photo not saved yet, will retry", e.into());
                }
                Task::none()
            }
            Message::ToolSelected(tool) => {
                self.editor.set_tool(tool);
                Task::none()
            }
            Message::Pointer(event) => {
                self.editor.pointer(event);
                Task::none()
            }
            Message::FinalizePolygon => {
                match self.editor.finalize_polygon() {
                    Ok(_) => self.status = "Polygon added to the mask.".to_string(),
                    Err(e) => self.status = e.to_string(),
                }
                Task::none()
            }
            Message::RemoveSelected => {
                self.editor.remove_selected();
                Task::none()
            }
            Message::ResizeSelected(factor) => {
                self.editor.resize_selected(factor, factor);
                Task::none()
            }
            Message::Undo => {
                self.editor.undo();
                Task::none()
            }
            Message::Redo => {
                self.editor.redo();
                Task::none()
            }
            Message::ColorChosen(index) => {
                let Some(entry) = CATALOG.get(index) else {
                    return Task::none();
                };
                match self.editor.request_recolor(entry.name, entry.rgb()) {
                    Some(job) => {
                        self.status = format!("Applying {}...", entry.name);
                        Task::perform(worker::run(job), Message::RecolorFinished)
                    }
                    None => {
                        // Nothing to recolor yet; not an error
                        self.status = "Outline the roof first.".to_string();
                        Task::none()
                    }
                }
            }
            Message::RecolorFinished(outcome) => {
                let key = outcome.color_key.clone();
                let ms = outcome.elapsed.as_millis();
                if !self.editor.finish_recolor(outcome) {
                    return Task::none();
                }
                self.refresh_background();
                self.status = format!("{key} applied in {ms} ms.");

                let saved = match (&self.library, &self.blobs) {
                    (Some(library), Some(blobs)) => self.editor.persist_choice(library, blobs).map(|_| ()),
                    _ => Ok(()),
                };
                if let Err(e) = saved {
                    self.report(&format!("{key} applied, but saving failed"), e.into());
                }
                Task::none()
            }
            Message::ToggleAlgorithm => {
                let next = self.editor.params().algorithm.toggled();
                self.editor.set_algorithm(next);
                self.status = format!("Algorithm: {}", next.label());
                Task::none()
            }
            Message::Reset => {
                if self.editor.reset_display() {
                    self.refresh_background();
                    self.status = "Showing the original photo.".to_string();
                }
                Task::none()
            }
            Message::Cancel => {
                self.editor.set_tool(Tool::Select);
                Task::none()
            }
        }
    }

    /// Log an editor failure and show it in the status line
    fn report(&mut self, context: &str, e: EditorError) {
        match &e {
            EditorError::Store(_) => error!(error = %e, "{context}"),
            _ => warn!(error = %e, "{context}"),
        }
        self.status = format!("{context}: {e}");
    }

    /// Rebuild the image handle from the session's displayed buffer
    fn refresh_background(&mut self) {
        self.background = self.editor.session().map(|session| {
            let displayed = session.displayed();
            image::Handle::from_rgba(displayed.width(), displayed.height(), displayed.as_raw().clone())
        });
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let surface = self.editor.surface();
        let (sw, sh) = surface.size();

        let tools = Tool::ALL.iter().fold(Row::new().spacing(6), |row, &tool| {
            let label = if tool == surface.tool() {
                format!("[{}]", tool.label())
            } else {
                tool.label().to_string()
            };
            row.push(button(text(label)).on_press(Message::ToolSelected(tool)).padding(8))
        });

        let has_photo = self.editor.session().is_some();
        let has_selection = surface.selected().is_some();
        let actions = row![
            button("Upload photo")
                .on_press_maybe((!self.loading).then_some(Message::UploadPhoto))
                .padding(8),
            button("Finish polygon")
                .on_press_maybe((surface.tool() == Tool::Polygon).then_some(Message::FinalizePolygon))
                .padding(8),
            button("Delete")
                .on_press_maybe(has_selection.then_some(Message::RemoveSelected))
                .padding(8),
            button("Grow")
                .on_press_maybe(has_selection.then_some(Message::ResizeSelected(1.1)))
                .padding(8),
            button("Shrink")
                .on_press_maybe(has_selection.then_some(Message::ResizeSelected(1.0 / 1.1)))
                .padding(8),
            button("Undo")
                .on_press_maybe(self.editor.can_undo().then_some(Message::Undo))
                .padding(8),
            button("Redo")
                .on_press_maybe(self.editor.can_redo().then_some(Message::Redo))
                .padding(8),
            button("Reset")
                .on_press_maybe(has_photo.then_some(Message::Reset))
                .padding(8),
            button(text(self.editor.params().algorithm.label()))
                .on_press(Message::ToggleAlgorithm)
                .padding(8),
        ]
        .spacing(6);

        let overlay = canvas(ui::canvas::SceneCanvas { surface })
            .width(Length::Fixed(sw))
            .height(Length::Fixed(sh));

        let photo_layer: Element<Message> = match (&self.background, self.editor.session()) {
            (Some(handle), Some(session)) => {
                let fit = session.fit();
                let (w, h) = session.dimensions();
                let (dw, dh) = fit.scaled_size(w as f32, h as f32);
                container(
                    image(handle.clone())
                        .width(Length::Fixed(dw))
                        .height(Length::Fixed(dh))
                        .content_fit(ContentFit::Fill),
                )
                .padding(Padding {
                    top: fit.offset_y,
                    right: 0.0,
                    bottom: 0.0,
                    left: fit.offset_x,
                })
                .into()
            }
            _ => container(text("No photo loaded"))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        let drawing = container(stack![photo_layer, overlay])
            .width(Length::Fixed(sw))
            .height(Length::Fixed(sh))
            .style(|_theme| container::Style {
                background: Some(Background::Color(ui::canvas::SURFACE_BACKGROUND)),
                ..Default::default()
            });

        let applied = self
            .editor
            .session()
            .and_then(|s| s.applied())
            .map(|a| a.key.as_str());

        let content = column![
            tools,
            actions,
            drawing,
            ui::palette::palette(applied, has_photo),
            text(&self.status).size(16),
        ]
        .spacing(12)
        .padding(20)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        keyboard::on_key_press(handle_key)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Keyboard shortcuts
fn handle_key(key: Key, modifiers: Modifiers) -> Option<Message> {
    match key.as_ref() {
        Key::Named(Named::Enter) => Some(Message::FinalizePolygon),
        Key::Named(Named::Delete) | Key::Named(Named::Backspace) => Some(Message::RemoveSelected),
        Key::Named(Named::Escape) => Some(Message::Cancel),
        Key::Character("z") if modifiers.command() => Some(Message::Undo),
        Key::Character("y") if modifiers.command() => Some(Message::Redo),
        Key::Character(c) if !modifiers.command() => {
            let digit = c.chars().next()?;
            catalog::shortcut(digit)?;
            digit.to_digit(10).map(|d| Message::ColorChosen(d as usize - 1))
        }
        _ => None,
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wgpu_core=warn,wgpu_hal=warn,naga=warn,{level}")));

    tracing_subscriber::fmt().with_env_filter(filter).without_time().init();
}

fn main() -> iced::Result {
    let (config, config_error) = match EditorConfig::load_default() {
        Ok(config) => (config, None),
        Err(e) => (EditorConfig::default(), Some(EditorError::from(e))),
    };

    init_tracing(&config.log_level);
    if let Some(e) = &config_error {
        warn!(error = %e, "using default configuration");
    }
    info!(
        surface_w = config.surface_width,
        surface_h = config.surface_height,
        algorithm = ?config.recolor.algorithm,
        "starting roof recolor editor"
    );

    iced::application("Roof Recolor", RoofRecolor::update, RoofRecolor::view)
        .theme(RoofRecolor::theme)
        .subscription(RoofRecolor::subscription)
        .centered()
        .run_with(move || RoofRecolor::new(config, config_error))
}
