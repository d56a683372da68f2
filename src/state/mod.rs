/// State management module
///
/// This module handles all application state, including:
/// - Project database and queries (library.rs)
/// - Blob storage for originals and previews (blobs.rs)
/// - Shared data structures (data.rs)
/// - Recolor parameters (edit.rs)
/// - The per-photo edit session and request tokens (session.rs)
/// - Shape undo/redo log (history.rs)
/// - The editor controller tying it together (editor.rs)

pub mod blobs;
pub mod data;
pub mod edit;
pub mod editor;
pub mod history;
pub mod library;
pub mod session;
