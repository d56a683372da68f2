use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::blobs::BlobStore;
use super::data::{Image, Mask, MaskKind, MaskPayload, Project, ProjectBundle, Variant, VariantPayload};
use crate::error::StoreError;
use crate::photo::LoadedPhoto;

type StoreResult<T> = Result<T, StoreError>;

/// The Library manages the SQLite project database.
/// It stores projects, uploaded images, their masks and color variants.
/// Pixel data lives in the [`BlobStore`]; rows only hold storage references.
pub struct Library {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open or create the database at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "database opened");

        let library = Library {
            conn,
            db_path: Some(path.to_path_buf()),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// A throwaway database, used by tests
    pub fn open_in_memory() -> StoreResult<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Get the path where the database should be stored
    pub fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir);

        path.push("roof-recolor");
        path.push("projects.db");
        path
    }

    /// Create all tables and indexes if they don't exist.
    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS projects (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT,
                owner           TEXT,
                session_token   TEXT,
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS images (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id      INTEGER NOT NULL,
                storage_ref     TEXT NOT NULL,
                width           INTEGER NOT NULL,
                height          INTEGER NOT NULL,
                created_at      INTEGER NOT NULL,
                FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            -- One mask per image; saving again replaces it
            CREATE TABLE IF NOT EXISTS masks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                image_id        INTEGER NOT NULL UNIQUE,
                name            TEXT NOT NULL,
                kind            TEXT NOT NULL DEFAULT 'include',
                svg_path        TEXT NOT NULL,
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL,
                FOREIGN KEY(image_id) REFERENCES images(id) ON DELETE CASCADE
            );

            -- Append-only history of color choices
            CREATE TABLE IF NOT EXISTS variants (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                image_id        INTEGER NOT NULL,
                color_key       TEXT NOT NULL,
                hex             TEXT NOT NULL,
                preview_ref     TEXT,
                created_at      INTEGER NOT NULL,
                FOREIGN KEY(image_id) REFERENCES images(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_images_project_id ON images(project_id);
            CREATE INDEX IF NOT EXISTS idx_variants_image_id ON variants(image_id, created_at);",
        )?;

        debug!("database schema initialized");
        Ok(())
    }

    /// Get the path to the database file (`None` when in memory)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Create a project.
    ///
    /// Without an owner the project gets an anonymous session token.
    pub fn create_project(&self, title: Option<&str>, owner: Option<&str>) -> StoreResult<Project> {
        let now = Utc::now().timestamp();
        let session_token = match owner {
            Some(_) => None,
            None => Some(Uuid::new_v4().to_string()),
        };

        self.conn.execute(
            "INSERT INTO projects (title, owner, session_token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![title, owner, session_token, now],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(project = id, anonymous = owner.is_none(), "project created");

        Ok(Project {
            id,
            title: title.map(str::to_string),
            owner: owner.map(str::to_string),
            session_token,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_project_title(&self, project_id: i64, title: &str) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET title = ?1, updated_at = ?2 WHERE id = ?3",
            params![title, Utc::now().timestamp(), project_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound { what: "project", id: project_id });
        }
        Ok(())
    }

    /// Store an uploaded photo and record it under `project_id`.
    /// The original bytes go to the blob store unchanged.
    pub fn upload_image(&self, project_id: i64, photo: &LoadedPhoto, blobs: &BlobStore) -> StoreResult<Image> {
        self.get_project(project_id)?;

        let storage_ref = blobs.put(&photo.bytes, photo.format.extension())?;
        let (width, height) = photo.dimensions();
        let now = Utc::now().timestamp();

        let inserted = self.conn.execute(
            "INSERT INTO images (project_id, storage_ref, width, height, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![project_id, storage_ref, width, height, now],
        );
        if let Err(e) = inserted {
            // No row points at the blob; drop it
            if let Err(cleanup) = blobs.remove(&storage_ref) {
                warn!(error = %cleanup, storage_ref = %storage_ref, "failed to remove orphaned blob");
            }
            return Err(e.into());
        }
        let id = self.conn.last_insert_rowid();
        self.touch_project(project_id, now)?;
        info!(project = project_id, image = id, width, height, "image uploaded");

        Ok(Image {
            id,
            project_id,
            storage_ref,
            width,
            height,
            created_at: now,
        })
    }

    /// Insert or replace the mask of an image
    pub fn save_mask(&self, payload: &MaskPayload) -> StoreResult<Mask> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO masks (image_id, name, kind, svg_path, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(image_id) DO UPDATE SET
                name = excluded.name,
                kind = excluded.kind,
                svg_path = excluded.svg_path,
                updated_at = excluded.updated_at",
            params![payload.image_id, payload.name, payload.kind.as_str(), payload.svg_path, now],
        )?;

        let mask = self
            .get_mask(payload.image_id)?
            .ok_or(StoreError::NotFound { what: "mask for image", id: payload.image_id })?;
        debug!(image = payload.image_id, mask = mask.id, "mask saved");
        Ok(mask)
    }

    pub fn get_mask(&self, image_id: i64) -> StoreResult<Option<Mask>> {
        let mask = self
            .conn
            .query_row(
                "SELECT id, image_id, name, kind, svg_path, created_at, updated_at
                 FROM masks WHERE image_id = ?1",
                [image_id],
                |row| Ok((row_to_mask(row)?, row.get::<_, String>(3)?)),
            )
            .optional()?;

        match mask {
            Some((mask, kind)) => match MaskKind::parse(&kind) {
                Some(kind) => Ok(Some(Mask { kind, ..mask })),
                None => Err(StoreError::BadMaskKind(kind)),
            },
            None => Ok(None),
        }
    }

    /// Append a variant (never updates an existing one)
    pub fn save_variant(&self, payload: &VariantPayload, preview_ref: Option<&str>) -> StoreResult<Variant> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO variants (image_id, color_key, hex, preview_ref, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![payload.image_id, payload.color_key, payload.hex, preview_ref, now],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(image = payload.image_id, variant = id, color = %payload.color_key, "variant saved");

        Ok(Variant {
            id,
            image_id: payload.image_id,
            color_key: payload.color_key.clone(),
            hex: payload.hex.clone(),
            preview_ref: preview_ref.map(str::to_string),
            created_at: now,
        })
    }

    pub fn get_project(&self, project_id: i64) -> StoreResult<Project> {
        self.conn
            .query_row(
                "SELECT id, title, owner, session_token, created_at, updated_at
                 FROM projects WHERE id = ?1",
                [project_id],
                |row| {
                    Ok(Project {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        owner: row.get(2)?,
                        session_token: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound { what: "project", id: project_id })
    }

    /// Load a project with its images, masks and variants (oldest first)
    pub fn load_project(&self, project_id: i64) -> StoreResult<ProjectBundle> {
        let project = self.get_project(project_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, storage_ref, width, height, created_at
             FROM images WHERE project_id = ?1 ORDER BY id",
        )?;
        let images = stmt
            .query_map([project_id], |row| {
                Ok(Image {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    storage_ref: row.get(2)?,
                    width: row.get(3)?,
                    height: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut masks = Vec::new();
        let mut variants = Vec::new();
        for image in &images {
            if let Some(mask) = self.get_mask(image.id)? {
                masks.push(mask);
            }
            variants.extend(self.get_variants(image.id)?);
        }

        Ok(ProjectBundle {
            project,
            images,
            masks,
            variants,
        })
    }

    pub fn get_variants(&self, image_id: i64) -> StoreResult<Vec<Variant>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, image_id, color_key, hex, preview_ref, created_at
             FROM variants WHERE image_id = ?1 ORDER BY id",
        )?;
        let variants = stmt
            .query_map([image_id], |row| {
                Ok(Variant {
                    id: row.get(0)?,
                    image_id: row.get(1)?,
                    color_key: row.get(2)?,
                    hex: row.get(3)?,
                    preview_ref: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(variants)
    }

    /// Get a count of images in the library
    pub fn image_count(&self) -> StoreResult<i64> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
        Ok(count)
    }

    fn touch_project(&self, project_id: i64, now: i64) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE projects SET updated_at = ?1 WHERE id = ?2",
            params![now, project_id],
        )?;
        Ok(())
    }
}

/// Mask columns except `kind`, which is validated separately
fn row_to_mask(row: &Row<'_>) -> rusqlite::Result<Mask> {
    Ok(Mask {
        id: row.get(0)?,
        image_id: row.get(1)?,
        name: row.get(2)?,
        kind: MaskKind::default(),
        svg_path: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library").field("db_path", &self.db_path).finish()
    }
}
