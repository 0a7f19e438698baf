//! Catalogue models
//!
//! One struct per table. Wire names are kebab-case; every field defaults so
//! a partial payload decodes into a usable example.

use crate::descriptor::{Entity, EntityDescriptor, Field, FieldValue};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// =============================================================================
// Library
// =============================================================================

/// A music library rooted at a filesystem path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Library {
    pub id: i64,
    pub name: String,
    pub path: String,
}

static LIBRARY: EntityDescriptor = EntityDescriptor {
    shape: "Library",
    table: "library",
    source: "library",
    mutable: true,
    fields: &[
        Field::key("id"),
        Field::text("name"),
        Field::text("path"),
    ],
};

impl Library {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            path: path.into(),
        }
    }
}

impl Entity for Library {
    fn descriptor() -> &'static EntityDescriptor {
        &LIBRARY
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.into(),
            self.name.as_str().into(),
            self.path.as_str().into(),
        ]
    }

    fn key(&self) -> i64 {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Library name cannot be empty".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Genre
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

static GENRE: EntityDescriptor = EntityDescriptor {
    shape: "Genre",
    table: "genre",
    source: "genre",
    mutable: false,
    fields: &[Field::key("id"), Field::text("name")],
};

impl Entity for Genre {
    fn descriptor() -> &'static EntityDescriptor {
        &GENRE
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![self.id.into(), self.name.as_str().into()]
    }

    fn key(&self) -> i64 {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }
}

// =============================================================================
// Artist
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Artist {
    pub id: i64,
    pub name: String,
}

static ARTIST: EntityDescriptor = EntityDescriptor {
    shape: "Artist",
    table: "artist",
    source: "artist",
    mutable: false,
    fields: &[Field::key("id"), Field::text("name")],
};

impl Entity for Artist {
    fn descriptor() -> &'static EntityDescriptor {
        &ARTIST
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![self.id.into(), self.name.as_str().into()]
    }

    fn key(&self) -> i64 {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }
}

// =============================================================================
// Album
// =============================================================================

/// An album. `artist` is the artist's key; `duration` is whole seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Album {
    pub id: i64,
    pub artist: i64,
    pub title: String,
    pub year: i64,
    #[serde(rename = "num-tracks")]
    pub num_tracks: i64,
    #[serde(rename = "num-disks")]
    pub num_disks: i64,
    pub duration: i64,
}

static ALBUM: EntityDescriptor = EntityDescriptor {
    shape: "Album",
    table: "album",
    source: "album",
    mutable: false,
    fields: &[
        Field::key("id"),
        Field::integer("artist"),
        Field::text("title"),
        Field::integer("year"),
        Field::integer("num-tracks").column("num_tracks"),
        Field::integer("num-disks").column("num_disks"),
        Field::integer("duration"),
    ],
};

impl Entity for Album {
    fn descriptor() -> &'static EntityDescriptor {
        &ALBUM
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.into(),
            self.artist.into(),
            self.title.as_str().into(),
            self.year.into(),
            self.num_tracks.into(),
            self.num_disks.into(),
            self.duration.into(),
        ]
    }

    fn key(&self) -> i64 {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }
}

// =============================================================================
// Song
// =============================================================================

/// A song. Track and disk positions are unknown for some files.
///
/// `artist` is the name of the album's artist. It is resolved by join on
/// every read and can be used as a query constraint, but is never written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Song {
    pub id: i64,
    pub album: i64,
    pub genre: i64,
    pub title: String,
    pub size: i64,
    pub duration: f64,
    pub track: Option<i64>,
    #[serde(rename = "num-tracks")]
    pub num_tracks: Option<i64>,
    pub disk: Option<i64>,
    #[serde(rename = "num-disks")]
    pub num_disks: Option<i64>,
    pub artist: String,
}

static SONG: EntityDescriptor = EntityDescriptor {
    shape: "Song",
    table: "song",
    source: "song s \
             JOIN album al ON al.id = s.album \
             JOIN artist ar ON ar.id = al.artist",
    mutable: false,
    fields: &[
        Field::key("id").expr("s.id"),
        Field::integer("album").expr("s.album"),
        Field::integer("genre").expr("s.genre"),
        Field::text("title").expr("s.title"),
        Field::integer("size").expr("s.size"),
        Field::real("duration").expr("s.duration").unqueryable(),
        Field::integer("track").expr("s.track").nullable(),
        Field::integer("num-tracks")
            .column("num_tracks")
            .expr("s.num_tracks")
            .nullable(),
        Field::integer("disk").expr("s.disk").nullable(),
        Field::integer("num-disks")
            .column("num_disks")
            .expr("s.num_disks")
            .nullable(),
        Field::text("artist").expr("ar.name").derived(),
    ],
};

impl Entity for Song {
    fn descriptor() -> &'static EntityDescriptor {
        &SONG
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.into(),
            self.album.into(),
            self.genre.into(),
            self.title.as_str().into(),
            self.size.into(),
            self.duration.into(),
            self.track.into(),
            self.num_tracks.into(),
            self.disk.into(),
            self.num_disks.into(),
            self.artist.as_str().into(),
        ]
    }

    fn key(&self) -> i64 {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }
}

// =============================================================================
// Image
// =============================================================================

/// Artwork handle. Image bytes stay in storage and are not exchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Image {
    pub id: i64,
}

static IMAGE: EntityDescriptor = EntityDescriptor {
    shape: "Image",
    table: "image",
    source: "image",
    mutable: false,
    fields: &[Field::key("id")],
};

impl Entity for Image {
    fn descriptor() -> &'static EntityDescriptor {
        &IMAGE
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![self.id.into()]
    }

    fn key(&self) -> i64 {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = key;
    }
}
