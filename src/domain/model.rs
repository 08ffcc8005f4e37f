use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::ListError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListItemId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(pub u64);

macro_rules! display_inner {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        })*
    };
}

display_inner!(UserId, ListItemId, CatalogId);

/// Kind of media a catalog entity describes. Each kind is served by its own
/// catalog route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Album,
    Song,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Movie, MediaKind::Album, MediaKind::Song];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Album => "album",
            MediaKind::Song => "song",
        }
    }

    /// The user list items of this kind are ranked in.
    pub fn list(&self) -> ListKind {
        match self {
            MediaKind::Movie => ListKind::Movie,
            MediaKind::Album | MediaKind::Song => ListKind::Music,
        }
    }

    /// Maps the numeric type codes used by the music catalog.
    pub fn from_legacy_code(code: i32) -> Result<Self, ListError> {
        match code {
            1 => Ok(MediaKind::Album),
            2 => Ok(MediaKind::Song),
            other => Err(ListError::invalid_reference(format!(
                "unsupported media type code {}",
                other
            ))),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "album" => Ok(MediaKind::Album),
            "song" => Ok(MediaKind::Song),
            other => Err(ListError::invalid_reference(format!(
                "unsupported media type '{}'",
                other
            ))),
        }
    }
}

/// Each user owns one movie list and one music list, ranked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Movie,
    Music,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Movie => "movie",
            ListKind::Music => "music",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = ListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(ListKind::Movie),
            "music" | "musics" => Ok(ListKind::Music),
            other => Err(ListError::invalid_reference(format!(
                "unknown list '{}'",
                other
            ))),
        }
    }
}

/// Identifies a catalog entity. Catalog ids are only unique within one media kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogRef {
    pub kind: MediaKind,
    pub id: CatalogId,
}

impl fmt::Display for CatalogRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Canonical catalog record, owned by the catalog service. The list only keeps its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntity {
    pub id: CatalogId,
    pub api_code: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: ListItemId,
    pub owner: UserId,
    pub catalog: CatalogRef,
    pub rank: u32,
    pub added_at: DateTime<Utc>,
}

impl ListItem {
    pub fn list(&self) -> ListKind {
        self.catalog.kind.list()
    }
}

/// A list item before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListItem {
    pub owner: UserId,
    pub catalog: CatalogRef,
    pub rank: u32,
    pub added_at: DateTime<Utc>,
}

impl NewListItem {
    pub fn into_item(self, id: ListItemId) -> ListItem {
        ListItem {
            id,
            owner: self.owner,
            catalog: self.catalog,
            rank: self.rank,
            added_at: self.added_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_parsing() {
        assert_eq!("Movie".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert_eq!(" song ".parse::<MediaKind>().unwrap(), MediaKind::Song);
        assert!("podcast".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_albums_and_songs_share_the_music_list() {
        assert_eq!(MediaKind::Movie.list(), ListKind::Movie);
        assert_eq!(MediaKind::Album.list(), ListKind::Music);
        assert_eq!(MediaKind::Song.list(), ListKind::Music);
        assert_eq!("Musics".parse::<ListKind>().unwrap(), ListKind::Music);
        assert!("books".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_legacy_codes() {
        assert_eq!(MediaKind::from_legacy_code(1).unwrap(), MediaKind::Album);
        assert_eq!(MediaKind::from_legacy_code(2).unwrap(), MediaKind::Song);
        assert!(matches!(
            MediaKind::from_legacy_code(7),
            Err(ListError::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_catalog_entity_ignores_unknown_fields() {
        let entity: CatalogEntity = serde_json::from_str(
            r#"{"id": 12, "apiCode": "tt0111161", "title": "The Shawshank Redemption", "year": 1994}"#,
        )
        .unwrap();
        assert_eq!(entity.id, CatalogId(12));
        assert_eq!(entity.api_code, "tt0111161");
    }
}
