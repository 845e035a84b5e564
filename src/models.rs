//! Decoded Giphy response shapes.
//!
//! Only the fields callers actually need are modelled; everything else in the
//! payload is ignored by serde. The set of shapes is closed: [`ApiResponse`] is
//! sealed and implemented by the four envelope types below.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

mod sealed {
    pub trait Sealed {}
}

/// A decodable Giphy response envelope.
///
/// Used as the type parameter of [`crate::RequestHandle`] so the decode target
/// is fixed at compile time for each endpoint.
pub trait ApiResponse: sealed::Sealed + DeserializeOwned + Send + 'static {
    /// The `meta` block every Giphy envelope carries.
    fn meta(&self) -> &Meta;
}

/// The `meta` block of a Giphy response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub status: u16,
    pub msg: String,
    pub response_id: String,
}

/// Pagination info attached to multi-item responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub total_count: u64,
    pub count: u64,
    pub offset: u64,
}

/// A single rendition of a GIF or sticker.
///
/// Giphy encodes dimensions and sizes as strings; numbers are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub width: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub height: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub size: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub frames: Option<String>,
    pub mp4: Option<String>,
    pub webp: Option<String>,
}

/// The renditions Giphy offers for one media item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    pub original: Option<Image>,
    pub downsized: Option<Image>,
    pub fixed_height: Option<Image>,
    pub fixed_width: Option<Image>,
    pub fixed_height_downsampled: Option<Image>,
    pub fixed_width_downsampled: Option<Image>,
    pub fixed_height_small: Option<Image>,
    pub fixed_width_small: Option<Image>,
    pub fixed_height_small_still: Option<Image>,
    pub fixed_width_small_still: Option<Image>,
}

/// A GIF or sticker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gif {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub slug: String,
    pub url: String,
    pub bitly_url: String,
    pub embed_url: String,
    pub username: String,
    pub source: String,
    pub rating: String,
    pub title: String,
    pub images: Images,
}

/// Single-item response (`translate`, `gifs/{id}`, and projected `random`).
///
/// `data` is `None` when Giphy found nothing (it sends `"data": []`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifResponse {
    #[serde(default, deserialize_with = "item_or_empty")]
    pub data: Option<Gif>,
    #[serde(default)]
    pub meta: Meta,
}

/// Multi-item response (`search`, `trending`, `gifs?ids=`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleGifsResponse {
    #[serde(default)]
    pub data: Vec<Gif>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub meta: Meta,
}

/// An envelope with no payload beyond `meta`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericResponse {
    #[serde(default)]
    pub meta: Meta,
}

/// The flat item shape returned by the `random` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomGif {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub url: String,
    pub username: String,
    pub image_original_url: Option<String>,
    pub image_url: Option<String>,
    pub image_mp4_url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub image_frames: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub image_width: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub image_height: Option<String>,
    pub fixed_height_downsampled_url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub fixed_height_downsampled_width: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub fixed_height_downsampled_height: Option<String>,
    pub fixed_width_downsampled_url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub fixed_width_downsampled_width: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub fixed_width_downsampled_height: Option<String>,
    pub fixed_height_small_url: Option<String>,
    pub fixed_height_small_still_url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub fixed_height_small_width: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub fixed_height_small_height: Option<String>,
    pub fixed_width_small_url: Option<String>,
    pub fixed_width_small_still_url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub fixed_width_small_width: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub fixed_width_small_height: Option<String>,
}

/// Envelope returned by the `random` endpoint.
///
/// Convert it into a [`GifResponse`] with `From`/`Into`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomGifResponse {
    #[serde(default, deserialize_with = "item_or_empty")]
    pub data: Option<RandomGif>,
    #[serde(default)]
    pub meta: Meta,
}

impl From<RandomGif> for Gif {
    fn from(random: RandomGif) -> Self {
        let rendition = |url: Option<String>, width: Option<String>, height: Option<String>| {
            url.map(|url| Image {
                url: Some(url),
                width,
                height,
                ..Image::default()
            })
        };

        let original = random.image_original_url.or(random.image_url).map(|url| Image {
            url: Some(url),
            width: random.image_width,
            height: random.image_height,
            frames: random.image_frames,
            mp4: random.image_mp4_url,
            ..Image::default()
        });

        Gif {
            kind: random.kind,
            id: random.id,
            url: random.url,
            username: random.username,
            images: Images {
                original,
                fixed_height_downsampled: rendition(
                    random.fixed_height_downsampled_url,
                    random.fixed_height_downsampled_width,
                    random.fixed_height_downsampled_height,
                ),
                fixed_width_downsampled: rendition(
                    random.fixed_width_downsampled_url,
                    random.fixed_width_downsampled_width,
                    random.fixed_width_downsampled_height,
                ),
                fixed_height_small: rendition(
                    random.fixed_height_small_url,
                    random.fixed_height_small_width.clone(),
                    random.fixed_height_small_height.clone(),
                ),
                fixed_height_small_still: rendition(
                    random.fixed_height_small_still_url,
                    random.fixed_height_small_width,
                    random.fixed_height_small_height,
                ),
                fixed_width_small: rendition(
                    random.fixed_width_small_url,
                    random.fixed_width_small_width.clone(),
                    random.fixed_width_small_height.clone(),
                ),
                fixed_width_small_still: rendition(
                    random.fixed_width_small_still_url,
                    random.fixed_width_small_width,
                    random.fixed_width_small_height,
                ),
                ..Images::default()
            },
            ..Gif::default()
        }
    }
}

impl From<RandomGifResponse> for GifResponse {
    fn from(random: RandomGifResponse) -> Self {
        GifResponse {
            data: random.data.map(Gif::from),
            meta: random.meta,
        }
    }
}

impl sealed::Sealed for GifResponse {}
impl sealed::Sealed for MultipleGifsResponse {}
impl sealed::Sealed for GenericResponse {}
impl sealed::Sealed for RandomGifResponse {}

impl ApiResponse for GifResponse {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}

impl ApiResponse for MultipleGifsResponse {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}

impl ApiResponse for GenericResponse {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}

impl ApiResponse for RandomGifResponse {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}

/// Accepts an object, `null`, or an empty array (Giphy's "nothing found").
fn item_or_empty<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Array(items) if items.is_empty() => Ok(None),
        serde_json::Value::Array(_) => Err(D::Error::custom("expected a single item, found a list")),
        value => serde_json::from_value(value).map(Some).map_err(D::Error::custom),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}
