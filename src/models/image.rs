use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

/// Documento da collection "images" - um job de transformação
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub transformation_type: String,
    /// Id do asset no Cloudinary (chave de junção com a busca externa)
    pub public_id: String,
    #[serde(rename = "secureURL")]
    pub secure_url: String,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(rename = "transformationURL", default)]
    pub transformation_url: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub author: Option<ObjectId>,
    /// Unix timestamp (ms)
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Campos editáveis recebidos do cliente
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageParams {
    pub title: String,
    pub transformation_type: String,
    pub public_id: String,
    #[serde(rename = "secureURL")]
    pub secure_url: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    #[schema(value_type = Object)]
    pub config: Option<serde_json::Value>,
    #[serde(rename = "transformationURL")]
    pub transformation_url: Option<String>,
    pub aspect_ratio: Option<String>,
    pub color: Option<String>,
    pub prompt: Option<String>,
}

impl ImageParams {
    pub fn into_image(self, author: ObjectId, now: i64) -> Image {
        Image {
            id: None,
            title: self.title,
            transformation_type: self.transformation_type,
            public_id: self.public_id,
            secure_url: self.secure_url,
            width: self.width,
            height: self.height,
            config: self.config,
            transformation_url: self.transformation_url,
            aspect_ratio: self.aspect_ratio,
            color: self.color,
            prompt: self.prompt,
            author: Some(author),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the editable fields of `existing`; id, author and creation
    /// time are kept.
    pub fn replace_into(self, existing: &Image, now: i64) -> Image {
        Image {
            id: existing.id,
            author: existing.author,
            created_at: existing.created_at,
            ..self.into_image(existing.author.unwrap_or_default(), now)
        }
    }
}

/// Subconjunto do autor embutido nas leituras (populate)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageAuthor {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub clerk_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopulatedImage {
    pub image: Image,
    pub author: Option<ImageAuthor>,
}

/// Filtro de listagem sobre a collection local
#[derive(Debug, Clone, PartialEq)]
pub enum ImageFilter {
    All,
    PublicIds(Vec<String>),
    Author(ObjectId),
}

impl ImageFilter {
    pub fn to_document(&self) -> Document {
        match self {
            ImageFilter::All => doc! {},
            ImageFilter::PublicIds(ids) => doc! { "publicId": { "$in": ids.clone() } },
            ImageFilter::Author(author) => doc! { "author": *author },
        }
    }
}

#[derive(Debug, Serialize, Clone, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub clerk_id: String,
}

#[derive(Debug, Serialize, Clone, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub transformation_type: String,
    pub public_id: String,
    #[serde(rename = "secureURL")]
    pub secure_url: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
    #[schema(value_type = Object)]
    pub config: Option<serde_json::Value>,
    #[serde(rename = "transformationURL")]
    pub transformation_url: Option<String>,
    pub aspect_ratio: Option<String>,
    pub color: Option<String>,
    pub prompt: Option<String>,
    /// Id do autor, ou o subconjunto populado
    #[schema(value_type = Object)]
    pub author: serde_json::Value,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ImageResponse {
    fn build(image: Image, author: serde_json::Value) -> Self {
        ImageResponse {
            id: image.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: image.title,
            transformation_type: image.transformation_type,
            public_id: image.public_id,
            secure_url: image.secure_url,
            width: image.width,
            height: image.height,
            config: image.config,
            transformation_url: image.transformation_url,
            aspect_ratio: image.aspect_ratio,
            color: image.color,
            prompt: image.prompt,
            author,
            created_at: image.created_at,
            updated_at: image.updated_at,
        }
    }
}

impl From<Image> for ImageResponse {
    fn from(image: Image) -> Self {
        let author = image
            .author
            .map(|id| serde_json::Value::String(id.to_hex()))
            .unwrap_or(serde_json::Value::Null);
        ImageResponse::build(image, author)
    }
}

impl From<PopulatedImage> for ImageResponse {
    fn from(populated: PopulatedImage) -> Self {
        match populated.author {
            Some(author) => {
                let author = serde_json::to_value(AuthorResponse {
                    id: author.id.to_hex(),
                    first_name: author.first_name,
                    last_name: author.last_name,
                    clerk_id: author.clerk_id,
                })
                .unwrap_or(serde_json::Value::Null);
                ImageResponse::build(populated.image, author)
            }
            None => ImageResponse::from(populated.image),
        }
    }
}

/// Página de resultados de listagem
#[derive(Debug, Serialize, Clone, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagePage {
    pub data: Vec<ImageResponse>,
    pub total_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_images: Option<u64>,
}
