// ==================== IMAGE REPOSITORY ====================
// Jobs de transformação. Toda escrita revalida a página afetada.

use crate::{
    database::ImageStore,
    models::{Image, ImageFilter, ImagePage, ImageParams, ImageResponse, PopulatedImage},
    services::{cloudinary_service::AssetSearch, user_service::UserService},
    utils::{detail_path, AppError, PageCache},
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: u64 = 9;

#[derive(Debug, Clone)]
pub struct ListImagesParams {
    pub limit: u64,
    pub page: u64,
    pub search_query: String,
}

impl Default for ListImagesParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            page: 1,
            search_query: String::new(),
        }
    }
}

/// Largest offset the store accepts (`$skip` is a signed 64-bit int).
pub const MAX_SKIP: u64 = i64::MAX as u64;

/// `(skip, limit)` for a 1-based page; page and limit are clamped to 1 and
/// skip saturates at `MAX_SKIP`.
pub fn page_window(page: u64, limit: u64) -> (u64, u64) {
    let limit = limit.max(1);
    let page = page.max(1);
    ((page - 1).saturating_mul(limit).min(MAX_SKIP), limit)
}

pub fn total_pages(total: u64, limit: u64) -> u64 {
    total.div_ceil(limit.max(1))
}

pub fn parse_image_id(image_id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(image_id)
        .map_err(|_| AppError::NotFound(format!("Image {}", image_id)))
}

pub struct ImageService {
    images: Arc<dyn ImageStore>,
    users: Arc<UserService>,
    assets: Arc<dyn AssetSearch>,
    pages: Arc<PageCache>,
}

impl ImageService {
    pub fn new(
        images: Arc<dyn ImageStore>,
        users: Arc<UserService>,
        assets: Arc<dyn AssetSearch>,
        pages: Arc<PageCache>,
    ) -> Self {
        Self {
            images,
            users,
            assets,
            pages,
        }
    }

    pub async fn add_image(
        &self,
        params: ImageParams,
        author_clerk_id: &str,
        path: &str,
    ) -> Result<Image, AppError> {
        let author = self.users.get_or_create_user(author_clerk_id).await?;
        let author_id = author
            .id
            .ok_or_else(|| AppError::DatabaseError("Author has no _id".to_string()))?;

        let now = chrono::Utc::now().timestamp_millis();
        let image = self.images.insert(params.into_image(author_id, now)).await?;

        self.pages.revalidate_path(path);
        log::info!("🖼️  Image {:?} added by {}", image.id.map(|id| id.to_hex()), author_clerk_id);

        Ok(image)
    }

    /// Replaces an image's editable fields. Only the author may update it.
    pub async fn update_image(
        &self,
        image_id: &str,
        params: ImageParams,
        author_clerk_id: &str,
        path: &str,
    ) -> Result<Image, AppError> {
        let author = self.users.get_user_by_id(author_clerk_id).await.map_err(|e| {
            log::error!("❌ User not found in update_image: {}", author_clerk_id);
            e
        })?;

        let unauthorized = || AppError::Unauthorized("Unauthorized or image not found".to_string());

        let object_id = ObjectId::parse_str(image_id).map_err(|_| unauthorized())?;
        let existing = self
            .images
            .find_by_id(&object_id)
            .await?
            .ok_or_else(unauthorized)?;

        if existing.author.is_none() || existing.author != author.id {
            log::warn!("⚠️  {} tried to update image {} they do not own", author_clerk_id, image_id);
            return Err(unauthorized());
        }

        let now = chrono::Utc::now().timestamp_millis();
        let updated = self
            .images
            .replace(&object_id, params.replace_into(&existing, now))
            .await?
            .ok_or_else(unauthorized)?;

        self.pages.revalidate_path(path);
        self.pages.revalidate_path(&detail_path(image_id));
        log::info!("✅ Image {} updated", image_id);

        Ok(updated)
    }

    /// Fire-and-forget delete: failures are logged, never raised.
    pub async fn delete_image(&self, image_id: &str, path: &str) -> Option<Image> {
        let object_id = match ObjectId::parse_str(image_id) {
            Ok(id) => id,
            Err(e) => {
                log::error!("❌ Error in delete_image: invalid id {}: {}", image_id, e);
                return None;
            }
        };

        match self.images.delete(&object_id).await {
            Ok(Some(image)) => {
                self.pages.revalidate_path(path);
                self.pages.revalidate_path(&detail_path(image_id));
                log::info!("🗑️  Image {} deleted", image_id);
                Some(image)
            }
            Ok(None) => {
                log::warn!("⚠️  Image {} not found for deletion", image_id);
                None
            }
            Err(e) => {
                log::error!("❌ Error in delete_image: {}", e);
                None
            }
        }
    }

    pub async fn get_image_by_id(&self, image_id: &str) -> Result<PopulatedImage, AppError> {
        let object_id = parse_image_id(image_id)?;

        self.images
            .find_populated(&object_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {}", image_id)))
    }

    /// Gallery listing, optionally narrowed by the asset index search.
    pub async fn get_all_images(&self, params: &ListImagesParams) -> Result<ImagePage, AppError> {
        self.assets.ensure_configured()?;

        let query = params.search_query.trim();
        let filter = if query.is_empty() {
            ImageFilter::All
        } else {
            ImageFilter::PublicIds(self.assets.search_public_ids(query).await?)
        };

        let (skip, limit) = page_window(params.page, params.limit);
        let images = self.images.find_page(&filter, skip, limit).await?;
        let total_images = self.images.count(&filter).await?;
        let saved_images = self.images.count(&ImageFilter::All).await?;

        Ok(ImagePage {
            data: images.into_iter().map(ImageResponse::from).collect(),
            total_page: total_pages(total_images, limit),
            saved_images: Some(saved_images),
        })
    }

    pub async fn get_user_images(
        &self,
        author_id: ObjectId,
        page: u64,
        limit: u64,
    ) -> Result<ImagePage, AppError> {
        let filter = ImageFilter::Author(author_id);
        let (skip, limit) = page_window(page, limit);

        let images = self.images.find_page(&filter, skip, limit).await?;
        let total_images = self.images.count(&filter).await?;

        Ok(ImagePage {
            data: images.into_iter().map(ImageResponse::from).collect(),
            total_page: total_pages(total_images, limit),
            saved_images: None,
        })
    }
}
