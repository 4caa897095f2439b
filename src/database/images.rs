use super::{DatabaseConnector, ImageStore, IMAGES, USERS};
use crate::models::{Image, ImageAuthor, ImageFilter, PopulatedImage};
use crate::utils::AppError;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use std::sync::Arc;

const AUTHOR_FIELD: &str = "authorDoc";

pub struct MongoImageStore {
    connector: Arc<DatabaseConnector>,
}

impl MongoImageStore {
    pub fn new(connector: Arc<DatabaseConnector>) -> Self {
        Self { connector }
    }

    async fn collection<T: Send + Sync>(&self) -> Result<Collection<T>, AppError> {
        Ok(self.connector.get().await?.collection::<T>(IMAGES))
    }

    async fn aggregate_populated(&self, pipeline: Vec<Document>) -> Result<Vec<PopulatedImage>, AppError> {
        let images = self.collection::<Document>().await?;
        let cursor = images.aggregate(pipeline).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        documents.into_iter().map(split_author).collect()
    }
}

/// Estágios que embutem `_id firstName lastName clerkId` do autor
fn populate_author_stages() -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": USERS,
                "localField": "author",
                "foreignField": "_id",
                "as": AUTHOR_FIELD,
                "pipeline": [
                    { "$project": { "_id": 1, "firstName": 1, "lastName": 1, "clerkId": 1 } }
                ]
            }
        },
    ]
}

fn split_author(mut document: Document) -> Result<PopulatedImage, AppError> {
    let author = match document.remove(AUTHOR_FIELD) {
        Some(Bson::Array(mut authors)) if !authors.is_empty() => match authors.swap_remove(0) {
            Bson::Document(author) => Some(mongodb::bson::from_document::<ImageAuthor>(author)?),
            _ => None,
        },
        _ => None,
    };

    let image = mongodb::bson::from_document::<Image>(document)?;
    Ok(PopulatedImage { image, author })
}

#[async_trait]
impl ImageStore for MongoImageStore {
    async fn insert(&self, mut image: Image) -> Result<Image, AppError> {
        let images = self.collection::<Image>().await?;
        image.id = Some(ObjectId::new());
        images.insert_one(&image).await?;
        Ok(image)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Image>, AppError> {
        let images = self.collection::<Image>().await?;
        Ok(images.find_one(doc! { "_id": *id }).await?)
    }

    async fn find_populated(&self, id: &ObjectId) -> Result<Option<PopulatedImage>, AppError> {
        let mut pipeline = vec![doc! { "$match": { "_id": *id } }];
        pipeline.extend(populate_author_stages());

        Ok(self.aggregate_populated(pipeline).await?.into_iter().next())
    }

    async fn replace(&self, id: &ObjectId, image: Image) -> Result<Option<Image>, AppError> {
        let images = self.collection::<Image>().await?;
        Ok(images
            .find_one_and_replace(doc! { "_id": *id }, image)
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete(&self, id: &ObjectId) -> Result<Option<Image>, AppError> {
        let images = self.collection::<Image>().await?;
        Ok(images.find_one_and_delete(doc! { "_id": *id }).await?)
    }

    async fn find_page(
        &self,
        filter: &ImageFilter,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<PopulatedImage>, AppError> {
        let mut pipeline = vec![
            doc! { "$match": filter.to_document() },
            doc! { "$sort": { "updatedAt": -1, "_id": -1 } },
            doc! { "$skip": i64::try_from(skip).unwrap_or(i64::MAX) },
            doc! { "$limit": i64::try_from(limit).unwrap_or(i64::MAX) },
        ];
        pipeline.extend(populate_author_stages());

        self.aggregate_populated(pipeline).await
    }

    async fn count(&self, filter: &ImageFilter) -> Result<u64, AppError> {
        let images = self.collection::<Image>().await?;
        Ok(images.count_documents(filter.to_document()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_author_populated() {
        let author_id = ObjectId::new();
        let document = doc! {
            "_id": ObjectId::new(),
            "title": "Cat",
            "transformationType": "restore",
            "publicId": "imagenko/cat",
            "secureURL": "https://res.cloudinary.com/demo/cat.png",
            "author": author_id,
            "updatedAt": 10_i64,
            "authorDoc": [ { "_id": author_id, "firstName": "Ana", "clerkId": "user_1" } ],
        };

        let populated = split_author(document).unwrap();
        assert_eq!(populated.image.title, "Cat");
        let author = populated.author.unwrap();
        assert_eq!(author.id, author_id);
        assert_eq!(author.clerk_id, "user_1");
        assert_eq!(author.last_name, None);
    }

    #[test]
    fn test_split_author_missing() {
        let document = doc! {
            "_id": ObjectId::new(),
            "title": "Cat",
            "transformationType": "restore",
            "publicId": "imagenko/cat",
            "secureURL": "https://res.cloudinary.com/demo/cat.png",
            "authorDoc": [],
        };

        let populated = split_author(document).unwrap();
        assert!(populated.author.is_none());
        assert_eq!(populated.image.updated_at, 0);
    }
}
