//! Product catalog endpoints, including admin product management.

use metadots_core::{Categories, Product, ProductId, ProductInput, ProductPage, ProductPatch, ProductQuery};
use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;

use super::{Ack, ApiClient, ApiError, Session};

/// Response of the image upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    pub url: String,
}

impl ApiClient {
    /// `GET /api/products` with search, filter, sort and paging.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn list_products(
        &self,
        session: &Session,
        query: &ProductQuery,
    ) -> Result<ProductPage, ApiError> {
        self.get_with_query("/api/products", session, query).await
    }

    /// `GET /api/products/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error (404) if the product does not exist.
    #[instrument(skip(self, session), fields(product_id = %id))]
    pub async fn get_product(&self, session: &Session, id: &ProductId) -> Result<Product, ApiError> {
        self.get(&format!("/api/products/{id}"), session).await
    }

    /// `GET /api/products/categories`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, session))]
    pub async fn categories(&self, session: &Session) -> Result<Categories, ApiError> {
        self.get("/api/products/categories", session).await
    }

    /// `POST /api/products` (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the input is rejected.
    #[instrument(skip(self, session, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        session: &Session,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        self.send_json(Method::POST, "/api/products", session, input)
            .await
    }

    /// `PUT /api/products/{id}` (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the patch is empty.
    #[instrument(skip(self, session, patch), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        session: &Session,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, ApiError> {
        self.send_json(Method::PUT, &format!("/api/products/{id}"), session, patch)
            .await
    }

    /// `DELETE /api/products/{id}` (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the product is missing.
    #[instrument(skip(self, session), fields(product_id = %id))]
    pub async fn delete_product(&self, session: &Session, id: &ProductId) -> Result<Ack, ApiError> {
        let response = self
            .execute(self.request(Method::DELETE, &format!("/api/products/{id}"), session))
            .await?;
        response.body.decode()
    }

    /// `POST /api/products/upload-image` (admin): multipart upload of one
    /// image under the `file` field.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is rejected.
    #[instrument(skip(self, session, bytes), fields(file_name = %file_name, size = bytes.len()))]
    pub async fn upload_image(
        &self,
        session: &Session,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(ApiError::Transport)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let builder = self
            .request(Method::POST, "/api/products/upload-image", session)
            .multipart(form);
        self.execute(builder).await?.body.decode()
    }
}
