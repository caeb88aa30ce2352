//! Cart and checkout endpoints.

use metadots_core::{
    Cart, CartLine, CheckoutReceipt, CheckoutRequest, CheckoutSession, CheckoutSessionRequest,
    ProductId,
};
use reqwest::Method;
use tracing::instrument;

use super::{Ack, ApiClient, ApiError, Session};

impl ApiClient {
    /// `GET /api/cart`.
    ///
    /// # Errors
    ///
    /// Returns an error (401 when anonymous) if the cart cannot be fetched.
    #[instrument(skip(self, session))]
    pub async fn get_cart(&self, session: &Session) -> Result<Cart, ApiError> {
        self.get("/api/cart", session).await
    }

    /// `POST /api/cart/add`. The backend merges re-adds into the existing line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown products (404) or insufficient stock (400).
    #[instrument(skip(self, session, line), fields(product_id = %line.product_id, quantity = line.quantity))]
    pub async fn add_to_cart(&self, session: &Session, line: &CartLine) -> Result<Ack, ApiError> {
        self.send_json(Method::POST, "/api/cart/add", session, line)
            .await
    }

    /// `PUT /api/cart/update`: set a line's quantity and price.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not in the cart.
    #[instrument(skip(self, session, line), fields(product_id = %line.product_id, quantity = line.quantity))]
    pub async fn update_cart(&self, session: &Session, line: &CartLine) -> Result<Ack, ApiError> {
        self.send_json(Method::PUT, "/api/cart/update", session, line)
            .await
    }

    /// `DELETE /api/cart/remove?product_id=`.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller has no cart.
    #[instrument(skip(self, session), fields(product_id = %product_id))]
    pub async fn remove_from_cart(
        &self,
        session: &Session,
        product_id: &ProductId,
    ) -> Result<Ack, ApiError> {
        let builder = self
            .request(Method::DELETE, "/api/cart/remove", session)
            .query(&[("product_id", product_id.as_str())]);
        self.execute(builder).await?.body.decode()
    }

    /// `POST /api/checkout`: place the order directly.
    ///
    /// # Errors
    ///
    /// Returns an error if a product is missing or out of stock.
    #[instrument(skip(self, session, request), fields(lines = request.items.len()))]
    pub async fn checkout(
        &self,
        session: &Session,
        request: &CheckoutRequest,
    ) -> Result<CheckoutReceipt, ApiError> {
        self.send_json(Method::POST, "/api/checkout", session, request)
            .await
    }

    /// `POST /api/payments/create-checkout-session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses to create the session.
    #[instrument(skip(self, session, request), fields(lines = request.items.len()))]
    pub async fn create_checkout_session(
        &self,
        session: &Session,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ApiError> {
        self.send_json(
            Method::POST,
            "/api/payments/create-checkout-session",
            session,
            request,
        )
        .await
    }
}
