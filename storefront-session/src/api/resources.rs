//! Pass-through CRUD for catalog, order, user and cart resources

use crate::client::{ApiClient, ApiRequest};
use serde_json::Value;
use storefront_core::StorefrontResult;

/// Backend collections with the standard CRUD shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Products,
    Categories,
    Orders,
    Users,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Products => "/products",
            Resource::Categories => "/categories",
            Resource::Orders => "/orders",
            Resource::Users => "/users",
        }
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "products" => Ok(Resource::Products),
            "categories" => Ok(Resource::Categories),
            "orders" => Ok(Resource::Orders),
            "users" => Ok(Resource::Users),
            _ => Err(format!("Unknown resource: {}", s)),
        }
    }
}

/// CRUD client for one resource
#[derive(Debug, Clone)]
pub struct ResourceApi {
    client: ApiClient,
    resource: Resource,
}

impl ResourceApi {
    pub fn new(client: ApiClient, resource: Resource) -> Self {
        Self { client, resource }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.resource.path(), id)
    }

    pub async fn list(&self) -> StorefrontResult<Value> {
        self.client.get(self.resource.path()).await
    }

    pub async fn page(&self, page: u32, limit: u32) -> StorefrontResult<Value> {
        let request = ApiRequest::get(self.resource.path())
            .query("page", page)
            .query("limit", limit);
        Ok(self.client.send(request).await?.body)
    }

    pub async fn get(&self, id: &str) -> StorefrontResult<Value> {
        self.client.get(&self.item_path(id)).await
    }

    pub async fn create(&self, body: Value) -> StorefrontResult<Value> {
        self.client.post(self.resource.path(), body).await
    }

    pub async fn update(&self, id: &str, body: Value) -> StorefrontResult<Value> {
        self.client.put(&self.item_path(id), body).await
    }

    pub async fn delete(&self, id: &str) -> StorefrontResult<Value> {
        self.client.delete(&self.item_path(id)).await
    }
}

/// Product endpoints beyond plain CRUD
#[derive(Debug, Clone)]
pub struct ProductsApi {
    client: ApiClient,
}

impl ProductsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn crud(&self) -> ResourceApi {
        ResourceApi::new(self.client.clone(), Resource::Products)
    }

    pub async fn delete_image(&self, product_id: &str, image_name: &str) -> StorefrontResult<Value> {
        self.client
            .delete(&format!("/products/delete-image/{}/{}", product_id, image_name))
            .await
    }
}

/// Order endpoints beyond plain CRUD
#[derive(Debug, Clone)]
pub struct OrdersApi {
    client: ApiClient,
}

impl OrdersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn crud(&self) -> ResourceApi {
        ResourceApi::new(self.client.clone(), Resource::Orders)
    }

    /// Orders of the signed-in user
    pub async fn mine(&self) -> StorefrontResult<Value> {
        self.client.get("/orders/user").await
    }

    pub async fn for_user(&self, user_id: &str) -> StorefrontResult<Value> {
        self.client.get(&format!("/orders/user/{}", user_id)).await
    }
}

/// The signed-in user's cart
#[derive(Debug, Clone)]
pub struct CartApi {
    client: ApiClient,
}

impl CartApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self) -> StorefrontResult<Value> {
        self.client.get("/cart").await
    }

    pub async fn clear(&self) -> StorefrontResult<Value> {
        self.client.delete("/cart/clear").await
    }
}
