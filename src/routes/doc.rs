use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AccessToken, RefreshRequest, RegisterRequest, TokenPair, TokenRequest},
        categories::{CategoryList, CreateCategoryRequest},
        orders::{LineItemInput, OrderPlaced, PlaceOrderRequest, ShippingAddressInput},
        products::{PatchProductRequest, ProductList, ProductRequest},
        reports::{PopularProductList, PopularProductsQuery},
    },
    middleware::auth::Role,
    models::{Category, PopularProduct, Product, User},
    response::{ApiResponse, Meta},
    routes::{
        auth, categories, health, orders, params, products as product_routes, reports,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::token,
        auth::refresh,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::replace_product,
        product_routes::patch_product,
        product_routes::delete_product,
        categories::list_categories,
        categories::create_category,
        categories::delete_category,
        orders::place_order,
        reports::popular_products
    ),
    components(
        schemas(
            User,
            Role,
            Category,
            Product,
            PopularProduct,
            RegisterRequest,
            TokenRequest,
            TokenPair,
            RefreshRequest,
            AccessToken,
            ProductRequest,
            PatchProductRequest,
            ProductList,
            CreateCategoryRequest,
            CategoryList,
            ShippingAddressInput,
            LineItemInput,
            PlaceOrderRequest,
            OrderPlaced,
            PopularProductsQuery,
            PopularProductList,
            params::Pagination,
            params::ProductOrder,
            params::ProductQuery,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Category>,
            ApiResponse<CategoryList>,
            ApiResponse<OrderPlaced>,
            ApiResponse<PopularProductList>,
            ApiResponse<TokenPair>,
            ApiResponse<AccessToken>,
            ApiResponse<User>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Product categories"),
        (name = "Orders", description = "Order placement"),
        (name = "Reports", description = "Seller reports"),
        (name = "Auth", description = "Registration and tokens"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_api_route_is_documented() {
        let spec = ApiDoc::openapi();
        for path in [
            "/api/products",
            "/api/products/{id}",
            "/api/categories",
            "/api/categories/{id}",
            "/api/orders",
            "/api/popular",
            "/api/token",
            "/api/token/refresh",
            "/api/auth/register",
        ] {
            assert!(spec.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
