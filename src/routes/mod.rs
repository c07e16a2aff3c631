use axum::{
    Router,
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{MethodFilter, MethodRouter, get, on},
};

use crate::{
    middleware::auth::{Access, Capability, Guard, TokenKeys, require_access},
    state::AppState,
};

pub mod auth;
pub mod categories;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod reports;

/// One row of the API route table.
pub struct Endpoint {
    pub method: MethodFilter,
    pub path: &'static str,
    pub access: Access,
    route: MethodRouter<AppState>,
}

fn endpoint<H, T>(method: MethodFilter, path: &'static str, access: Access, handler: H) -> Endpoint
where
    H: Handler<T, AppState>,
    T: 'static,
{
    Endpoint {
        method,
        path,
        access,
        route: on(method, handler),
    }
}

const SELLER: Access = Access::Requires(Capability::Seller);
const CUSTOMER: Access = Access::Requires(Capability::Customer);

/// Every API endpoint with the access it demands, relative to `/api`.
pub fn endpoints() -> Vec<Endpoint> {
    use Access::Public;
    use MethodFilter as M;

    vec![
        endpoint(M::GET, "/products", Public, products::list_products),
        endpoint(M::POST, "/products", SELLER, products::create_product),
        endpoint(M::GET, "/products/{id}", Public, products::get_product),
        endpoint(M::PUT, "/products/{id}", SELLER, products::replace_product),
        endpoint(M::PATCH, "/products/{id}", SELLER, products::patch_product),
        endpoint(M::DELETE, "/products/{id}", SELLER, products::delete_product),
        endpoint(M::GET, "/categories", Public, categories::list_categories),
        endpoint(M::POST, "/categories", SELLER, categories::create_category),
        endpoint(M::DELETE, "/categories/{id}", SELLER, categories::delete_category),
        endpoint(M::POST, "/orders", CUSTOMER, orders::place_order),
        endpoint(M::GET, "/popular", SELLER, reports::popular_products),
        endpoint(M::POST, "/token", Public, auth::token),
        endpoint(M::POST, "/token/refresh", Public, auth::refresh),
        endpoint(M::POST, "/auth/register", Public, auth::register),
    ]
}

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(keys: &TokenKeys) -> Router<AppState> {
    endpoints()
        .into_iter()
        .fold(Router::new(), |router, endpoint| {
            let route = match endpoint.access {
                Access::Public => endpoint.route,
                access => endpoint.route.route_layer(from_fn_with_state(
                    Guard {
                        access,
                        keys: keys.clone(),
                    },
                    require_access,
                )),
            };
            router.route(endpoint.path, route)
        })
}

/// Health check, the `/api` table and the docs UI, with state bound.
pub fn app(state: AppState) -> Router {
    let api_router = create_api_router(&state.tokens);
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_router)
        .merge(doc::scalar_docs())
        .with_state(state)
}
