use std::sync::Arc;

use crate::{
    db::{DbPool, OrmConn, orm_from_pool},
    middleware::auth::TokenKeys,
    notifications::NotificationScheduler,
    order_policy::OrderPolicy,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub scheduler: Arc<dyn NotificationScheduler>,
    pub tokens: TokenKeys,
    pub orders: OrderPolicy,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        scheduler: Arc<dyn NotificationScheduler>,
        tokens: TokenKeys,
        orders: OrderPolicy,
    ) -> Self {
        let orm = orm_from_pool(pool.clone());
        Self {
            pool,
            orm,
            scheduler,
            tokens,
            orders,
        }
    }
}
