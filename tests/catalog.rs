mod common;

use buylando_api::{
    dto::{
        categories::CreateCategoryRequest,
        orders::{LineItemInput, PlaceOrderRequest, ShippingAddressInput},
        products::ProductRequest,
    },
    entity::order_items::{Column as ItemCol, Entity as OrderItems},
    error::AppError,
    middleware::auth::Role,
    routes::params::{ProductOrder, ProductQuery},
    services::{category_service, order_service, product_service},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use common::{
    create_category, create_product, create_user, database_url, price,
    setup_with_memory_scheduler, unique,
};

#[tokio::test]
async fn category_filter_ignores_case() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, _scheduler) = setup_with_memory_scheduler(&database_url).await?;

    let name = unique("Computers");
    let computers = create_category(&state, &name).await?;
    let other = create_category(&state, &unique("Kitchen")).await?;
    let laptop = create_product(&state, "Laptop", "999.00", computers).await?;
    let desktop = create_product(&state, "Desktop", "1299.00", computers).await?;
    create_product(&state, "Kettle", "20.00", other).await?;

    let resp = product_service::list_products(
        &state,
        ProductQuery {
            category: Some(name.to_lowercase()),
            ..Default::default()
        },
    )
    .await?;
    let items = resp.data.expect("product list").items;
    let mut ids: Vec<Uuid> = items.iter().map(|p| p.id).collect();
    ids.sort();
    let mut expected = vec![laptop, desktop];
    expected.sort();
    assert_eq!(ids, expected);
    assert!(items.iter().all(|p| p.category.name == name));

    Ok(())
}

#[tokio::test]
async fn unmatched_filter_returns_empty_list() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, _scheduler) = setup_with_memory_scheduler(&database_url).await?;

    let resp = product_service::list_products(
        &state,
        ProductQuery {
            name: Some(unique("no-such-product")),
            ..Default::default()
        },
    )
    .await?;
    assert!(resp.data.expect("product list").items.is_empty());
    let meta = resp.meta.expect("meta");
    assert_eq!(meta.total, Some(0));
    assert_eq!(meta.next, None);

    Ok(())
}

#[tokio::test]
async fn pages_hold_ten_products_and_past_the_end_is_empty() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, _scheduler) = setup_with_memory_scheduler(&database_url).await?;

    let token = unique("widget");
    let category = create_category(&state, &unique("Widgets")).await?;
    for n in 0..12 {
        create_product(&state, &format!("{token} {n:02}"), "1.00", category).await?;
    }
    let query = |page| ProductQuery {
        name: Some(token.to_uppercase()),
        page: Some(page),
        ..Default::default()
    };

    let first = product_service::list_products(&state, query(1)).await?;
    assert_eq!(first.data.expect("page 1").items.len(), 10);
    let meta = first.meta.expect("meta");
    assert_eq!(meta.next, Some(2));
    assert_eq!(meta.previous, None);

    let second = product_service::list_products(&state, query(2)).await?;
    assert_eq!(second.data.expect("page 2").items.len(), 2);
    let meta = second.meta.expect("meta");
    assert_eq!(meta.next, None);
    assert_eq!(meta.previous, Some(1));

    let beyond = product_service::list_products(&state, query(9)).await?;
    assert!(beyond.data.expect("page 9").items.is_empty());
    let meta = beyond.meta.expect("meta");
    assert_eq!(meta.total, Some(12));
    assert_eq!(meta.next, None);
    assert_eq!(meta.previous, None);

    let last_possible = product_service::list_products(&state, query(i64::MAX)).await?;
    assert!(last_possible.data.expect("page i64::MAX").items.is_empty());
    let meta = last_possible.meta.expect("meta");
    assert_eq!(meta.page, Some(i64::MAX));
    assert_eq!(meta.next, None);
    assert_eq!(meta.previous, None);

    Ok(())
}

#[tokio::test]
async fn products_can_be_ordered_by_price() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, _scheduler) = setup_with_memory_scheduler(&database_url).await?;

    let token = unique("gadget");
    let category = create_category(&state, &unique("Gadgets")).await?;
    let expensive = create_product(&state, &format!("{token} a"), "30.00", category).await?;
    let cheap = create_product(&state, &format!("{token} b"), "10.00", category).await?;
    let middle = create_product(&state, &format!("{token} c"), "20.00", category).await?;

    let resp = product_service::list_products(
        &state,
        ProductQuery {
            name: Some(token.clone()),
            order: Some(ProductOrder::Price),
            ..Default::default()
        },
    )
    .await?;
    let ids: Vec<Uuid> = resp.data.expect("list").items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![cheap, middle, expensive]);

    let resp = product_service::list_products(
        &state,
        ProductQuery {
            name: Some(token),
            price: Some(price("20")),
            ..Default::default()
        },
    )
    .await?;
    let ids: Vec<Uuid> = resp.data.expect("list").items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![middle]);

    Ok(())
}

#[tokio::test]
async fn referenced_category_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, _scheduler) = setup_with_memory_scheduler(&database_url).await?;

    let seller = create_user(&state, Role::Seller).await?;
    let category = create_category(&state, &unique("Audio")).await?;
    let speaker = create_product(&state, "Speaker", "49.99", category).await?;

    let result = category_service::delete_category(&state, &seller, category).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let product = product_service::get_product(&state, speaker)
        .await?
        .data
        .expect("product");
    assert_eq!(product.category.id, category);
    assert_eq!(product.price, price("49.99"));

    Ok(())
}

#[tokio::test]
async fn category_lifecycle() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, _scheduler) = setup_with_memory_scheduler(&database_url).await?;

    let seller = create_user(&state, Role::Seller).await?;
    let name = unique("Seasonal");
    let created = category_service::create_category(
        &state,
        &seller,
        CreateCategoryRequest { name: name.clone() },
    )
    .await?
    .data
    .expect("category");

    let duplicate =
        category_service::create_category(&state, &seller, CreateCategoryRequest { name }).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    category_service::delete_category(&state, &seller, created.id).await?;
    let again = category_service::delete_category(&state, &seller, created.id).await;
    assert!(matches!(again, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn product_writes_validate_and_replace() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, _scheduler) = setup_with_memory_scheduler(&database_url).await?;

    let seller = create_user(&state, Role::Seller).await?;
    let category = create_category(&state, &unique("Office")).await?;

    let unknown_category = product_service::create_product(
        &state,
        &seller,
        ProductRequest {
            name: "Stapler".into(),
            description: None,
            price: price("4.50"),
            category_id: Uuid::new_v4(),
        },
    )
    .await;
    assert!(matches!(unknown_category, Err(AppError::Validation(_))));

    let created = product_service::create_product(
        &state,
        &seller,
        ProductRequest {
            name: "Stapler".into(),
            description: Some("Staples up to 20 sheets".into()),
            price: price("4.50"),
            category_id: category,
        },
    )
    .await?
    .data
    .expect("product");

    let replaced = product_service::replace_product(
        &state,
        &seller,
        created.id,
        ProductRequest {
            name: "Heavy stapler".into(),
            description: None,
            price: price("9.00"),
            category_id: category,
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(replaced.name, "Heavy stapler");
    assert_eq!(replaced.description, None);
    assert_eq!(replaced.price, price("9.00"));

    let customer = create_user(&state, Role::Customer).await?;
    let forbidden = product_service::delete_product(&state, &customer, created.id).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    Ok(())
}

#[tokio::test]
async fn deleting_a_product_removes_its_order_items() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let (state, _scheduler) = setup_with_memory_scheduler(&database_url).await?;

    let seller = create_user(&state, Role::Seller).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let category = create_category(&state, &unique("Lamps")).await?;
    let lamp = create_product(&state, "Lamp", "15.00", category).await?;

    order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            shipping_address: ShippingAddressInput {
                full_name: "Anna Nowak".into(),
                street: "Dluga 5".into(),
                zip_code: "30-001".into(),
                city: "Krakow".into(),
                country_code: "PL".into(),
            },
            items: vec![LineItemInput {
                product_id: lamp,
                quantity: 2,
            }],
        },
    )
    .await?;

    product_service::delete_product(&state, &seller, lamp).await?;

    let items = OrderItems::find()
        .filter(ItemCol::ProductId.eq(lamp))
        .count(&state.orm)
        .await?;
    assert_eq!(items, 0);
    assert!(matches!(
        product_service::get_product(&state, lamp).await,
        Err(AppError::NotFound)
    ));

    Ok(())
}
