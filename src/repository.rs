//! Persistence steps of the order workflow. Each function runs on the
//! connection or transaction handed in by the caller.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    dto::orders::ShippingAddressInput,
    entity::{
        order_items,
        products::{self, Entity as Products},
        shipping_addresses::{self, Column as AddressCol, Entity as ShippingAddresses},
    },
};

/// Return the owner's address with exactly these fields, inserting it first if needed.
///
/// Relies on the unique constraint over all six columns, so concurrent
/// identical submissions converge on one row.
pub async fn find_or_create_address<C: ConnectionTrait>(
    conn: &C,
    owner: Uuid,
    fields: &ShippingAddressInput,
) -> Result<shipping_addresses::Model, DbErr> {
    let candidate = shipping_addresses::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner),
        full_name: Set(fields.full_name.clone()),
        street: Set(fields.street.clone()),
        zip_code: Set(fields.zip_code.clone()),
        city: Set(fields.city.clone()),
        country_code: Set(fields.country_code.clone()),
    };

    ShippingAddresses::insert(candidate)
        .on_conflict(
            OnConflict::columns([
                AddressCol::UserId,
                AddressCol::FullName,
                AddressCol::Street,
                AddressCol::ZipCode,
                AddressCol::City,
                AddressCol::CountryCode,
            ])
            .do_nothing()
            .to_owned(),
        )
        .do_nothing()
        .exec(conn)
        .await?;

    ShippingAddresses::find()
        .filter(AddressCol::UserId.eq(owner))
        .filter(AddressCol::FullName.eq(fields.full_name.as_str()))
        .filter(AddressCol::Street.eq(fields.street.as_str()))
        .filter(AddressCol::ZipCode.eq(fields.zip_code.as_str()))
        .filter(AddressCol::City.eq(fields.city.as_str()))
        .filter(AddressCol::CountryCode.eq(fields.country_code.as_str()))
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("shipping address after upsert".into()))
}

/// Load the given products with `FOR SHARE`, so their prices cannot change
/// until the caller's transaction ends.
pub async fn lock_products<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<Vec<products::Model>, DbErr> {
    Products::find()
        .filter(products::Column::Id.is_in(ids.iter().copied()))
        .lock_shared()
        .all(conn)
        .await
}

pub async fn bulk_insert_items<C: ConnectionTrait>(
    conn: &C,
    items: Vec<order_items::ActiveModel>,
) -> Result<(), DbErr> {
    if items.is_empty() {
        return Ok(());
    }
    order_items::Entity::insert_many(items)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}
