pub mod categories;
pub mod notification_jobs;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod shipping_addresses;
pub mod users;

pub use categories::Entity as Categories;
pub use notification_jobs::Entity as NotificationJobs;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use shipping_addresses::Entity as ShippingAddresses;
pub use users::Entity as Users;
