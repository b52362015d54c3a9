pub mod delivery_details;
pub mod farms;
pub mod order_items;
pub mod orders;
pub mod premade_packages;
pub mod products;
pub mod subscription_emails;
pub mod subscription_items;
pub mod subscriptions;
pub mod users;

pub use delivery_details::Entity as DeliveryDetails;
pub use farms::Entity as Farms;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use premade_packages::Entity as PremadePackages;
pub use products::Entity as Products;
pub use subscription_emails::Entity as SubscriptionEmails;
pub use subscription_items::Entity as SubscriptionItems;
pub use subscriptions::Entity as Subscriptions;
pub use users::Entity as Users;
