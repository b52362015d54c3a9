pub mod catalog_service;
pub mod convert;
pub mod order_service;
pub mod subscription_service;
