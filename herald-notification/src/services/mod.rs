pub mod notice_service;
pub mod resolver;

pub use resolver::NotificationResolver;
