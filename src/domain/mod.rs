pub mod confirmed_at;
pub mod page_request;
pub mod subscriber;
pub mod subscriber_email;
