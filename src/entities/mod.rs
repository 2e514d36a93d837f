pub mod app_user;
pub mod app_user_role;
pub mod book;
pub mod book_category;
pub mod category;
pub mod invoice;
pub mod invoice_item;
pub mod invoice_request;
pub mod invoice_request_item;
pub mod user_role;
