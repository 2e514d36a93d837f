pub mod books;
pub mod categories;
pub mod health;
pub mod invoices;
pub mod orders;
pub mod payments;
pub mod reports;
pub mod storage;
pub mod users;
