pub mod channel;
pub mod customer;
pub mod notification;
pub mod reference;
pub mod reminder;
pub mod reservation;
pub mod schedule;
pub mod settings;
