pub mod cron;
pub mod customer;
pub mod health;
pub mod notification;
pub mod reference;
pub mod reminder;
pub mod reservation;
pub mod schedule;
pub mod settings;
