pub mod bookings;
pub mod cart;
pub mod inventory;
pub mod ops;
pub mod orders;
