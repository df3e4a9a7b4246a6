pub mod booking;
pub mod cache;
pub mod clock;
pub mod conflict;
pub mod hours;
pub mod lifecycle;
pub mod segments;
pub mod slots;
pub mod types;
