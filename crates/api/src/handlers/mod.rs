pub mod entries;
pub mod templates;
pub mod uploads;
