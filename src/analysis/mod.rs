//! Pure computations over stored data. Nothing in here touches the database.
pub mod geo;
pub mod heatmap;
pub mod pitch;
pub mod radar;
pub mod streak;
