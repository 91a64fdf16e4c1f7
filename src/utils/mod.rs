pub mod images;
pub mod logging;
