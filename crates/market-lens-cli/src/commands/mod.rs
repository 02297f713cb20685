pub mod analyze;
pub mod concentration;
pub mod narrative;
pub mod opportunity;
pub mod signals;
pub mod white_space;
