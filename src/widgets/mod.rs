pub mod chart;
pub mod controls;
pub mod debug;
pub mod info;
pub mod params;
pub mod text_input;
