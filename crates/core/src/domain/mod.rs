pub mod company;
pub mod news;
pub mod params;
pub mod prediction;
