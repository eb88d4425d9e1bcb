pub mod health;
pub mod scraper;
