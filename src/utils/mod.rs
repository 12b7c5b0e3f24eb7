pub mod formatting;
pub mod similarity;
pub mod truncation;
