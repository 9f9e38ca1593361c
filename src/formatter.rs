pub mod house_title;
pub mod table;
