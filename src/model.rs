pub mod census;
pub mod output;
pub mod prefix;
