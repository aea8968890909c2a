pub mod ask;
pub mod export;
pub mod run;
pub mod score;

mod output;
