pub mod codes;
pub mod run;
