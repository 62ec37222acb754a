pub mod classify;
pub mod contingencies;
pub mod reduce;
pub mod run;
