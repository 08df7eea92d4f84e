#![allow(
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

#[path = "../../benches/estimators.rs"]
mod estimators;

mod builder;
mod cv;
mod export;
mod failures;
mod grid_search;
mod parallel;
mod randomized;
mod timeout;
