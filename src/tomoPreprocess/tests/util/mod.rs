#![allow(unused)]

pub mod cmd;
pub mod series_dir;
