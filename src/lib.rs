pub mod error;

pub mod catalog;
pub mod config;

pub mod exec;
pub mod tx;

pub mod io {
    pub mod encoder;

    pub mod heap_file;

    pub mod pager;
}

mod db;
pub use db::*;
