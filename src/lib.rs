pub mod cli;
pub mod consts;
pub mod crds;
pub mod image;
pub mod main_actions;
pub mod operator;
pub mod runtime_info;
pub mod store;
pub mod utils;
