pub mod args;
mod list_subjects;
mod predict;
mod slice;
mod utils;
