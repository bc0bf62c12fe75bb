pub mod app;
pub mod locus_lists;
pub mod users;
