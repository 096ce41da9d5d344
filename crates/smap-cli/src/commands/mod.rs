//! Command implementations for the smap CLI

mod generate;
mod sites;

pub use generate::execute as generate_sitemap;
pub use sites::execute as list_sites;
