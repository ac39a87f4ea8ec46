//! # Category I/O
//!
//! The interface to the raw record layer. Upstream lexers deliver "categories" of rows with named
//! fields (`atom_site.Cartn_x`, `struct_conn.ptnr1_label_atom_id`, ...). The model builder reads
//! them only through [`CategorySource`], so any tokenizer can be plugged in.
//!
//! - [`category`] - [`Table`](category::Table), typed [`Column`](category::Column) accessors and the
//!   in-memory [`CategoryData`](category::CategoryData) source
//! - [`csv`] - Loads a directory of `<category>.csv` files into a [`CategoryData`](category::CategoryData)

pub mod category;
pub mod csv;

pub use category::{CategoryData, CategoryError, CategorySource, Column, Table};
