//! Client database tables: fixed-width record stores with a trailing
//! string pool, plus the version-layered field-name schemas that map
//! logical field names onto column indices.

#[macro_use]
extern crate tracing;

mod store;
mod layout;


pub use crate::{
    store::DbcTable,
    layout::DbcLayout,
};
