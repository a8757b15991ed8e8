// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod code;
pub mod error;
pub mod options;
pub mod schema;
pub mod selection;
pub mod state;
pub mod table;

pub use code::*;
pub use error::*;
pub use options::*;
pub use schema::*;
pub use selection::*;
pub use state::*;
pub use table::*;
