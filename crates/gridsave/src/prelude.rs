//! Prelude module - common imports for gridsave users
//!
//! ```rust
//! use gridsave::prelude::*;
//! ```

pub use crate::{
    // Main types
    CellAddress,
    Grid,

    // Evaluation
    evaluate,
    evaluate_cell,
    referenced_cells,
    ERROR_SENTINEL,

    // Error types
    CsvError,
    Error,
    FormulaError,
    Result,

    // I/O types
    DocumentReader,
    DocumentWriter,

    // Extension traits
    GridCalculationExt,
    GridExt,
};

#[cfg(feature = "sync")]
pub use crate::{SaveEvent, SaveSession, SaveState, SessionConfig, Transport};
