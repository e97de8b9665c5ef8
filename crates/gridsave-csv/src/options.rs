//! Document options

/// Options for reading a document
#[derive(Debug, Clone)]
pub struct DocumentReadOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
}

impl Default for DocumentReadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl DocumentReadOptions {
    /// Use a different field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}
