/// Catalog header, carrying the fields the Logiqx dialect binds plus one
/// informational flag that never round-trips through serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatHeader {
    pub name: String,
    pub description: String,
    pub version: String,
    pub date: String,
    pub url: String,
    /// Multi-line comment; joined with newlines on emission.
    pub comment: Vec<String>,
    /// Set when a merged transform introduced directory components into
    /// ROM names. Downstream path construction consults this; it is not
    /// serialized.
    pub nested_rom_names: bool,
}

impl DatHeader {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_comment(mut self, lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.comment = lines.into_iter().map(Into::into).collect();
        self
    }
}
