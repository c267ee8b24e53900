use crate::error::{Error, ErrorKind, Result};
use crate::models::{PluginId, timestamp};
use exn::ResultExt;
use time::UtcDateTime;

/// An external integration and its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub id: PluginId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// Serialized settings, stored verbatim. Nothing checks the format on
    /// write; see [`Plugin::configuration_json`].
    pub configuration: Option<String>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}
impl Plugin {
    /// Parse the stored configuration as JSON.
    ///
    /// Returns `Ok(None)` when no configuration is stored, and
    /// [`ErrorKind::InvalidData`] when what is stored isn't JSON.
    pub fn configuration_json(&self) -> Result<Option<serde_json::Value>> {
        self.configuration
            .as_deref()
            .map(|raw| serde_json::from_str::<serde_json::Value>(raw).or_raise(|| ErrorKind::InvalidData("plugin configuration")))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlugin {
    pub name: String,
    pub description: Option<String>,
    /// Left unset, the plugin starts out active.
    pub is_active: Option<bool>,
    pub configuration: Option<String>,
}
impl NewPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_active: None,
            configuration: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = Some(configuration.into());
        self
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PluginRow {
    id: PluginId,
    name: String,
    description: Option<String>,
    is_active: bool,
    configuration: Option<String>,
    created_at: i64,
    updated_at: i64,
}
impl TryFrom<PluginRow> for Plugin {
    type Error = Error;
    fn try_from(row: PluginRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
            configuration: row.configuration,
            created_at: timestamp(row.created_at, "plugin created_at")?,
            updated_at: timestamp(row.updated_at, "plugin updated_at")?,
        })
    }
}
