use super::{Catalog, into_models, update_and_refetch};
use crate::error::{QueryResultExt, Result};
use crate::models::{NewPlugin, Plugin, PluginId, PluginRow};
use crate::schema::DEFAULT_ACTIVE;
use tracing::instrument;

impl Catalog {
    // =========================================================================
    // Plugins
    // =========================================================================

    /// Register a plugin. Unless told otherwise it starts out active.
    #[instrument(skip_all, fields(name = %plugin.name))]
    pub async fn create_plugin(&self, plugin: &NewPlugin) -> Result<Plugin> {
        let row: PluginRow = sqlx::query_as(include_str!("../../queries/plugins/insert.sql"))
            .bind(&plugin.name)
            .bind(plugin.description.as_deref())
            .bind(plugin.is_active.unwrap_or(DEFAULT_ACTIVE))
            .bind(plugin.configuration.as_deref())
            .fetch_one(&self.pool)
            .await
            .or_raise_query()?;
        let plugin = Plugin::try_from(row)?;
        tracing::debug!(id = %plugin.id, "Registered plugin");
        Ok(plugin)
    }

    pub async fn get_plugin(&self, id: PluginId) -> Result<Option<Plugin>> {
        let row: Option<PluginRow> = sqlx::query_as(include_str!("../../queries/plugins/get.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Plugin::try_from).transpose()
    }

    pub async fn get_plugin_by_name(&self, name: impl AsRef<str>) -> Result<Option<Plugin>> {
        let row: Option<PluginRow> = sqlx::query_as(include_str!("../../queries/plugins/get_by_name.sql"))
            .bind(name.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise_query()?;
        row.map(Plugin::try_from).transpose()
    }

    pub async fn list_plugins(&self) -> Result<Vec<Plugin>> {
        let rows: Vec<PluginRow> = sqlx::query_as(include_str!("../../queries/plugins/list.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    pub async fn list_active_plugins(&self) -> Result<Vec<Plugin>> {
        let rows: Vec<PluginRow> = sqlx::query_as(include_str!("../../queries/plugins/list_active.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise_query()?;
        into_models(rows)
    }

    #[instrument(skip(self))]
    pub async fn set_plugin_active(&self, id: PluginId, is_active: bool) -> Result<Plugin> {
        let tx = self.begin().await?;
        let update = sqlx::query(include_str!("../../queries/plugins/set_active.sql"))
            .bind(id)
            .bind(is_active);
        update_and_refetch::<PluginRow, _>(
            tx,
            update,
            include_str!("../../queries/plugins/get.sql"),
            PluginId::ENTITY,
            id.0,
        )
        .await
    }

    /// Replace the stored configuration. `None` clears it.
    ///
    /// The value is stored verbatim; use [`Plugin::configuration_json`] to
    /// interpret it.
    #[instrument(skip(self, configuration))]
    pub async fn update_plugin_configuration(&self, id: PluginId, configuration: Option<&str>) -> Result<Plugin> {
        let tx = self.begin().await?;
        let update = sqlx::query(include_str!("../../queries/plugins/set_configuration.sql"))
            .bind(id)
            .bind(configuration);
        update_and_refetch::<PluginRow, _>(
            tx,
            update,
            include_str!("../../queries/plugins/get.sql"),
            PluginId::ENTITY,
            id.0,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_plugin(&self, id: PluginId) -> Result<bool> {
        let result = sqlx::query(include_str!("../../queries/plugins/delete.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise_query()?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::debug!("Deleted plugin");
        }
        Ok(deleted)
    }
}
