//! Template registries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs;
use tracing::{debug, info, warn};

use ragbench_protocols::{is_valid_identifier, SqlDialect, TemplateError};

use crate::builtin::builtin_templates;
use crate::render::render_ddl;
use crate::template::{SchemaTemplate, TableDef};

/// Named template storage plus rendering.
#[async_trait]
pub trait TemplateRegistry: Send + Sync {
    /// Validate and store a template, replacing any template with the same name.
    async fn save(&self, template: &SchemaTemplate) -> Result<(), TemplateError>;

    async fn load(&self, name: &str) -> Result<SchemaTemplate, TemplateError>;

    async fn exists(&self, name: &str) -> Result<bool, TemplateError>;

    /// Template names, sorted.
    async fn list(&self) -> Result<Vec<String>, TemplateError>;

    /// Canonical (MySQL) DDL for a stored template.
    async fn render_ddl(&self, name: &str) -> Result<String, TemplateError> {
        self.render_ddl_for(name, SqlDialect::MySql).await
    }

    async fn render_ddl_for(&self, name: &str, dialect: SqlDialect) -> Result<String, TemplateError> {
        let template = self.load(name).await?;
        Ok(render_ddl(&template, dialect))
    }

    /// Build and save a template from table definitions.
    async fn create_custom_template(
        &self,
        name: &str,
        description: &str,
        tables: Vec<TableDef>,
    ) -> Result<SchemaTemplate, TemplateError> {
        let template = SchemaTemplate::new(name, description).with_tables(tables);
        self.save(&template).await?;
        info!("Created custom template: {}", name);
        Ok(template)
    }

    /// Store any built-in template that is missing. Never overwrites.
    async fn bootstrap_builtins(&self) -> Result<usize, TemplateError> {
        let mut created = 0;
        for template in builtin_templates() {
            if !self.exists(&template.name).await? {
                self.save(&template).await?;
                created += 1;
            }
        }
        if created > 0 {
            debug!("Bootstrapped {} built-in templates", created);
        }
        Ok(created)
    }
}

/// In-memory registry for tests.
#[derive(Default)]
pub struct MemoryTemplateRegistry {
    templates: RwLock<BTreeMap<String, SchemaTemplate>>,
}

impl MemoryTemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in templates.
    pub fn with_builtins() -> Self {
        let templates = builtin_templates()
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        Self {
            templates: RwLock::new(templates),
        }
    }
}

#[async_trait]
impl TemplateRegistry for MemoryTemplateRegistry {
    async fn save(&self, template: &SchemaTemplate) -> Result<(), TemplateError> {
        template.validate()?;
        self.templates
            .write()
            .insert(template.name.clone(), template.clone());
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<SchemaTemplate, TemplateError> {
        self.templates
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    async fn exists(&self, name: &str) -> Result<bool, TemplateError> {
        Ok(self.templates.read().contains_key(name))
    }

    async fn list(&self) -> Result<Vec<String>, TemplateError> {
        Ok(self.templates.read().keys().cloned().collect())
    }
}

/// File system registry, one human-readable YAML file per template:
/// ```text
/// {templates_dir}/
/// ├── basic_rag.yaml
/// ├── graph_database.yaml
/// └── ...
/// ```
pub struct FileTemplateRegistry {
    templates_dir: PathBuf,
}

impl FileTemplateRegistry {
    /// Open the registry, creating the directory and any missing built-ins.
    pub async fn open(templates_dir: impl Into<PathBuf>) -> Result<Self, TemplateError> {
        let templates_dir = templates_dir.into();
        fs::create_dir_all(&templates_dir).await?;

        let registry = Self { templates_dir };
        registry.bootstrap_builtins().await?;
        debug!("FileTemplateRegistry initialized at {:?}", registry.templates_dir);
        Ok(registry)
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    fn template_path(&self, name: &str) -> Result<PathBuf, TemplateError> {
        if !is_valid_identifier(name) {
            return Err(TemplateError::InvalidTemplate(format!(
                "invalid template name '{}'",
                name
            )));
        }
        Ok(self.templates_dir.join(format!("{}.yaml", name)))
    }
}

#[async_trait]
impl TemplateRegistry for FileTemplateRegistry {
    async fn save(&self, template: &SchemaTemplate) -> Result<(), TemplateError> {
        template.validate()?;
        let path = self.template_path(&template.name)?;
        let yaml = serde_yml::to_string(template)
            .map_err(|e| TemplateError::Serialization(e.to_string()))?;
        fs::write(&path, yaml).await?;
        debug!("Saved template {} to {:?}", template.name, path);
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<SchemaTemplate, TemplateError> {
        let path = self.template_path(name)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_yml::from_str(&content).map_err(|e| TemplateError::Serialization(e.to_string()))
    }

    async fn exists(&self, name: &str) -> Result<bool, TemplateError> {
        let path = self.template_path(name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn list(&self) -> Result<Vec<String>, TemplateError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.templates_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                match path.file_stem().and_then(|s| s.to_str()) {
                    Some(stem) => names.push(stem.to_string()),
                    None => warn!("Skipping template file with non-UTF-8 name: {:?}", path),
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
